//! Serde model of the `maven-metadata.xml` file format described at
//!  https://maven.apache.org/ref/3.9.5/maven-repository-metadata/repository-metadata.html
//!
//! Only the parts needed for version resolution are modelled, everything else is skipped.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub versioning: Option<Versioning>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Option<Versions>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub snapshot: Option<Snapshot>,
    #[serde(default)]
    pub snapshot_versions: Option<SnapshotVersions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub version: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub build_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotVersions {
    #[serde(default)]
    pub snapshot_version: Vec<SnapshotVersion>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotVersion {
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl Metadata {
    pub fn parse(xml: &str) -> Result<Metadata, serde_xml_rs::Error> {
        serde_xml_rs::from_str(xml)
    }

    /// The released versions in the order the repository lists them, i.e. oldest first
    pub fn versions(&self) -> &[String] {
        self.versioning.as_ref()
            .and_then(|v| v.versions.as_ref())
            .map(|v| v.version.as_slice())
            .unwrap_or(&[])
    }

    /// NB: this is the last *listed* version, not the `<latest>` element
    pub fn last_version(&self) -> Option<&str> {
        self.versions()
            .last()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// `<timestamp>-<buildNumber>` of the current snapshot build, if both are present
    pub fn snapshot_build(&self) -> Option<String> {
        let snapshot = self.versioning.as_ref()?.snapshot.as_ref()?;
        let timestamp = snapshot.timestamp.as_deref()?.trim();
        let build_number = snapshot.build_number.as_deref()?.trim();
        if timestamp.is_empty() || build_number.is_empty() {
            return None;
        }
        Some(format!("{}-{}", timestamp, build_number))
    }

    /// All distinct `snapshotVersion/value` entries, in document order
    pub fn snapshot_values(&self) -> Vec<&str> {
        let mut result: Vec<&str> = Vec::new();

        let snapshot_versions = self.versioning.as_ref()
            .and_then(|v| v.snapshot_versions.as_ref())
            .map(|v| v.snapshot_version.as_slice())
            .unwrap_or(&[]);

        for value in snapshot_versions.iter().filter_map(|sv| sv.value.as_deref()) {
            let value = value.trim();
            if !value.is_empty() && !result.contains(&value) {
                result.push(value);
            }
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RELEASE_METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>javax.servlet</groupId>
  <artifactId>servlet-api</artifactId>
  <versioning>
    <latest>3.0-alpha-1</latest>
    <release>3.0-alpha-1</release>
    <versions>
      <version>2.2</version>
      <version>2.5</version>
      <version>3.0-alpha-1</version>
    </versions>
    <lastUpdated>20200101000000</lastUpdated>
  </versioning>
</metadata>
"#;

    const SNAPSHOT_METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata modelVersion="1.1.0">
  <groupId>com.example</groupId>
  <artifactId>lib</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20240101.120000</timestamp>
      <buildNumber>3</buildNumber>
    </snapshot>
    <lastUpdated>20240101120000</lastUpdated>
    <snapshotVersions>
      <snapshotVersion>
        <extension>jar</extension>
        <value>1.0-20240101.120000-3</value>
        <updated>20240101120000</updated>
      </snapshotVersion>
      <snapshotVersion>
        <classifier>sources</classifier>
        <extension>jar</extension>
        <value>1.0-20240101.120000-3</value>
        <updated>20240101120000</updated>
      </snapshotVersion>
      <snapshotVersion>
        <extension>pom</extension>
        <value>1.0-20231231.090000-2</value>
        <updated>20231231090000</updated>
      </snapshotVersion>
    </snapshotVersions>
  </versioning>
</metadata>
"#;

    #[test]
    fn test_release_metadata() {
        let metadata = Metadata::parse(RELEASE_METADATA).unwrap();

        assert_eq!(metadata.group_id.as_deref(), Some("javax.servlet"));
        assert_eq!(metadata.versions(), &["2.2", "2.5", "3.0-alpha-1"]);
        assert_eq!(metadata.last_version(), Some("3.0-alpha-1"));
        assert_eq!(metadata.snapshot_build(), None);
        assert!(metadata.snapshot_values().is_empty());
    }

    #[test]
    fn test_snapshot_metadata() {
        let metadata = Metadata::parse(SNAPSHOT_METADATA).unwrap();

        assert_eq!(metadata.version.as_deref(), Some("1.0-SNAPSHOT"));
        assert_eq!(metadata.last_version(), None);
        assert_eq!(metadata.snapshot_build().as_deref(), Some("20240101.120000-3"));
        assert_eq!(metadata.snapshot_values(), vec!["1.0-20240101.120000-3", "1.0-20231231.090000-2"]);
    }

    #[test]
    fn test_local_copy_snapshot_metadata() {
        let metadata = Metadata::parse(r#"<metadata>
  <groupId>com.example</groupId>
  <artifactId>lib</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20240102.080000</timestamp>
      <buildNumber>1</buildNumber>
      <localCopy>true</localCopy>
    </snapshot>
    <lastUpdated>20240102080000</lastUpdated>
  </versioning>
</metadata>"#).unwrap();

        assert_eq!(metadata.snapshot_build().as_deref(), Some("20240102.080000-1"));
        assert!(metadata.snapshot_values().is_empty());
    }

    #[test]
    fn test_metadata_without_versioning() {
        let metadata = Metadata::parse("<metadata><groupId>g</groupId><artifactId>a</artifactId></metadata>").unwrap();
        assert!(metadata.versions().is_empty());
        assert_eq!(metadata.last_version(), None);
        assert_eq!(metadata.snapshot_build(), None);
    }

    #[test]
    fn test_not_xml() {
        assert!(Metadata::parse("<html><body>Not Found").is_err());
    }
}
