use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_EXTENSION: &str = "jar";
const LATEST: &str = "latest";
const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("not a valid Maven coordinate: {0:?} - expected groupId:artifactId[:extension[:classifier]]:version")]
    Malformed(String),
    #[error("groupId must be set")]
    EmptyGroupId,
    #[error("artifactId must be set")]
    EmptyArtifactId,
    #[error("expected unique version for snapshot artifact {0}")]
    UnresolvedSnapshot(String),
    #[error("the latest version of {0} has not been resolved")]
    UnresolvedLatest(String),
}

/// The version part of a coordinate. An empty version string is treated as "latest".
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum MavenVersion {
    Latest,
    Release(String),
    Snapshot(String), // ending in '-SNAPSHOT'
}
impl MavenVersion {
    pub fn as_str(&self) -> &str {
        match self {
            MavenVersion::Latest => LATEST,
            MavenVersion::Release(v) => v,
            MavenVersion::Snapshot(v) => v,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, MavenVersion::Snapshot(_))
    }
}
impl From<&str> for MavenVersion {
    fn from(s: &str) -> MavenVersion {
        if s.is_empty() || s == LATEST {
            MavenVersion::Latest
        }
        else if s.ends_with(SNAPSHOT_SUFFIX) {
            MavenVersion::Snapshot(s.to_string())
        }
        else {
            MavenVersion::Release(s.to_string())
        }
    }
}
impl Display for MavenVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MavenArtifactId(pub String);

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MavenGroupId(pub String);
impl MavenGroupId {
    /// e.g. "org/apache/solr" for "org.apache.solr"
    pub fn as_path(&self) -> String {
        self.0.replace('.', "/")
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MavenCoordinates {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
    pub version: MavenVersion,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum MavenClassifier {
    Unclassified,
    Classified(String),
}
impl From<Option<&str>> for MavenClassifier {
    fn from(classifier: Option<&str>) -> MavenClassifier {
        match classifier {
            None | Some("") => MavenClassifier::Unclassified,
            Some(c) => MavenClassifier::Classified(c.to_string()),
        }
    }
}

/// A single artifact inside a Maven repository, e.g. `org.apache.solr:solr:war:3.5.0`.
///
/// Instances are never modified after construction: the `with_*` methods return changed copies.
///  `resolved_version` holds the concrete version a symbolic one ("latest" or a snapshot) was
///  resolved to, and it does not take part in equality.
#[derive(Clone, Debug)]
pub struct MavenArtifactRef {
    pub coordinates: MavenCoordinates,
    pub classifier: MavenClassifier,
    pub file_extension: String, // without leading '.', e.g. "jar"
    pub resolved_version: Option<String>,
}
impl MavenArtifactRef {
    pub fn new(
        group_id: &str,
        artifact_id: &str,
        version: &str,
        classifier: Option<&str>,
        extension: Option<&str>,
    ) -> Result<MavenArtifactRef, CoordinateError> {
        if group_id.is_empty() {
            return Err(CoordinateError::EmptyGroupId);
        }
        if artifact_id.is_empty() {
            return Err(CoordinateError::EmptyArtifactId);
        }

        Ok(MavenArtifactRef {
            coordinates: MavenCoordinates {
                group_id: MavenGroupId(group_id.to_string()),
                artifact_id: MavenArtifactId(artifact_id.to_string()),
                version: MavenVersion::from(version),
            },
            classifier: MavenClassifier::from(classifier),
            file_extension: match extension {
                None | Some("") => DEFAULT_EXTENSION.to_string(),
                Some(e) => e.to_string(),
            },
            resolved_version: None,
        })
    }

    /// Accepts `groupId:artifactId:version`, `groupId:artifactId:extension:version` and
    ///  `groupId:artifactId:extension:classifier:version`.
    pub fn parse(coordinate: &str) -> Result<MavenArtifactRef, CoordinateError> {
        let parts: Vec<&str> = coordinate.split(':').collect();
        match *parts.as_slice() {
            [g, a, v] => MavenArtifactRef::new(g, a, v, None, None),
            [g, a, t, v] => MavenArtifactRef::new(g, a, v, None, Some(t)),
            [g, a, t, c, v] => MavenArtifactRef::new(g, a, v, Some(c), Some(t)),
            _ => Err(CoordinateError::Malformed(coordinate.to_string())),
        }
    }

    pub fn group_id(&self) -> &MavenGroupId {
        &self.coordinates.group_id
    }

    pub fn artifact_id(&self) -> &MavenArtifactId {
        &self.coordinates.artifact_id
    }

    pub fn version(&self) -> &MavenVersion {
        &self.coordinates.version
    }

    pub fn is_snapshot(&self) -> bool {
        self.coordinates.version.is_snapshot()
    }

    /// The directory of this artifact relative to the repository root, optionally including
    ///  the version directory.
    pub fn path(&self, with_version: bool) -> String {
        let base = format!("{}/{}", self.group_id().as_path(), self.artifact_id().0);
        if !with_version {
            return base;
        }

        let version = match (&self.coordinates.version, &self.resolved_version) {
            (MavenVersion::Latest, Some(resolved)) => resolved.as_str(),
            (version, _) => version.as_str(),
        };
        format!("{}/{}", base, version)
    }

    /// The local file name `<artifactId>[-<classifier>].<extension>`, without the version
    pub fn file_name(&self) -> String {
        match &self.classifier {
            MavenClassifier::Unclassified => format!("{}.{}", self.artifact_id().0, self.file_extension),
            MavenClassifier::Classified(c) => format!("{}-{}.{}", self.artifact_id().0, c, self.file_extension),
        }
    }

    /// Where a download ends up: the generated file name, the generated file name inside
    ///  `output` if that is an existing directory, or `output` itself.
    pub fn local_path(&self, output: Option<&Path>) -> PathBuf {
        match output {
            None => PathBuf::from(self.file_name()),
            Some(dir) if dir.is_dir() => dir.join(self.file_name()),
            Some(file) => file.to_path_buf(),
        }
    }

    pub fn uri(&self, base: &str) -> Result<String, CoordinateError> {
        let version = match (&self.resolved_version, &self.coordinates.version) {
            (Some(resolved), _) => resolved.as_str(),
            (None, MavenVersion::Snapshot(_)) => return Err(CoordinateError::UnresolvedSnapshot(self.to_string())),
            (None, MavenVersion::Latest) => return Err(CoordinateError::UnresolvedLatest(self.to_string())),
            (None, MavenVersion::Release(v)) => v.as_str(),
        };

        let classifier = match &self.classifier {
            MavenClassifier::Unclassified => "".to_string(),
            MavenClassifier::Classified(c) => format!("-{}", c),
        };

        Ok(format!(
            "{}/{}/{}-{}{}.{}",
            base,
            self.path(true),
            self.artifact_id().0,
            version,
            classifier,
            self.file_extension,
        ))
    }

    pub fn with_version(&self, version: &str) -> MavenArtifactRef {
        let mut result = self.clone();
        result.coordinates.version = MavenVersion::from(version);
        result
    }

    pub fn with_classifier(&self, classifier: Option<&str>) -> MavenArtifactRef {
        let mut result = self.clone();
        result.classifier = MavenClassifier::from(classifier);
        result
    }

    pub fn with_resolved_version(&self, resolved_version: impl Into<String>) -> MavenArtifactRef {
        let mut result = self.clone();
        result.resolved_version = Some(resolved_version.into());
        result
    }
}

impl PartialEq for MavenArtifactRef {
    fn eq(&self, other: &Self) -> bool {
        // NB: resolved_version is deliberately not compared
        self.coordinates == other.coordinates
            && self.classifier == other.classifier
            && self.file_extension == other.file_extension
    }
}
impl Eq for MavenArtifactRef {}

impl FromStr for MavenArtifactRef {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MavenArtifactRef::parse(s)
    }
}

/// The canonical coordinate: the default "jar" extension is omitted and an empty version is
///  printed as "latest", so `g:a:jar:` displays as `g:a:latest`.
impl Display for MavenArtifactRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let group_id = &self.group_id().0;
        let artifact_id = &self.artifact_id().0;
        let version = self.version();

        match &self.classifier {
            MavenClassifier::Classified(c) => {
                write!(f, "{}:{}:{}:{}:{}", group_id, artifact_id, self.file_extension, c, version)
            }
            MavenClassifier::Unclassified if self.file_extension != DEFAULT_EXTENSION => {
                write!(f, "{}:{}:{}:{}", group_id, artifact_id, self.file_extension, version)
            }
            MavenClassifier::Unclassified => {
                write!(f, "{}:{}:{}", group_id, artifact_id, version)
            }
        }
    }
}
