use thiserror::Error;
use tracing::debug;

use crate::maven::coordinates::{CoordinateError, MavenArtifactRef, MavenVersion};
use crate::maven::metadata_xml::Metadata;
use crate::util::http_client::{normalize_base_uri, HttpError, RepositoryClient};

pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to download maven-metadata.xml from {url}: {source}")]
    Fetch {
        url: String,
        source: HttpError,
    },
    #[error("failed to parse maven-metadata.xml from {url}: {source}")]
    Parse {
        url: String,
        source: serde_xml_rs::Error,
    },
    #[error("{url} does not list any versions")]
    NoVersions {
        url: String,
    },
    #[error("{url} does not contain a snapshot timestamp and build number")]
    NoSnapshotBuild {
        url: String,
    },
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

/// Turns symbolic versions ("latest", "...-SNAPSHOT") into versions that can actually be
///  downloaded, based on the `maven-metadata.xml` files the repository publishes.
pub struct MetadataResolver {
    client: RepositoryClient,
    base_uri: String, // without trailing '/'
}
impl MetadataResolver {
    pub fn new(base_uri: &str, client: RepositoryClient) -> Result<MetadataResolver, HttpError> {
        Ok(MetadataResolver {
            client,
            base_uri: normalize_base_uri(base_uri)?,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn client(&self) -> &RepositoryClient {
        &self.client
    }

    /// Returns a copy of `artifact` with `resolved_version` set. A concrete release version
    ///  resolves to itself without any network traffic.
    pub async fn resolve(&self, artifact: &MavenArtifactRef) -> Result<MavenArtifactRef, ResolveError> {
        match artifact.version() {
            MavenVersion::Latest => {
                let latest = self.find_latest_version(artifact).await?;
                debug!("latest version of {} is {}", artifact, latest);

                let with_latest = artifact.with_version(&latest);
                if with_latest.is_snapshot() {
                    // the latest release is a snapshot itself, so it needs a unique version too
                    let snapshot_version = self.find_snapshot_version(&with_latest).await?;
                    Ok(with_latest.with_resolved_version(snapshot_version))
                }
                else {
                    Ok(artifact.with_resolved_version(latest))
                }
            }
            MavenVersion::Snapshot(_) => {
                let snapshot_version = self.find_snapshot_version(artifact).await?;
                debug!("snapshot {} resolved to {}", artifact, snapshot_version);
                Ok(artifact.with_resolved_version(snapshot_version))
            }
            MavenVersion::Release(version) => {
                Ok(artifact.with_resolved_version(version.clone()))
            }
        }
    }

    pub async fn uri_for_artifact(&self, artifact: &MavenArtifactRef) -> Result<String, ResolveError> {
        let resolved = self.resolve(artifact).await?;
        Ok(resolved.uri(&self.base_uri)?)
    }

    async fn find_latest_version(&self, artifact: &MavenArtifactRef) -> Result<String, ResolveError> {
        let url = format!("{}/{}/{}", self.base_uri, artifact.path(false), METADATA_FILE_NAME);
        let metadata = self.fetch_metadata(&url).await?;

        match metadata.last_version() {
            Some(version) => Ok(version.to_string()),
            None => Err(ResolveError::NoVersions { url }),
        }
    }

    /// `<timestamp>-<buildNumber>` of the current build, or rather the snapshotVersion value that
    ///  contains it if there is one
    async fn find_snapshot_version(&self, artifact: &MavenArtifactRef) -> Result<String, ResolveError> {
        let url = format!("{}/{}/{}", self.base_uri, artifact.path(true), METADATA_FILE_NAME);
        let metadata = self.fetch_metadata(&url).await?;

        let meta_version = match metadata.snapshot_build() {
            Some(v) => v,
            None => return Err(ResolveError::NoSnapshotBuild { url }),
        };

        let exact = metadata.snapshot_values()
            .into_iter()
            .find(|value| value.contains(&meta_version))
            .map(str::to_string);

        Ok(exact.unwrap_or(meta_version))
    }

    async fn fetch_metadata(&self, url: &str) -> Result<Metadata, ResolveError> {
        debug!("fetching {}", url);

        let bytes = self.client.get_bytes(url)
            .await
            .map_err(|source| ResolveError::Fetch { url: url.to_string(), source })?;

        // NB: serde-xml-rs works on text, invalid UTF-8 is replaced rather than rejected
        let xml = String::from_utf8_lossy(&bytes);
        Metadata::parse(&xml)
            .map_err(|source| ResolveError::Parse { url: url.to_string(), source })
    }
}
