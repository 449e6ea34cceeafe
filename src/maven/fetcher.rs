use std::path::{Path, PathBuf};

use futures::StreamExt;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::maven::coordinates::{CoordinateError, MavenArtifactRef};
use crate::maven::resolver::{MetadataResolver, ResolveError};
use crate::util::checksum::{file_digest, HashAlgorithm};
use crate::util::http_client::HttpError;
use crate::util::progress::ProgressObserver;
use crate::util::validating_http_body::{BodyError, ChecksumHttpBodyValidator, NopHttpBodyValidator, ValidatingHttpBody};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to download {artifact} from {url}: {source}")]
    Artifact {
        artifact: String,
        url: String,
        source: HttpError,
    },
    #[error("failed to download {artifact} from {url}: {source}")]
    Body {
        artifact: String,
        url: String,
        source: BodyError,
    },
    #[error("failed to download hash file for {artifact} from {url}: {source}")]
    Checksum {
        artifact: String,
        url: String,
        source: HttpError,
    },
    #[error("downloaded {artifact} from {url} does not match its checksum: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: String,
        url: String,
        expected: String,
        actual: String,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DownloadStatus {
    /// the local file matched the repository's checksum, nothing was transferred
    UpToDate,
    Downloaded {
        bytes: u64,
    },
}

#[derive(Debug)]
pub struct Download {
    /// the requested artifact with `resolved_version` set
    pub artifact: MavenArtifactRef,
    pub url: String,
    pub path: PathBuf,
    pub status: DownloadStatus,
}

/// Downloads artifacts to local files, skipping the transfer if the local file is already
///  identical to the remote one.
pub struct ArtifactFetcher {
    resolver: MetadataResolver,
}
impl ArtifactFetcher {
    pub fn new(resolver: MetadataResolver) -> ArtifactFetcher {
        ArtifactFetcher {
            resolver,
        }
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    /// `output` is either a file name or an existing directory to put the artifact into, see
    ///  [MavenArtifactRef::local_path]. Missing parent directories are not created.
    ///
    /// NB: if the transfer fails midway, the partially written file is left behind
    pub async fn download(
        &self,
        artifact: &MavenArtifactRef,
        output: Option<&Path>,
        hash_algorithm: HashAlgorithm,
        observer: &dyn ProgressObserver,
    ) -> Result<Download, DownloadError> {
        let path = artifact.local_path(output);
        let resolved = self.resolver.resolve(artifact).await?;
        let url = resolved.uri(self.resolver.base_uri())?;

        let mut expected_hash = None;
        if tokio::fs::try_exists(&path).await? {
            let remote_hash = self.fetch_remote_hash(artifact, &url, hash_algorithm).await?;
            let local_hash = file_digest(&path, hash_algorithm).await?;

            if remote_hash.as_deref() == Some(local_hash.as_str()) {
                info!("{} is already up to date", artifact);
                return Ok(Download {
                    artifact: resolved,
                    url,
                    path,
                    status: DownloadStatus::UpToDate,
                });
            }
            debug!("{} differs from {} - local {} is {}, remote is {:?}", path.display(), url, hash_algorithm, local_hash, remote_hash);
            expected_hash = remote_hash;
        }

        info!("Downloading artifact {} from {}", artifact, url);
        let bytes = self.transfer(artifact, &url, &path, hash_algorithm, expected_hash, observer).await?;
        info!("Maven artifact {} is downloaded to {}", artifact, path.display());

        Ok(Download {
            artifact: resolved,
            url,
            path,
            status: DownloadStatus::Downloaded { bytes },
        })
    }

    /// The hex digest from `<url>.<algorithm>`, or `None` if the file's content is not a digest
    async fn fetch_remote_hash(&self, artifact: &MavenArtifactRef, url: &str, hash_algorithm: HashAlgorithm) -> Result<Option<String>, DownloadError> {
        let checksum_url = format!("{}.{}", url, hash_algorithm.extension());
        let content = self.resolver.client().get_bytes(&checksum_url)
            .await
            .map_err(|source| DownloadError::Checksum {
                artifact: artifact.to_string(),
                url: checksum_url.clone(),
                source,
            })?;

        let remote_hash = hash_algorithm.parse_checksum_file(&String::from_utf8_lossy(&content));
        if remote_hash.is_none() {
            debug!("{} does not contain a {} digest", checksum_url, hash_algorithm);
        }
        Ok(remote_hash)
    }

    async fn transfer(
        &self,
        artifact: &MavenArtifactRef,
        url: &str,
        path: &Path,
        hash_algorithm: HashAlgorithm,
        expected_hash: Option<String>,
        observer: &dyn ProgressObserver,
    ) -> Result<u64, DownloadError> {
        let (content_length, http_body) = self.resolver.client().get_stream(url)
            .await
            .map_err(|source| DownloadError::Artifact {
                artifact: artifact.to_string(),
                url: url.to_string(),
                source,
            })?;

        let body = match &expected_hash {
            Some(expected) => ValidatingHttpBody::new(http_body, ChecksumHttpBodyValidator::new(hash_algorithm, expected)),
            None => ValidatingHttpBody::new(http_body, NopHttpBodyValidator {}),
        };
        let mut body = Box::pin(body);

        let mut file = File::create(path).await?;
        let mut downloaded: u64 = 0;
        observer.on_start(content_length);

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(BodyError::Validation { expected, actual, .. }) => {
                    file.flush().await?;
                    return Err(DownloadError::ChecksumMismatch {
                        artifact: artifact.to_string(),
                        url: url.to_string(),
                        expected,
                        actual,
                    });
                }
                Err(source) => {
                    return Err(DownloadError::Body {
                        artifact: artifact.to_string(),
                        url: url.to_string(),
                        source,
                    });
                }
            };

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            observer.on_progress(downloaded, content_length);
        }

        // NB: tokio's File only guarantees that the data reached the OS after an explicit flush
        file.flush().await?;
        observer.on_finish(downloaded);
        Ok(downloaded)
    }
}
