pub mod coordinates;
pub mod fetcher;
pub mod metadata_xml;
pub mod resolver;

pub use coordinates::{CoordinateError, MavenArtifactRef, MavenClassifier, MavenVersion};
pub use fetcher::{ArtifactFetcher, Download, DownloadError, DownloadStatus};
pub use resolver::{MetadataResolver, ResolveError};
