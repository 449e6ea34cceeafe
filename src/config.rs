use crate::maven::{ArtifactFetcher, MetadataResolver};
use crate::util::credentials::Credentials;
use crate::util::http_client::{HttpError, RepositoryClient};

pub const DEFAULT_REPOSITORY: &str = "https://repo.maven.apache.org/maven2/";
pub const DEFAULT_USER_AGENT: &str = "Maven Artifact Downloader/1.0";

/// Everything needed to talk to one repository
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub base_uri: String,
    pub credentials: Credentials,
    pub user_agent: String,
}
impl Default for RepositoryConfig {
    fn default() -> RepositoryConfig {
        RepositoryConfig {
            base_uri: DEFAULT_REPOSITORY.to_string(),
            credentials: Credentials::Anonymous,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
impl RepositoryConfig {
    pub fn resolver(&self) -> Result<MetadataResolver, HttpError> {
        let client = RepositoryClient::new(&self.user_agent, &self.credentials)?;
        MetadataResolver::new(&self.base_uri, client)
    }

    pub fn fetcher(&self) -> Result<ArtifactFetcher, HttpError> {
        Ok(ArtifactFetcher::new(self.resolver()?))
    }
}
