use bytes::Bytes;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, LOCATION, USER_AGENT};
use hyper::http::uri::{Authority, InvalidUri};
use hyper::{Body, Client, Method, Request, Response, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use thiserror::Error;
use tracing::{debug, trace};

use crate::util::credentials::{Credentials, CredentialsError};

const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URI {url:?}: {source}")]
    InvalidUri {
        url: String,
        source: InvalidUri,
    },
    #[error("failed to build request for {url}: {source}")]
    Request {
        url: String,
        source: hyper::http::Error,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: hyper::Error,
    },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: StatusCode,
    },
    #[error("not an absolute URI: {url:?}")]
    NotAbsolute {
        url: String,
    },
    #[error("invalid user agent {0:?}")]
    InvalidUserAgent(String),
    #[error("too many redirects, last one was to {url}")]
    TooManyRedirects {
        url: String,
    },
    #[error("invalid credentials: {0}")]
    Credentials(#[from] CredentialsError),
}

/// Issues GET requests against a Maven repository, adding user agent and authorization headers.
///  Non-2xx responses are reported as [HttpError::Status].
///
/// Instances do HTTP connection caching internally, so keeping them alive has performance benefits.
///  Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct RepositoryClient {
    client: Client<HttpsConnector<HttpConnector>>,
    user_agent: HeaderValue,
    authorization: Option<HeaderValue>,
}
impl RepositoryClient {
    pub fn new(user_agent: &str, credentials: &Credentials) -> Result<RepositoryClient, HttpError> {
        Ok(RepositoryClient {
            client: Client::builder()
                .build::<_, Body>(HttpsConnector::new()),
            // NB: Maven Central returns a 403 without a user agent
            user_agent: HeaderValue::from_str(user_agent)
                .map_err(|_| HttpError::InvalidUserAgent(user_agent.to_string()))?,
            authorization: credentials.authorization_header()?,
        })
    }

    /// GET with the body buffered in memory - for small documents like metadata and checksums
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes, HttpError> {
        let response = self.get(url).await?;
        to_bytes(response.into_body())
            .await
            .map_err(|source| HttpError::Transport { url: url.to_string(), source })
    }

    /// GET returning the declared content length (if any) and the still unconsumed body
    pub async fn get_stream(&self, url: &str) -> Result<(Option<u64>, Body), HttpError> {
        let response = self.get(url).await?;
        let content_length = response.headers().get(CONTENT_LENGTH)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        Ok((content_length, response.into_body()))
    }

    async fn get(&self, url: &str) -> Result<Response<Body>, HttpError> {
        let original_uri = parse_uri(url)?;
        let mut uri = original_uri.clone();

        for _ in 0..=MAX_REDIRECTS {
            let mut builder = Request::builder()
                .method(Method::GET)
                .uri(uri.clone())
                .header(USER_AGENT, self.user_agent.clone());
            // NB: credentials are only sent to the host they were given for
            if let Some(authorization) = &self.authorization {
                if uri.authority() == original_uri.authority() {
                    builder = builder.header(AUTHORIZATION, authorization.clone());
                }
            }
            let request = builder.body(Body::empty())
                .map_err(|source| HttpError::Request { url: uri.to_string(), source })?;

            trace!("getting {}", uri);

            let response = self.client.request(request)
                .await
                .map_err(|source| HttpError::Transport { url: uri.to_string(), source })?;

            let status = response.status();
            if status.is_redirection() {
                if let Some(location) = response.headers().get(LOCATION).and_then(|h| h.to_str().ok()) {
                    let target = resolve_location(&uri, location)?;
                    debug!("{} redirected to {}", uri, target);
                    uri = target;
                    continue;
                }
            }

            if !status.is_success() {
                return Err(HttpError::Status { url: uri.to_string(), status });
            }
            return Ok(response);
        }

        Err(HttpError::TooManyRedirects { url: uri.to_string() })
    }
}

fn parse_uri(url: &str) -> Result<Uri, HttpError> {
    Uri::try_from(url)
        .map_err(|source| HttpError::InvalidUri { url: url.to_string(), source })
}

/// `Location` headers are either absolute or relative to the host of the current request
fn resolve_location(current: &Uri, location: &str) -> Result<Uri, HttpError> {
    if location.starts_with('/') {
        let scheme = current.scheme_str().unwrap_or("https");
        let authority = current.authority().map(Authority::as_str).unwrap_or("");
        parse_uri(&format!("{}://{}{}", scheme, authority, location))
    }
    else {
        parse_uri(location)
    }
}

/// Checks that `base_uri` is a valid absolute URI and strips trailing '/' characters.
pub fn normalize_base_uri(base_uri: &str) -> Result<String, HttpError> {
    let base_uri = base_uri.trim_end_matches('/');
    let parsed = parse_uri(base_uri)?;
    if parsed.scheme().is_none() || parsed.authority().is_none() {
        return Err(HttpError::NotAbsolute { url: base_uri.to_string() });
    }
    Ok(base_uri.to_string())
}
