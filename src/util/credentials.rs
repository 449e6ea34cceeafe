use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::header::HeaderValue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("the 'username' parameter requires the 'password' parameter")]
    UsernameWithoutPassword,
    #[error("the 'token' parameter cannot be used together with 'username' or 'password'")]
    TokenWithPassword,
    #[error("the 'password' parameter must be base64 if not used together with 'username'")]
    PasswordNotBase64,
    #[error("credentials contain characters that are not allowed in an HTTP header")]
    InvalidHeaderValue,
}

/// How requests to the repository authenticate
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Anonymous,
    Basic {
        username: String,
        password: String,
    },
    /// `username:password`, already base64 encoded
    EncodedBasic(String),
    Bearer(String),
}

// NB: never prints secrets
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Basic { username, .. } => write!(f, "Basic({}:***)", username),
            Credentials::EncodedBasic(_) => f.write_str("EncodedBasic(***)"),
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

impl Credentials {
    /// Combines the optional username / password / token arguments, rejecting combinations
    ///  that are ambiguous
    pub fn from_args(
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Result<Credentials, CredentialsError> {
        match (username, password, token) {
            (None, None, None) => Ok(Credentials::Anonymous),
            (Some(_), None, _) => Err(CredentialsError::UsernameWithoutPassword),
            (Some(_), Some(_), Some(_)) | (None, Some(_), Some(_)) => Err(CredentialsError::TokenWithPassword),
            (Some(username), Some(password), None) => Ok(Credentials::Basic { username, password }),
            (None, Some(password), None) => {
                if is_base64(&password) {
                    Ok(Credentials::EncodedBasic(password))
                }
                else {
                    Err(CredentialsError::PasswordNotBase64)
                }
            }
            (None, None, Some(token)) => Ok(Credentials::Bearer(token)),
        }
    }

    pub fn authorization_header(&self) -> Result<Option<HeaderValue>, CredentialsError> {
        let value = match self {
            Credentials::Anonymous => return Ok(None),
            Credentials::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
            }
            Credentials::EncodedBasic(encoded) => format!("Basic {}", encoded),
            // NB: the token is sent base64 encoded
            Credentials::Bearer(token) => format!("Bearer {}", STANDARD.encode(token)),
        };

        let mut header = HeaderValue::from_str(&value)
            .map_err(|_| CredentialsError::InvalidHeaderValue)?;
        header.set_sensitive(true);
        Ok(Some(header))
    }
}

/// true if `s` is canonical base64, i.e. decoding and re-encoding yields the same string
pub fn is_base64(s: &str) -> bool {
    match STANDARD.decode(s) {
        Ok(decoded) => STANDARD.encode(decoded) == s,
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use rstest::*;
    use super::*;

    #[rstest]
    #[case("dXNlcjpwYXNz", true)]
    #[case("YQ==", true)]
    #[case("", true)]
    #[case("YQ", false)]
    #[case("not base64!", false)]
    #[case("secret", false)]
    fn test_is_base64(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(is_base64(s), expected);
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[rstest]
    #[case::anonymous(None, None, None, Ok(Credentials::Anonymous))]
    #[case::basic(some("user"), some("pass"), None, Ok(Credentials::Basic { username: "user".to_string(), password: "pass".to_string() }))]
    #[case::encoded(None, some("dXNlcjpwYXNz"), None, Ok(Credentials::EncodedBasic("dXNlcjpwYXNz".to_string())))]
    #[case::bearer(None, None, some("tok"), Ok(Credentials::Bearer("tok".to_string())))]
    #[case::username_only(some("user"), None, None, Err(CredentialsError::UsernameWithoutPassword))]
    #[case::username_and_token(some("user"), None, some("tok"), Err(CredentialsError::UsernameWithoutPassword))]
    #[case::password_and_token(None, some("dXNlcjpwYXNz"), some("tok"), Err(CredentialsError::TokenWithPassword))]
    #[case::all_three(some("user"), some("pass"), some("tok"), Err(CredentialsError::TokenWithPassword))]
    #[case::plain_password(None, some("secret"), None, Err(CredentialsError::PasswordNotBase64))]
    fn test_from_args(
        #[case] username: Option<String>,
        #[case] password: Option<String>,
        #[case] token: Option<String>,
        #[case] expected: Result<Credentials, CredentialsError>,
    ) {
        assert_eq!(Credentials::from_args(username, password, token), expected);
    }

    #[rstest]
    #[case::anonymous(Credentials::Anonymous, None)]
    #[case::basic(Credentials::Basic { username: "user".to_string(), password: "pass".to_string() }, Some("Basic dXNlcjpwYXNz"))]
    #[case::encoded(Credentials::EncodedBasic("dXNlcjpwYXNz".to_string()), Some("Basic dXNlcjpwYXNz"))]
    #[case::bearer(Credentials::Bearer("tok".to_string()), Some("Bearer dG9r"))]
    fn test_authorization_header(#[case] credentials: Credentials, #[case] expected: Option<&str>) {
        let header = credentials.authorization_header().unwrap();
        assert_eq!(header.as_ref().map(|h| h.to_str().unwrap()), expected);
        if let Some(header) = header {
            assert!(header.is_sensitive());
        }
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = Credentials::Basic { username: "user".to_string(), password: "pass".to_string() };
        assert_eq!(format!("{:?}", credentials), "Basic(user:***)");
    }
}
