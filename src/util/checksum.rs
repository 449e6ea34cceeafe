use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use futures::StreamExt;
use lazy_static::lazy_static;
use regex::Regex;
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};
use thiserror::Error;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::trace;

lazy_static! {
    static ref HEX_DIGEST_REGEX: Regex = Regex::new(r"^[0-9a-fA-F]+$").unwrap();
}

/// The hash algorithms Maven repositories publish checksum files for. The name doubles as the
///  extension of the checksum file, e.g. `foo-1.0.jar.sha1`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported hash type {0:?} - expected one of md5, sha1, sha256, sha512")]
pub struct UnsupportedHashAlgorithm(pub String);

impl HashAlgorithm {
    pub fn extension(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// number of hex characters in a digest
    fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha512 => 128,
        }
    }

    pub fn hasher(&self) -> ChecksumHasher {
        match self {
            HashAlgorithm::Md5 => ChecksumHasher::Md5(md5::Context::new()),
            HashAlgorithm::Sha1 => ChecksumHasher::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => ChecksumHasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => ChecksumHasher::Sha512(Sha512::new()),
        }
    }

    /// Extracts the digest from the content of a checksum file. Some repositories append the
    ///  file name after the digest, so only the first token is considered. Returns `None` if
    ///  that is not a hex digest of the right length.
    pub fn parse_checksum_file(&self, content: &str) -> Option<String> {
        let token = content.split_whitespace().next()?;
        if token.len() == self.hex_len() && HEX_DIGEST_REGEX.is_match(token) {
            Some(token.to_ascii_lowercase())
        }
        else {
            None
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnsupportedHashAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(UnsupportedHashAlgorithm(s.to_string())),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Incremental hashing for any of the supported algorithms
#[derive(Clone)]
pub enum ChecksumHasher {
    Md5(md5::Context),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}
impl ChecksumHasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            ChecksumHasher::Md5(context) => context.consume(data),
            ChecksumHasher::Sha1(hasher) => hasher.update(data),
            ChecksumHasher::Sha256(hasher) => hasher.update(data),
            ChecksumHasher::Sha512(hasher) => hasher.update(data),
        }
    }

    /// lower-case hex
    pub fn finalize_hex(self) -> String {
        match self {
            ChecksumHasher::Md5(context) => {
                let digest: [u8; 16] = context.compute().into();
                hex::encode(digest)
            }
            ChecksumHasher::Sha1(hasher) => hex::encode(hasher.finalize()),
            ChecksumHasher::Sha256(hasher) => hex::encode(hasher.finalize()),
            ChecksumHasher::Sha512(hasher) => hex::encode(hasher.finalize()),
        }
    }
}

/// Hashes a local file without reading it into memory as a whole
pub async fn file_digest(path: &Path, algorithm: HashAlgorithm) -> std::io::Result<String> {
    trace!("computing {} digest of {}", algorithm, path.display());

    let file = File::open(path).await?;
    let mut stream = ReaderStream::new(file);
    let mut hasher = algorithm.hasher();

    while let Some(chunk) = stream.next().await {
        hasher.update(&chunk?);
    }
    Ok(hasher.finalize_hex())
}

#[cfg(test)]
mod test {
    use rstest::*;
    use tempfile::TempDir;
    use super::*;

    #[rstest]
    #[case::md5(HashAlgorithm::Md5, "5d41402abc4b2a76b9719d911017c592")]
    #[case::sha1(HashAlgorithm::Sha1, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d")]
    #[case::sha256(HashAlgorithm::Sha256, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")]
    fn test_hasher(#[case] algorithm: HashAlgorithm, #[case] expected: &str) {
        let mut hasher = algorithm.hasher();
        hasher.update(b"hel");
        hasher.update(b"lo");
        assert_eq!(hasher.finalize_hex(), expected);
    }

    #[test]
    fn test_sha512_length() {
        let mut hasher = HashAlgorithm::Sha512.hasher();
        hasher.update(b"hello");
        assert_eq!(hasher.finalize_hex().len(), 128);
    }

    #[rstest]
    #[case("md5", Some(HashAlgorithm::Md5))]
    #[case("SHA1", Some(HashAlgorithm::Sha1))]
    #[case("sha-256", Some(HashAlgorithm::Sha256))]
    #[case("sha512", Some(HashAlgorithm::Sha512))]
    #[case("crc32", None)]
    #[case("", None)]
    fn test_from_str(#[case] name: &str, #[case] expected: Option<HashAlgorithm>) {
        assert_eq!(name.parse::<HashAlgorithm>().ok(), expected);
    }

    #[rstest]
    #[case::plain("5d41402abc4b2a76b9719d911017c592", Some("5d41402abc4b2a76b9719d911017c592"))]
    #[case::trailing_newline("5d41402abc4b2a76b9719d911017c592\n", Some("5d41402abc4b2a76b9719d911017c592"))]
    #[case::upper_case("5D41402ABC4B2A76B9719D911017C592", Some("5d41402abc4b2a76b9719d911017c592"))]
    #[case::with_file_name("5d41402abc4b2a76b9719d911017c592  hello.jar", Some("5d41402abc4b2a76b9719d911017c592"))]
    #[case::wrong_length("5d41402abc4b2a76", None)]
    #[case::not_hex("<html>5d41402abc4b2a76b9719d911017c5</html>", None)]
    #[case::empty("", None)]
    fn test_parse_checksum_file(#[case] content: &str, #[case] expected: Option<&str>) {
        assert_eq!(HashAlgorithm::Md5.parse_checksum_file(content).as_deref(), expected);
    }

    #[tokio::test]
    async fn test_file_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        assert_eq!(file_digest(&path, HashAlgorithm::Md5).await.unwrap(), "5d41402abc4b2a76b9719d911017c592");
    }

    #[tokio::test]
    async fn test_file_digest_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = file_digest(&dir.path().join("missing"), HashAlgorithm::Sha1).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
