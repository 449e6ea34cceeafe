use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::{ready, Stream};
use hyper::Body;
use pin_project_lite::pin_project;
use thiserror::Error;
use tracing::trace;

use crate::util::checksum::{ChecksumHasher, HashAlgorithm};

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("failed to read response body: {0}")]
    Transport(#[from] hyper::Error),
    #[error("{algorithm} checksum mismatch: expected {expected}, got {actual}")]
    Validation {
        algorithm: HashAlgorithm,
        expected: String,
        actual: String,
    },
    #[error("polling from failed stream")]
    Failed,
}

/// Streams an HTTP body chunk by chunk while an [HttpBodyValidator] sees every chunk. After the
///  last chunk the validator gets to judge the complete body, e.g. by comparing its digest with a
///  repository's checksum file.
///
/// A failed validation shows up as one final `Err` item after all data was passed on, a transport
///  error as an `Err` item where it occurred. From then on the upstream body is no longer polled
///  and every poll yields [BodyError::Failed].
pin_project! {
    pub struct ValidatingHttpBody {
        #[pin]
        http_body: Body,
        validator: Box<dyn HttpBodyValidator>,
        is_failed: bool,
    }
}
impl ValidatingHttpBody {
    pub fn new(http_body: Body, validator: impl HttpBodyValidator + 'static) -> ValidatingHttpBody {
        ValidatingHttpBody {
            http_body,
            validator: Box::new(validator),
            is_failed: false,
        }
    }
}

impl Stream for ValidatingHttpBody {
    type Item = Result<Bytes, BodyError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.is_failed {
            return Poll::Ready(Some(Err(BodyError::Failed)));
        }

        let this = self.project();
        let inner = ready!(this.http_body.poll_next(cx));
        match inner {
            Some(Ok(data)) => {
                // available data from the wrapped HTTP body -> pass this on
                this.validator.add_data(&data);
                Poll::Ready(Some(Ok(data)))
            }
            None => {
                // wrapped HTTP body is fully drained -> finalize validation
                match this.validator.validate() {
                    Ok(()) => Poll::Ready(None),
                    Err(e) => {
                        *this.is_failed = true;
                        Poll::Ready(Some(Err(e)))
                    }
                }
            }
            Some(Err(e)) => {
                *this.is_failed = true;
                Poll::Ready(Some(Err(e.into())))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.http_body.size_hint()
    }
}

pub trait HttpBodyValidator: Send {
    fn add_data(&mut self, data: &Bytes);
    fn validate(&self) -> Result<(), BodyError>;
}

pub struct NopHttpBodyValidator {
}
impl HttpBodyValidator for NopHttpBodyValidator {
    fn add_data(&mut self, _data: &Bytes) {
        // ignore all data
    }

    fn validate(&self) -> Result<(), BodyError> {
        // ... and always acknowledge data as valid
        Ok(())
    }
}

pub struct ChecksumHttpBodyValidator {
    algorithm: HashAlgorithm,
    hasher: ChecksumHasher,
    expected_hash: String, // lower-case hex
}
impl ChecksumHttpBodyValidator {
    pub fn new(algorithm: HashAlgorithm, expected_hash: &str) -> ChecksumHttpBodyValidator {
        ChecksumHttpBodyValidator {
            algorithm,
            hasher: algorithm.hasher(),
            expected_hash: expected_hash.to_ascii_lowercase(),
        }
    }
}
impl HttpBodyValidator for ChecksumHttpBodyValidator {
    fn add_data(&mut self, data: &Bytes) {
        self.hasher.update(data);
    }

    fn validate(&self) -> Result<(), BodyError> {
        let actual = self.hasher.clone().finalize_hex();
        trace!("validating {} hash", self.algorithm);
        if actual == self.expected_hash {
            Ok(())
        }
        else {
            Err(BodyError::Validation {
                algorithm: self.algorithm,
                expected: self.expected_hash.clone(),
                actual,
            })
        }
    }
}
