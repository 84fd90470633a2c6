use thiserror::Error;

/// Reasons a request is refused as unauthorized.
/// The detail is for logs only; callers just see "Unauthorized".
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("authorization header is not a bearer token")]
    InvalidHeader,
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token header has no kid")]
    MissingKeyId,
    #[error("key set fetch failed: {0}")]
    KeySetFetch(String),
    #[error("no signing key matches kid {0}")]
    NoMatchingKey(String),
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("token has no subject")]
    MissingSubject,
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::MissingHeader => 1001,
            AuthError::InvalidHeader => 1002,
            AuthError::MalformedToken(_) => 1003,
            AuthError::MissingKeyId => 1004,
            AuthError::KeySetFetch(_) => 1101,
            AuthError::NoMatchingKey(_) => 1102,
            AuthError::InvalidKey(_) => 1103,
            AuthError::Verification(_) => 1201,
            AuthError::MissingSubject => 1202,
        }
    }
}
