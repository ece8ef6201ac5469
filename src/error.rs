use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur while managing the certificate authority.
///
/// The variants fall into four dispositions: configuration defects
/// ([`PkiError::NoCaLoaded`], [`PkiError::CaAlreadyInstalled`]), filesystem
/// failures, client input errors ([`PkiError::MalformedInput`],
/// [`PkiError::UnknownRole`]) and internal cryptographic/encoding failures.
#[derive(Debug, Error)]
pub enum PkiError {
    /// Signing was attempted before a CA was loaded or built.
    #[error("No CA loaded")]
    NoCaLoaded,

    /// A CA was already installed for this authority.
    #[error("CA already installed")]
    CaAlreadyInstalled,

    /// I/O failure other than "not found".
    #[error("Filesystem error on {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A certificate signing request failed to parse or to verify.
    #[error("Invalid request: {0}")]
    MalformedInput(String),

    /// Requested certificate type is neither `client` nor `server`.
    #[error("Invalid value for type: {0}")]
    UnknownRole(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// A job submitted to the crypto worker pool panicked or was cancelled.
    #[error("Worker pool error: {0}")]
    Worker(String),
}

impl PkiError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PkiError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was caused by the caller's input (400-class).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PkiError::MalformedInput(_) | PkiError::UnknownRole(_))
    }
}

impl From<der::Error> for PkiError {
    /// Converts a `der::Error` into a `PkiError`.
    fn from(err: der::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for PkiError {
    fn from(err: rsa::Error) -> Self {
        PkiError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for PkiError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for PkiError {
    fn from(err: pkcs8::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for PkiError {
    fn from(err: pkcs8::spki::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PkiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(PkiError::MalformedInput("bad".into()).is_client_error());
        assert!(PkiError::UnknownRole("admin".into()).is_client_error());
        assert!(!PkiError::NoCaLoaded.is_client_error());
        assert!(
            !PkiError::filesystem("/pki", std::io::Error::other("denied")).is_client_error()
        );
    }
}
