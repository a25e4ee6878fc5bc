//! Common error types shared across crates.

use cryptosphere::CryptoError;
use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::DecryptionFailure`] → 422
/// - [`ServiceError::EncryptionFailure`] → 500
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed: missing envelope fields, unsupported data
    /// type or algorithm, invalid JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The named entity has no field policy.
    #[error("not found: {0}")]
    NotFound(String),

    /// An envelope could not be authenticated. Deliberately carries no detail.
    #[error("decryption failed")]
    DecryptionFailure,

    /// Key derivation or encryption failed.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::DecryptionFailure => 422,
            ServiceError::EncryptionFailure(_) => 500,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::NotFound(_) => "unknown_entity",
            ServiceError::DecryptionFailure => "decryption_failed",
            ServiceError::EncryptionFailure(_) | ServiceError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to return to callers. Server-side failures are reduced to a
    /// generic sentence; the detail belongs in logs.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::BadRequest(m) => m.clone(),
            ServiceError::NotFound(entity) => format!("no field policy for entity: {entity}"),
            ServiceError::DecryptionFailure => CryptoError::Decryption.to_string(),
            ServiceError::EncryptionFailure(_) => "encryption failed".into(),
            ServiceError::Internal(_) => "internal error".into(),
        }
    }
}

impl From<CryptoError> for ServiceError {
    fn from(e: CryptoError) -> Self {
        match e {
            e if e.is_validation() => ServiceError::BadRequest(e.to_string()),
            CryptoError::Decryption => ServiceError::DecryptionFailure,
            other => ServiceError::EncryptionFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::NotFound("x".into()).http_status(), 404);
        assert_eq!(ServiceError::DecryptionFailure.http_status(), 422);
        assert_eq!(
            ServiceError::EncryptionFailure("x".into()).http_status(),
            500
        );
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn crypto_errors_map_by_class() {
        assert!(matches!(
            ServiceError::from(CryptoError::MissingParameters),
            ServiceError::BadRequest(_)
        ));
        assert!(matches!(
            ServiceError::from(CryptoError::UnsupportedAlgorithm("DES".into())),
            ServiceError::BadRequest(_)
        ));
        assert!(matches!(
            ServiceError::from(CryptoError::Decryption),
            ServiceError::DecryptionFailure
        ));
        assert!(matches!(
            ServiceError::from(CryptoError::KeyDerivation("x".into())),
            ServiceError::EncryptionFailure(_)
        ));
    }

    #[test]
    fn server_side_detail_is_not_public() {
        let e = ServiceError::EncryptionFailure("Failed to derive key: salt".into());
        assert!(!e.public_message().contains("salt"));
        assert_eq!(e.code(), "internal_error");
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BadRequest("missing required parameters".into());
        assert!(e.to_string().contains("missing required parameters"));
    }
}
