//! Request and response types exchanged with the gateway.
//!
//! All bodies are JSON with camelCase field names, matching the envelope
//! format produced by the codec.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cryptosphere::{CryptoError, EncryptParams, EncryptionEnvelope, Plaintext};
use serde::{Deserialize, Serialize};

pub use cryptosphere::{Decrypted as DecryptResponse, DecryptParams as DecryptRequest};

// ---------------------------------------------------------------------------
// Encrypt / round-trip endpoints
// ---------------------------------------------------------------------------

/// How the `data` field of an [`EncryptRequest`] should be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataEncoding {
    /// Strings are text, objects and arrays are JSON.
    #[default]
    Json,
    /// `data` is a base64 string holding raw bytes.
    Base64,
}

/// Request body for `POST /v1/encrypt` and `POST /v1/roundtrip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptRequest {
    /// Value to encrypt.
    pub data: serde_json::Value,
    /// Key id; the service default when absent.
    #[serde(default)]
    pub key_id: Option<String>,
    /// Algorithm label; the service default when absent.
    #[serde(default)]
    pub algorithm: Option<String>,
    /// Metadata copied verbatim into the envelope.
    #[serde(default)]
    pub additional_data: Option<serde_json::Value>,
    /// Interpretation of `data`.
    #[serde(default)]
    pub encoding: DataEncoding,
}

impl EncryptRequest {
    /// Convert into codec parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedDataType`] if `data` is a number,
    /// boolean or null, or if a base64-encoded `data` is not a valid base64
    /// string.
    pub fn into_params(self) -> Result<EncryptParams, CryptoError> {
        let data = match self.encoding {
            DataEncoding::Json => Plaintext::from_value(self.data)?,
            DataEncoding::Base64 => match self.data {
                serde_json::Value::String(s) => STANDARD
                    .decode(s.trim())
                    .map(Plaintext::Bytes)
                    .map_err(|_| CryptoError::UnsupportedDataType("invalid base64 data".into()))?,
                _ => {
                    return Err(CryptoError::UnsupportedDataType(
                        "base64 data must be a string".into(),
                    ))
                }
            },
        };
        Ok(EncryptParams {
            data,
            key_id: self.key_id,
            algorithm: self.algorithm,
            additional_data: self.additional_data,
        })
    }
}

/// Response body for `POST /v1/roundtrip`: all three forms of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundTripResponse {
    /// The `data` exactly as submitted.
    pub original: serde_json::Value,
    /// The envelope produced by encryption.
    pub envelope: EncryptionEnvelope,
    /// The value obtained by decrypting `envelope`.
    pub decrypted: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Record endpoints
// ---------------------------------------------------------------------------

/// Request and response body for `POST /v1/records/:entity/{encrypt,decrypt}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPayload {
    /// A CRM record whose policy fields are encrypted or decrypted in place.
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(e: &crate::ServiceError) -> Self {
        Self::new(e.code(), e.public_message())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status.
    pub status: String,
    /// Number of entities with a field policy.
    pub policies_loaded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encrypt_request_defaults() {
        let req: EncryptRequest = serde_json::from_value(json!({"data": "555-123-4567"})).unwrap();
        assert_eq!(req.encoding, DataEncoding::Json);
        assert!(req.key_id.is_none());
        let params = req.into_params().unwrap();
        assert_eq!(params.data, Plaintext::Text("555-123-4567".into()));
    }

    #[test]
    fn encrypt_request_reads_camel_case() {
        let req: EncryptRequest = serde_json::from_value(json!({
            "data": {"email": "jane@example.com"},
            "keyId": "contacts",
            "additionalData": {"source": "import"}
        }))
        .unwrap();
        let params = req.into_params().unwrap();
        assert_eq!(params.key_id.as_deref(), Some("contacts"));
        assert_eq!(params.additional_data, Some(json!({"source": "import"})));
        assert!(matches!(params.data, Plaintext::Json(_)));
    }

    #[test]
    fn base64_encoding_yields_bytes() {
        let req: EncryptRequest =
            serde_json::from_value(json!({"data": "AAEC", "encoding": "base64"})).unwrap();
        assert_eq!(req.into_params().unwrap().data, Plaintext::Bytes(vec![0, 1, 2]));
    }

    #[test]
    fn base64_encoding_rejects_non_strings_and_garbage() {
        for data in [json!(12), json!("@@@")] {
            let req: EncryptRequest =
                serde_json::from_value(json!({"data": data, "encoding": "base64"})).unwrap();
            assert!(req.into_params().unwrap_err().is_validation());
        }
    }

    #[test]
    fn numbers_are_unsupported() {
        let req: EncryptRequest = serde_json::from_value(json!({"data": 42})).unwrap();
        assert!(matches!(
            req.into_params(),
            Err(CryptoError::UnsupportedDataType(_))
        ));
    }

    #[test]
    fn error_response_from_service_error() {
        let e = ErrorResponse::from(&crate::ServiceError::DecryptionFailure);
        assert_eq!(e.code, "decryption_failed");
        assert!(e.message.starts_with("Decryption failed"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            policies_loaded: 3,
        };
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["policiesLoaded"], 3);
    }
}
