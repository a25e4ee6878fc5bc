//! Envelope, plaintext and parameter types.
//!
//! Envelopes serialise with camelCase field names so that the JSON written by
//! this crate and by the browser SDK are interchangeable:
//!
//! ```json
//! {
//!   "encrypted": "<base64(ciphertext || tag)>",
//!   "iv": "<base64(12-byte nonce)>",
//!   "keyId": "averox-default-key",
//!   "algorithm": "AES-GCM",
//!   "timestamp": "2024-05-01T12:00:00.000Z",
//!   "additionalData": { "entity": "contacts" }
//! }
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CryptoError, Result};

/// A value to encrypt.
#[derive(Debug, Clone, PartialEq)]
pub enum Plaintext {
    /// UTF-8 text, encrypted as its bytes.
    Text(String),
    /// A JSON object or array, encrypted as its serialised form.
    Json(Value),
    /// Raw bytes, encrypted unchanged.
    Bytes(Vec<u8>),
}

impl Plaintext {
    /// Classify a dynamic JSON value.
    ///
    /// Strings become [`Plaintext::Text`]; objects and arrays become
    /// [`Plaintext::Json`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedDataType`] for numbers, booleans and
    /// null.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Plaintext::Text(s)),
            v @ (Value::Object(_) | Value::Array(_)) => Ok(Plaintext::Json(v)),
            Value::Null => Err(CryptoError::UnsupportedDataType("null".into())),
            Value::Bool(_) => Err(CryptoError::UnsupportedDataType("boolean".into())),
            Value::Number(_) => Err(CryptoError::UnsupportedDataType("number".into())),
        }
    }

    /// Normalise to the byte sequence that gets encrypted.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Plaintext::Text(s) => Ok(s.as_bytes().to_vec()),
            Plaintext::Json(v) => serde_json::to_vec(v)
                .map_err(|e| CryptoError::UnsupportedDataType(format!("unserialisable JSON: {e}"))),
            Plaintext::Bytes(b) => Ok(b.clone()),
        }
    }
}

impl From<String> for Plaintext {
    fn from(s: String) -> Self {
        Plaintext::Text(s)
    }
}

impl From<&str> for Plaintext {
    fn from(s: &str) -> Self {
        Plaintext::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Plaintext {
    fn from(b: Vec<u8>) -> Self {
        Plaintext::Bytes(b)
    }
}

/// The persisted unit of ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionEnvelope {
    /// Base64 of `ciphertext || tag`.
    pub encrypted: String,
    /// Base64 of the 12-byte nonce.
    pub iv: String,
    /// Key id the ciphertext was sealed under.
    pub key_id: String,
    /// AEAD label, e.g. `AES-GCM`.
    pub algorithm: String,
    /// Creation time. Not authenticated.
    #[serde(with = "iso8601_millis")]
    pub timestamp: DateTime<Utc>,
    /// Caller metadata carried alongside the ciphertext. Not authenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Value>,
}

impl EncryptionEnvelope {
    /// Parameters that decrypt this envelope.
    pub fn to_decrypt_params(&self) -> DecryptParams {
        DecryptParams {
            encrypted: Some(self.encrypted.clone()),
            iv: Some(self.iv.clone()),
            key_id: Some(self.key_id.clone()),
        }
    }
}

/// Input to [`crate::Encryptor::encrypt`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptParams {
    /// Value to encrypt.
    pub data: Plaintext,
    /// Key id; the codec default when `None`.
    pub key_id: Option<String>,
    /// Algorithm label; the codec default when `None`.
    pub algorithm: Option<String>,
    /// Metadata copied verbatim into the envelope.
    pub additional_data: Option<Value>,
}

impl EncryptParams {
    /// Encrypt `data` with all defaults.
    pub fn new(data: impl Into<Plaintext>) -> Self {
        Self {
            data: data.into(),
            key_id: None,
            algorithm: None,
            additional_data: None,
        }
    }

    /// Use a specific key id.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Use a specific algorithm label.
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Attach pass-through metadata.
    pub fn with_additional_data(mut self, additional_data: Value) -> Self {
        self.additional_data = Some(additional_data);
        self
    }
}

/// Input to [`crate::Encryptor::decrypt`].
///
/// Both `encrypted` and `iv` are optional at the type level so that absent
/// fields in a deserialised request reach the codec and fail validation there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptParams {
    /// Base64 ciphertext with tag.
    #[serde(default)]
    pub encrypted: Option<String>,
    /// Base64 nonce.
    #[serde(default)]
    pub iv: Option<String>,
    /// Key id; the codec default when `None`. Must match the key id used to
    /// encrypt, otherwise authentication fails.
    #[serde(default)]
    pub key_id: Option<String>,
}

/// Output of [`crate::Encryptor::decrypt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decrypted {
    /// Parsed JSON when the plaintext is valid JSON, otherwise the text.
    pub decrypted: Value,
    /// Key id actually used.
    pub key_id: String,
    /// Decryption instant (not the encryption instant).
    #[serde(with = "iso8601_millis")]
    pub timestamp: DateTime<Utc>,
}

pub(crate) fn encode_b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode_b64(s: &str) -> Result<Vec<u8>> {
    STANDARD.decode(s.trim()).map_err(|_| CryptoError::Decryption)
}

/// Interpret decrypted bytes the way the browser SDK does: decode as UTF-8,
/// then try JSON, falling back to the raw string.
///
/// Strings that happen to be JSON literals (`"42"`, `"true"`, `"null"`) come
/// back as the parsed value.
pub(crate) fn interpret(bytes: &[u8]) -> Value {
    let text = String::from_utf8_lossy(bytes);
    match serde_json::from_str::<Value>(&text) {
        Ok(v) => v,
        Err(_) => Value::String(text.into_owned()),
    }
}

/// Current time truncated to whole milliseconds.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

mod iso8601_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Render a timestamp the way envelopes do.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
