//! CryptoSphere field-level encryption codec.
//!
//! Derives a per-key-id AES-256 key with PBKDF2-HMAC-SHA256 and seals values
//! with AES-256-GCM into self-describing [`EncryptionEnvelope`]s. The codec is
//! pure computation: no I/O, no caches, no shared mutable state.
//!
//! ```no_run
//! use cryptosphere::{Codec, EncryptParams, Encryptor};
//! use serde_json::json;
//!
//! let codec = Codec::default();
//! let envelope = codec
//!     .encrypt(EncryptParams::new(cryptosphere::Plaintext::Json(json!({"email": "jane@example.com"}))))
//!     .unwrap();
//! let out = codec.decrypt(&envelope.to_decrypt_params()).unwrap();
//! assert_eq!(out.decrypted["email"], "jane@example.com");
//! ```

pub mod cipher;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use cipher::Algorithm;
pub use codec::{Codec, CodecConfig, Encryptor, DEFAULT_KEY_ID};
pub use envelope::{
    format_timestamp, Decrypted, DecryptParams, EncryptParams, EncryptionEnvelope, Plaintext,
};
pub use error::{CryptoError, Result};
pub use kdf::KdfParams;
