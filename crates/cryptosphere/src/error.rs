//! Error taxonomy of the codec.

use thiserror::Error;

/// Errors produced by key derivation, encryption and decryption.
///
/// Validation variants are raised before any cryptographic work starts.
/// [`CryptoError::Decryption`] is deliberately uniform: a malformed base64
/// field, a wrong IV length, a wrong key and a tampered ciphertext all map to
/// the same variant and message.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// `encrypted` or `iv` was absent (or empty) on decrypt.
    #[error("missing required parameters: encrypted and iv are both required")]
    MissingParameters,

    /// The plaintext value has a shape the codec does not encrypt.
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// The algorithm label is not one the codec implements.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The configured default key id is empty.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// PBKDF2 rejected its parameters.
    #[error("Failed to derive key: {0}")]
    KeyDerivation(String),

    /// The AEAD seal operation failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Authentication or decoding of the envelope failed.
    #[error("Decryption failed: unable to authenticate ciphertext")]
    Decryption,
}

impl CryptoError {
    /// Returns `true` for errors caused by caller input rather than by the
    /// cryptographic layer.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CryptoError::MissingParameters
                | CryptoError::UnsupportedDataType(_)
                | CryptoError::UnsupportedAlgorithm(_)
                | CryptoError::InvalidConfig(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CryptoError>;
