//! AES-256-GCM sealing and opening of normalised plaintext bytes.
//!
//! A random 96-bit nonce is drawn from the OS CSPRNG for every seal. Plain GCM
//! is not nonce-misuse resistant: reusing a nonce under the same key breaks
//! both confidentiality and authentication, so nonces are never accepted from
//! callers on the encrypt path.

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::error::CryptoError;
use crate::kdf::DerivedKey;

/// Byte length of an AES-GCM nonce (96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag (128 bits).
pub const TAG_LEN: usize = 16;

/// AEAD algorithms the codec implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// AES-256-GCM with a 12-byte nonce and 16-byte tag.
    #[default]
    AesGcm,
}

impl Algorithm {
    /// Canonical label written into envelopes.
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::AesGcm => "AES-GCM",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AES-GCM" | "AES-256-GCM" => Ok(Algorithm::AesGcm),
            _ => Err(CryptoError::UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

/// Output of a single seal: the nonce and `ciphertext || tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Raw nonce bytes.
    pub nonce: [u8; NONCE_LEN],
    /// Raw ciphertext followed by the authentication tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the cipher cannot be built or the
/// AEAD operation fails.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> Result<Sealed, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(format!("aead error: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce.as_slice());
    Ok(Sealed {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypt and authenticate `ciphertext` (with trailing tag) under `key`.
///
/// # Errors
///
/// Returns [`CryptoError::Decryption`] for a nonce of the wrong length, a
/// ciphertext shorter than the tag, or any authentication failure.
pub fn open(key: &DerivedKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
        return Err(CryptoError::Decryption);
    }
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Decryption)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}
