//! PBKDF2-HMAC-SHA256 derivation of per-key-id AES keys.
//!
//! # Derivation
//!
//! ```text
//! key = PBKDF2-HMAC-SHA256(password = key_id || secret_suffix,
//!                          salt     = salt,
//!                          rounds   = iterations,
//!                          dk_len   = 32)
//! ```
//!
//! No randomness is involved: the same key id and [`KdfParams`] yield the same
//! key in every process, so ciphertext written by one instance can be read by
//! any other instance configured identically. The salt is deployment-wide,
//! which means it gives no protection against precomputation once the
//! parameters leak. Supply them from a secret store rather than relying on the
//! compiled-in defaults; note that changing any of them makes previously
//! stored ciphertext unreadable.

use hmac::Hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result};

/// Byte length of the derived AES-256 key.
pub const KEY_LEN: usize = 32;

/// Default deployment-wide PBKDF2 salt.
pub const DEFAULT_SALT: &str = "averox-cryptosphere-salt-v1";

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Default suffix appended to the key id to form the PBKDF2 password.
pub const DEFAULT_SECRET_SUFFIX: &str = "::averox-cryptosphere-master";

/// Injected PBKDF2 parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct KdfParams {
    /// PBKDF2 salt.
    pub salt: Vec<u8>,
    /// PBKDF2 round count.
    pub iterations: u32,
    /// Secret appended to every key id before derivation.
    pub secret_suffix: Vec<u8>,
}

impl KdfParams {
    /// Build parameters from string values, as read from configuration.
    pub fn new(salt: impl Into<String>, iterations: u32, secret_suffix: impl Into<String>) -> Self {
        Self {
            salt: salt.into().into_bytes(),
            iterations,
            secret_suffix: secret_suffix.into().into_bytes(),
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::new(DEFAULT_SALT, DEFAULT_ITERATIONS, DEFAULT_SECRET_SUFFIX)
    }
}

impl std::fmt::Debug for KdfParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The suffix is secret; the salt is not, but keep both out of logs.
        f.debug_struct("KdfParams")
            .field("salt", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .field("secret_suffix", &"[REDACTED]")
            .finish()
    }
}

/// A derived AES-256 key.
///
/// The bytes are only reachable from inside the crate, where they are handed
/// straight to the AEAD cipher. The buffer is zeroed on drop.
pub struct DerivedKey(Box<[u8; KEY_LEN]>);

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

impl ZeroizeOnDrop for DerivedKey {}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the AES-256 key for `key_id`.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if the iteration count is zero, the
/// salt is empty, or the PBKDF2 primitive rejects its inputs.
pub fn derive_key(key_id: &str, params: &KdfParams) -> Result<DerivedKey> {
    if params.iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be at least 1".into(),
        ));
    }
    if params.salt.is_empty() {
        return Err(CryptoError::KeyDerivation("salt must not be empty".into()));
    }

    let mut material = Vec::with_capacity(key_id.len() + params.secret_suffix.len());
    material.extend_from_slice(key_id.as_bytes());
    material.extend_from_slice(&params.secret_suffix);

    let mut key = Box::new([0u8; KEY_LEN]);
    let outcome = pbkdf2::pbkdf2::<Hmac<Sha256>>(
        &material,
        &params.salt,
        params.iterations,
        key.as_mut_slice(),
    );
    material.zeroize();
    outcome.map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KdfParams {
        KdfParams::new("test-salt", 10, "::test-suffix")
    }

    #[test]
    fn same_key_id_derives_same_key() {
        let a = derive_key("contacts", &fast_params()).unwrap();
        let b = derive_key("contacts", &fast_params()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_key_ids_derive_different_keys() {
        let a = derive_key("A", &fast_params()).unwrap();
        let b = derive_key("B", &fast_params()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn salt_and_suffix_change_the_key() {
        let base = derive_key("A", &fast_params()).unwrap();
        let other_salt = derive_key("A", &KdfParams::new("other", 10, "::test-suffix")).unwrap();
        let other_suffix = derive_key("A", &KdfParams::new("test-salt", 10, "::other")).unwrap();
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_suffix.as_bytes());
    }

    #[test]
    fn matches_pbkdf2_reference_vector() {
        // RFC 7914 section 11 test vector for PBKDF2-HMAC-SHA256, c = 1.
        let params = KdfParams {
            salt: b"salt".to_vec(),
            iterations: 1,
            secret_suffix: Vec::new(),
        };
        let key = derive_key("passwd", &params).unwrap();
        assert_eq!(
            key.as_bytes()[..8],
            [0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }

    #[test]
    fn zero_iterations_rejected() {
        let params = KdfParams::new("salt", 0, "");
        let err = derive_key("A", &params).unwrap_err();
        assert!(err.to_string().starts_with("Failed to derive key"));
    }

    #[test]
    fn empty_salt_rejected() {
        let params = KdfParams::new("", 10, "");
        assert!(matches!(
            derive_key("A", &params),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn derived_key_is_zeroize_on_drop() {
        fn assert_zeroize_on_drop<T: ZeroizeOnDrop>() {}
        assert_zeroize_on_drop::<DerivedKey>();
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = derive_key("A", &fast_params()).unwrap();
        assert_eq!(format!("{key:?}"), "DerivedKey([REDACTED])");
        let params = format!("{:?}", fast_params());
        assert!(!params.contains("test-suffix"));
        assert!(params.contains("iterations: 10"));
    }
}
