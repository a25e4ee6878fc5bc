//! The [`Encryptor`] capability and its PBKDF2 + AES-256-GCM implementation.

use tracing::debug;

use crate::cipher::{self, Algorithm};
use crate::envelope::{
    decode_b64, encode_b64, interpret, now_millis, Decrypted, DecryptParams, EncryptParams,
    EncryptionEnvelope,
};
use crate::error::{CryptoError, Result};
use crate::kdf::{self, KdfParams};

/// Key id used when callers do not supply one.
pub const DEFAULT_KEY_ID: &str = "averox-default-key";

/// Encrypt/decrypt capability.
///
/// Implementations hold no per-call state; every call is independent and may
/// run concurrently with any other.
pub trait Encryptor: Send + Sync {
    /// Encrypt a value into a fresh envelope.
    fn encrypt(&self, params: EncryptParams) -> Result<EncryptionEnvelope>;

    /// Decrypt an envelope and interpret the plaintext as JSON or text.
    fn decrypt(&self, params: &DecryptParams) -> Result<Decrypted>;

    /// Decrypt an envelope and return the raw plaintext bytes.
    fn decrypt_bytes(&self, params: &DecryptParams) -> Result<Vec<u8>>;
}

/// Construction-time options of a [`Codec`].
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Default key id.
    pub key_id: String,
    /// Default algorithm label.
    pub algorithm: String,
    /// Emit size-only debug events for every operation.
    pub debug: bool,
    /// Reserved; stored but not acted upon.
    pub telemetry: bool,
    /// Key derivation parameters.
    pub kdf: KdfParams,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            key_id: DEFAULT_KEY_ID.into(),
            algorithm: Algorithm::default().label().into(),
            debug: false,
            telemetry: false,
            kdf: KdfParams::default(),
        }
    }
}

/// Stateless codec deriving a key per call.
#[derive(Debug, Clone)]
pub struct Codec {
    default_key_id: String,
    default_algorithm: Algorithm,
    debug: bool,
    telemetry: bool,
    kdf: KdfParams,
}

impl Codec {
    /// Build a codec from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedAlgorithm`] if the default algorithm
    /// label is unknown, or [`CryptoError::InvalidConfig`] if the default key
    /// id is empty.
    pub fn new(config: CodecConfig) -> Result<Self> {
        if config.key_id.trim().is_empty() {
            return Err(CryptoError::InvalidConfig(
                "default key id must not be empty".into(),
            ));
        }
        let default_algorithm = config.algorithm.parse::<Algorithm>()?;
        Ok(Self {
            default_key_id: config.key_id,
            default_algorithm,
            debug: config.debug,
            telemetry: config.telemetry,
            kdf: config.kdf,
        })
    }

    /// Key id applied when a call omits one.
    pub fn default_key_id(&self) -> &str {
        &self.default_key_id
    }

    /// Algorithm applied when a call omits one.
    pub fn default_algorithm(&self) -> Algorithm {
        self.default_algorithm
    }

    /// Whether the reserved telemetry flag was set.
    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry
    }

    fn effective_key_id<'a>(&'a self, key_id: Option<&'a str>) -> &'a str {
        match key_id {
            Some(id) if !id.is_empty() => id,
            _ => &self.default_key_id,
        }
    }

    /// Validate, decode and open an envelope. Shared by both decrypt paths.
    fn open(&self, params: &DecryptParams) -> Result<(Vec<u8>, String)> {
        let (encrypted, iv) = match (params.encrypted.as_deref(), params.iv.as_deref()) {
            (Some(e), Some(i)) if !e.is_empty() && !i.is_empty() => (e, i),
            _ => return Err(CryptoError::MissingParameters),
        };

        let ciphertext = decode_b64(encrypted)?;
        let nonce = decode_b64(iv)?;

        let key_id = self.effective_key_id(params.key_id.as_deref());
        let key = kdf::derive_key(key_id, &self.kdf)?;
        let plaintext = cipher::open(&key, &nonce, &ciphertext)?;

        if self.debug {
            debug!(
                key_id,
                ciphertext_len = ciphertext.len(),
                plaintext_len = plaintext.len(),
                "decrypted payload"
            );
        }
        Ok((plaintext, key_id.to_owned()))
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            default_key_id: DEFAULT_KEY_ID.into(),
            default_algorithm: Algorithm::default(),
            debug: false,
            telemetry: false,
            kdf: KdfParams::default(),
        }
    }
}

impl Encryptor for Codec {
    fn encrypt(&self, params: EncryptParams) -> Result<EncryptionEnvelope> {
        let algorithm = match params.algorithm.as_deref() {
            Some(label) => label.parse::<Algorithm>()?,
            None => self.default_algorithm,
        };
        let plaintext = params.data.to_bytes()?;
        let key_id = self.effective_key_id(params.key_id.as_deref()).to_owned();

        let key = kdf::derive_key(&key_id, &self.kdf)?;
        let sealed = match algorithm {
            Algorithm::AesGcm => cipher::seal(&key, &plaintext)?,
        };

        if self.debug {
            debug!(
                key_id = %key_id,
                algorithm = %algorithm,
                plaintext_len = plaintext.len(),
                ciphertext_len = sealed.ciphertext.len(),
                "encrypted payload"
            );
        }

        Ok(EncryptionEnvelope {
            encrypted: encode_b64(&sealed.ciphertext),
            iv: encode_b64(&sealed.nonce),
            key_id,
            algorithm: algorithm.label().to_owned(),
            timestamp: now_millis(),
            additional_data: params.additional_data,
        })
    }

    fn decrypt(&self, params: &DecryptParams) -> Result<Decrypted> {
        let (plaintext, key_id) = self.open(params)?;
        Ok(Decrypted {
            decrypted: interpret(&plaintext),
            key_id,
            timestamp: now_millis(),
        })
    }

    fn decrypt_bytes(&self, params: &DecryptParams) -> Result<Vec<u8>> {
        self.open(params).map(|(plaintext, _)| plaintext)
    }
}
