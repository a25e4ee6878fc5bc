//! Configuration loading and validation for the gateway.
//!
//! All values are read from `CRYPTOSPHERE_`-prefixed environment variables at
//! startup (`CRYPTOSPHERE_KEY_ID`, `CRYPTOSPHERE_KDF_SALT`, ...). The process
//! exits with a clear error message if any variable is invalid.

use anyhow::{Context, Result};
use cryptosphere::{kdf, Algorithm, CodecConfig, KdfParams, DEFAULT_KEY_ID};
use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CRYPTOSPHERE";

/// Validated gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP/gRPC collector endpoint. Spans are only exported when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Default key id for calls that omit one.
    #[serde(default = "default_key_id")]
    pub key_id: String,

    /// Default AEAD algorithm label.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Size-only debug events from the codec.
    #[serde(default)]
    pub debug: bool,

    /// Reserved codec flag.
    #[serde(default)]
    pub telemetry: bool,

    /// PBKDF2 salt. Changing it makes stored ciphertext unreadable.
    #[serde(default = "default_kdf_salt")]
    pub kdf_salt: String,

    /// PBKDF2 iteration count.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Secret appended to every key id before derivation.
    #[serde(default = "default_kdf_secret_suffix")]
    pub kdf_secret_suffix: String,

    /// YAML field policy file. The built-in CRM policy is used when unset.
    #[serde(default)]
    pub policy_path: Option<String>,

    /// How often (seconds) to reload the policy file.
    #[serde(default = "default_policy_refresh_interval")]
    pub policy_refresh_interval_secs: u64,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}
fn default_key_id() -> String {
    DEFAULT_KEY_ID.into()
}
fn default_algorithm() -> String {
    Algorithm::default().label().into()
}
fn default_kdf_salt() -> String {
    kdf::DEFAULT_SALT.into()
}
fn default_kdf_iterations() -> u32 {
    kdf::DEFAULT_ITERATIONS
}
fn default_kdf_secret_suffix() -> String {
    kdf::DEFAULT_SECRET_SUFFIX.into()
}
fn default_policy_refresh_interval() -> u64 {
    300
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Codec options derived from this configuration.
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            key_id: self.key_id.clone(),
            algorithm: self.algorithm.clone(),
            debug: self.debug,
            telemetry: self.telemetry,
            kdf: KdfParams::new(
                self.kdf_salt.clone(),
                self.kdf_iterations,
                self.kdf_secret_suffix.clone(),
            ),
        }
    }

    /// Whether the compiled-in KDF salt or secret suffix is still in use.
    pub fn uses_builtin_kdf_secrets(&self) -> bool {
        self.kdf_salt == kdf::DEFAULT_SALT || self.kdf_secret_suffix == kdf::DEFAULT_SECRET_SUFFIX
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.key_id, "CRYPTOSPHERE_KEY_ID")?;
        ensure_non_empty(&self.kdf_salt, "CRYPTOSPHERE_KDF_SALT")?;

        self.algorithm
            .parse::<Algorithm>()
            .with_context(|| format!("CRYPTOSPHERE_ALGORITHM is invalid: {}", self.algorithm))?;

        if self.kdf_iterations == 0 {
            anyhow::bail!("CRYPTOSPHERE_KDF_ITERATIONS must be > 0");
        }
        if self.policy_refresh_interval_secs == 0 {
            anyhow::bail!("CRYPTOSPHERE_POLICY_REFRESH_INTERVAL_SECS must be > 0");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "CRYPTOSPHERE_OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        if let Some(path) = &self.policy_path {
            ensure_non_empty(path, "CRYPTOSPHERE_POLICY_PATH")?;
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            listen_port: default_listen_port(),
            log_level: default_log_level(),
            otel_exporter_otlp_endpoint: None,
            key_id: default_key_id(),
            algorithm: default_algorithm(),
            debug: false,
            telemetry: false,
            kdf_salt: default_kdf_salt(),
            kdf_iterations: default_kdf_iterations(),
            kdf_secret_suffix: default_kdf_secret_suffix(),
            policy_path: None,
            policy_refresh_interval_secs: default_policy_refresh_interval(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_key_id(), "averox-default-key");
        assert_eq!(default_algorithm(), "AES-GCM");
        assert_eq!(default_kdf_iterations(), 100_000);
        assert_eq!(default_policy_refresh_interval(), 300);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(base().validate().is_ok());
        assert!(base().uses_builtin_kdf_secrets());
    }

    #[test]
    fn validate_rejects_empty_key_id() {
        let cfg = Config {
            key_id: " ".into(),
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_algorithm() {
        let cfg = Config {
            algorithm: "AES-CBC".into(),
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_iterations() {
        let cfg = Config {
            kdf_iterations: 0,
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_policy_path() {
        let cfg = Config {
            policy_path: Some("".into()),
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn codec_config_carries_kdf_overrides() {
        let cfg = Config {
            kdf_salt: "vault-salt".into(),
            kdf_iterations: 250_000,
            kdf_secret_suffix: "::vault".into(),
            debug: true,
            ..base()
        };
        assert!(!cfg.uses_builtin_kdf_secrets());
        let codec = cfg.codec_config();
        assert_eq!(codec.kdf, KdfParams::new("vault-salt", 250_000, "::vault"));
        assert!(codec.debug);
        assert_eq!(codec.key_id, "averox-default-key");
    }
}
