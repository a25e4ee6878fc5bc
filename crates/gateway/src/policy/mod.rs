//! Field policies: which fields of which CRM entity are stored encrypted.
//!
//! # Policy file
//!
//! ```yaml
//! entities:
//!   contacts:
//!     keyId: crm-contacts        # optional, codec default otherwise
//!     fields: [email, phone, notes, address.street, phones[]]
//! ```
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** This module only knows about paths; the
//!   record transform in `crate::records` applies the codec.

pub mod cache;
pub mod path;

pub use cache::{EntityPolicy, PolicyCache};
pub use path::{FieldPath, PathSegment};

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::time;
use tracing::{info, warn};

/// Policy compiled into the binary, used when no policy file is configured.
const BUILTIN_POLICY: &str = include_str!("default_policy.yaml");

/// Errors from loading a policy document.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("failed to read policy file {path}: {reason}")]
    Read {
        /// File that was read.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// The document is not valid policy YAML.
    #[error("invalid policy document: {0}")]
    Parse(String),

    /// A field path is malformed.
    #[error("invalid field path {path:?} for entity {entity}")]
    InvalidPath {
        /// Entity declaring the path.
        entity: String,
        /// The offending path.
        path: String,
    },

    /// An entity lists no fields.
    #[error("entity {0} declares no fields")]
    NoFields(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDocument {
    entities: HashMap<String, RawEntityPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawEntityPolicy {
    #[serde(default)]
    key_id: Option<String>,
    fields: BTreeSet<String>,
}

/// Parse and validate a YAML policy document.
///
/// # Errors
///
/// Returns [`PolicyError::Parse`] for malformed YAML or unknown keys,
/// [`PolicyError::InvalidPath`] for a malformed field path, and
/// [`PolicyError::NoFields`] for an entity with an empty field list.
pub fn parse_policy(text: &str) -> Result<HashMap<String, EntityPolicy>, PolicyError> {
    let doc: PolicyDocument =
        serde_yaml::from_str(text).map_err(|e| PolicyError::Parse(e.to_string()))?;

    let mut policies = HashMap::with_capacity(doc.entities.len());
    for (entity, raw) in doc.entities {
        if raw.fields.is_empty() {
            return Err(PolicyError::NoFields(entity));
        }
        let mut fields = Vec::with_capacity(raw.fields.len());
        for path in &raw.fields {
            let parsed = FieldPath::parse(path).ok_or_else(|| PolicyError::InvalidPath {
                entity: entity.clone(),
                path: path.clone(),
            })?;
            fields.push(parsed);
        }
        let key_id = raw.key_id.filter(|k| !k.trim().is_empty());
        policies.insert(
            entity,
            EntityPolicy {
                key_id,
                fields: Arc::new(fields),
            },
        );
    }
    Ok(policies)
}

/// Load the built-in CRM policy into `cache`.
///
/// # Errors
///
/// Returns an error only if the embedded document is invalid.
pub fn load_builtin(cache: &PolicyCache) -> Result<(), PolicyError> {
    let policies = parse_policy(BUILTIN_POLICY)?;
    cache.replace_all(policies);
    info!(count = cache.len(), "built-in field policy loaded");
    Ok(())
}

/// Read the policy file at `path` and atomically replace the cache.
///
/// The cache is untouched if reading or validation fails.
///
/// # Errors
///
/// Returns [`PolicyError::Read`] if the file cannot be read, or any
/// [`parse_policy`] error.
pub async fn load_file(path: &Path, cache: &PolicyCache) -> Result<(), PolicyError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PolicyError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    let policies = parse_policy(&text)?;
    cache.replace_all(policies);
    info!(path = %path.display(), count = cache.len(), "field policy loaded");
    Ok(())
}

/// Spawn a background task that periodically reloads the policy file.
///
/// On reload failure the previous policies are retained and a warning is
/// emitted.
pub fn refresh_task(
    path: std::path::PathBuf,
    interval: std::time::Duration,
    cache: PolicyCache,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately; startup already loaded the file.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = load_file(&path, &cache).await {
                warn!(error = %e, "policy reload failed; retaining previous policy");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_policy_is_valid() {
        let policies = parse_policy(BUILTIN_POLICY).unwrap();
        let contacts = &policies["contacts"];
        assert!(contacts.fields.iter().any(|f| f.as_str() == "email"));
        assert!(contacts.key_id.is_none());
        assert!(policies.contains_key("leads"));
    }

    #[test]
    fn key_id_is_optional() {
        let policies = parse_policy(
            r#"
entities:
  contacts:
    keyId: crm-contacts
    fields: [email]
  leads:
    keyId: "  "
    fields: [email]
"#,
        )
        .unwrap();
        assert_eq!(policies["contacts"].key_id.as_deref(), Some("crm-contacts"));
        assert!(policies["leads"].key_id.is_none());
    }

    #[test]
    fn rejects_bad_path() {
        let err = parse_policy("entities:\n  contacts:\n    fields: [\"a..b\"]\n").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPath { .. }));
    }

    #[test]
    fn rejects_empty_field_list() {
        let err = parse_policy("entities:\n  contacts:\n    fields: []\n").unwrap_err();
        assert!(matches!(err, PolicyError::NoFields(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse_policy("entities:\n  contacts:\n    field: [email]\n").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[tokio::test]
    async fn load_file_replaces_cache() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "entities:\n  tasks:\n    fields: [description]").unwrap();

        let cache = PolicyCache::new();
        load_builtin(&cache).unwrap();
        load_file(file.path(), &cache).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("tasks").is_ok());
        assert!(cache.get("contacts").is_err());
    }

    #[tokio::test]
    async fn document_without_entities_empties_the_cache() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "entities: {{}}").unwrap();

        let cache = PolicyCache::new();
        load_builtin(&cache).unwrap();
        assert!(!cache.is_empty());
        load_file(file.path(), &cache).await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "entities: [not, a, map]").unwrap();

        let cache = PolicyCache::new();
        load_builtin(&cache).unwrap();
        let before = cache.len();
        assert!(load_file(file.path(), &cache).await.is_err());
        assert!(load_file(Path::new("/nonexistent/policy.yaml"), &cache)
            .await
            .is_err());
        assert_eq!(cache.len(), before);
    }
}
