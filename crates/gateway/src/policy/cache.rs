//! In-memory cache of entity field policies, keyed by entity name.
//!
//! Policies are loaded at startup and, when backed by a file, reloaded on a
//! configurable interval. The cache uses `arc-swap` for lock-free reads on the
//! hot path.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use thiserror::Error;

use super::path::FieldPath;

/// Errors from the policy cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The requested entity has no entry in the cache.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

/// The fields of one entity that are stored encrypted.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPolicy {
    /// Key id for this entity's fields; the codec default when `None`.
    pub key_id: Option<String>,
    /// Parsed field paths.
    pub fields: Arc<Vec<FieldPath>>,
}

/// Shared, lock-free cache of policies keyed by entity name.
///
/// Internally backed by [`ArcSwap`] so readers never block and the reload task
/// can atomically swap in a completely new map.
#[derive(Clone, Debug)]
pub struct PolicyCache {
    inner: Arc<ArcSwap<HashMap<String, EntityPolicy>>>,
}

impl PolicyCache {
    /// Create a new, empty [`PolicyCache`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(HashMap::new()))),
        }
    }

    /// Return the number of entities with a policy.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Return `true` if no policies are cached.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Look up the policy of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownEntity`] if `entity` is not present.
    pub fn get(&self, entity: &str) -> Result<EntityPolicy, CacheError> {
        self.inner
            .load()
            .get(entity)
            .cloned()
            .ok_or_else(|| CacheError::UnknownEntity(entity.to_owned()))
    }

    /// Atomically replace the entire policy map.
    pub fn replace_all(&self, policies: HashMap<String, EntityPolicy>) {
        self.inner.store(Arc::new(policies));
    }
}

impl Default for PolicyCache {
    fn default() -> Self {
        Self::new()
    }
}
