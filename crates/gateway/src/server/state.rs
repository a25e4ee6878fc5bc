//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use cryptosphere::{Codec, Encryptor};

use crate::policy::PolicyCache;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable so that Axum can clone the state for each
/// request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// The codec, behind the capability trait so tests can substitute it.
    pub encryptor: Arc<dyn Encryptor>,
    /// Lock-free cache of entity field policies.
    pub policies: PolicyCache,
}

impl AppState {
    /// Create a new [`AppState`] from an encryptor and a policy cache.
    pub fn new(encryptor: Arc<dyn Encryptor>, policies: PolicyCache) -> Self {
        Self {
            encryptor,
            policies,
        }
    }
}

impl Default for AppState {
    /// Default codec and an empty policy cache, suitable for tests.
    fn default() -> Self {
        Self::new(Arc::new(Codec::default()), PolicyCache::new())
    }
}
