//! Shared types for the HTTP API layer.

use std::sync::Arc;

use crate::checker::{ConditionCatalog, SymptomCatalog};
use crate::pipeline::backend::GenerativeBackend;

/// Shared, read-only context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub backend: Arc<dyn GenerativeBackend>,
    pub symptoms: Arc<SymptomCatalog>,
    pub conditions: Arc<ConditionCatalog>,
}

impl ApiContext {
    /// Context with the built-in symptom and condition catalogs.
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self::with_catalogs(backend, SymptomCatalog::default(), ConditionCatalog::default())
    }

    pub fn with_catalogs(
        backend: Arc<dyn GenerativeBackend>,
        symptoms: SymptomCatalog,
        conditions: ConditionCatalog,
    ) -> Self {
        Self {
            backend,
            symptoms: Arc::new(symptoms),
            conditions: Arc::new(conditions),
        }
    }
}
