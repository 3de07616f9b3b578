//! Local symptom checker.
//!
//! Deterministic, synchronous scoring of a symptom selection against a
//! fixed set of condition profiles. No network, no shared state: safe to
//! call on every keystroke.

pub mod catalog;
pub mod matcher;
pub mod selection;
pub mod specialists;

pub use catalog::{ConditionCatalog, ConditionProfile, Severity, SymptomCatalog};
pub use matcher::{score, MatchResult};
pub use selection::SymptomSelection;

use thiserror::Error;

/// Malformed catalog data. Raised at construction, never while scoring.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Symptom names cannot be blank")]
    BlankSymptom,

    #[error("Duplicate symptom in catalog: {0}")]
    DuplicateSymptom(String),

    #[error("Duplicate condition profile: {0}")]
    DuplicateCondition(String),

    #[error("Condition profile has no required symptoms: {0}")]
    EmptyProfile(String),
}

impl CatalogError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BlankSymptom => "blank_symptom",
            Self::DuplicateSymptom(_) => "duplicate_symptom",
            Self::DuplicateCondition(_) => "duplicate_condition",
            Self::EmptyProfile(_) => "empty_profile",
        }
    }
}
