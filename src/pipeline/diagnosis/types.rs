use serde::{Deserialize, Serialize};

use crate::checker::SymptomSelection;

/// Symptoms plus optional age, as submitted by the checker form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    #[serde(default)]
    pub symptoms: SymptomSelection,
    #[serde(default)]
    pub age: Option<u32>,
}

impl DiagnosisRequest {
    pub fn new(symptoms: SymptomSelection, age: Option<u32>) -> Self {
        Self { symptoms, age }
    }
}

/// One candidate condition returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosedCondition {
    pub name: String,
    /// Label as produced by the model, e.g. `"85%"`.
    pub confidence: String,
    pub explanation: String,
    pub recommendation: String,
}

/// Fully validated diagnosis. Never partially populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub conditions: Vec<DiagnosedCondition>,
    pub disclaimer: String,
}
