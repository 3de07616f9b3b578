use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::selection::SymptomSelection;
use super::CatalogError;

// ═══════════════════════════════════════════
// Built-in data
// ═══════════════════════════════════════════

pub const DEFAULT_SYMPTOMS: &[&str] = &[
    "Fever",
    "Headache",
    "Cough",
    "Sore throat",
    "Runny nose",
    "Fatigue",
    "Body aches",
    "Nausea",
    "Vomiting",
    "Diarrhea",
    "Shortness of breath",
    "Chest pain",
    "Dizziness",
    "Skin rash",
    "Joint pain",
    "Loss of appetite",
    "Chills",
    "Sweating",
    "Abdominal pain",
    "Back pain",
];

const DEFAULT_CONDITIONS: &[(&str, Severity, &[&str])] = &[
    (
        "Common Cold",
        Severity::Mild,
        &["Runny nose", "Sore throat", "Cough", "Headache", "Fatigue"],
    ),
    (
        "Flu",
        Severity::Moderate,
        &["Fever", "Body aches", "Fatigue", "Headache", "Cough", "Chills"],
    ),
    (
        "Food Poisoning",
        Severity::Moderate,
        &["Nausea", "Vomiting", "Diarrhea", "Abdominal pain", "Fever"],
    ),
    (
        "Migraine",
        Severity::Moderate,
        &["Headache", "Nausea", "Dizziness", "Fatigue"],
    ),
    (
        "Possible Serious Condition",
        Severity::Severe,
        &["Chest pain", "Shortness of breath"],
    ),
];

// ═══════════════════════════════════════════
// Symptom catalog
// ═══════════════════════════════════════════

/// Ordered list of symptom names the checker offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymptomCatalog {
    symptoms: Vec<String>,
}

impl SymptomCatalog {
    /// Build a catalog, rejecting duplicate or blank names.
    pub fn new<I, S>(symptoms: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut list = Vec::new();
        for symptom in symptoms {
            let symptom = symptom.into();
            if symptom.trim().is_empty() {
                return Err(CatalogError::BlankSymptom);
            }
            if !seen.insert(symptom.clone()) {
                return Err(CatalogError::DuplicateSymptom(symptom));
            }
            list.push(symptom);
        }
        Ok(Self { symptoms: list })
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.symptoms.iter().any(|s| s == symptom)
    }

    /// Autocomplete lookup: case-insensitive substring match in catalog
    /// order, skipping symptoms that are already selected.
    pub fn search<'a>(&'a self, query: &str, exclude: &SymptomSelection) -> Vec<&'a str> {
        let needle = query.trim().to_lowercase();
        self.symptoms
            .iter()
            .filter(|s| s.to_lowercase().contains(&needle))
            .filter(|s| !exclude.contains(s))
            .map(String::as_str)
            .collect()
    }
}

impl Default for SymptomCatalog {
    fn default() -> Self {
        Self {
            symptoms: DEFAULT_SYMPTOMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ═══════════════════════════════════════════
// Condition profiles
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mild => write!(f, "Mild"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Severe => write!(f, "Severe"),
        }
    }
}

/// A named condition and the symptoms that characterise it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionProfile {
    name: String,
    required_symptoms: Vec<String>,
    severity: Severity,
}

impl ConditionProfile {
    pub fn new<I, S>(name: impl Into<String>, severity: Severity, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut required_symptoms: Vec<String> = Vec::new();
        for symptom in required {
            let symptom = symptom.into();
            if !required_symptoms.contains(&symptom) {
                required_symptoms.push(symptom);
            }
        }
        Self {
            name: name.into(),
            required_symptoms,
            severity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_symptoms(&self) -> &[String] {
        &self.required_symptoms
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Number of required symptoms present in `selection`.
    pub fn match_count(&self, selection: &SymptomSelection) -> usize {
        self.required_symptoms
            .iter()
            .filter(|s| selection.contains(s))
            .count()
    }
}

/// Fixed, validated set of condition profiles in declaration order.
#[derive(Debug, Clone)]
pub struct ConditionCatalog {
    profiles: Vec<ConditionProfile>,
}

impl ConditionCatalog {
    /// Validate and wrap a profile list. Names must be unique and every
    /// profile needs at least one required symptom.
    pub fn new(profiles: Vec<ConditionProfile>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        for profile in &profiles {
            if profile.required_symptoms.is_empty() {
                return Err(CatalogError::EmptyProfile(profile.name.clone()));
            }
            if !names.insert(profile.name.as_str()) {
                return Err(CatalogError::DuplicateCondition(profile.name.clone()));
            }
        }
        Ok(Self { profiles })
    }

    pub fn profiles(&self) -> &[ConditionProfile] {
        &self.profiles
    }
}

impl Default for ConditionCatalog {
    fn default() -> Self {
        let profiles = DEFAULT_CONDITIONS
            .iter()
            .map(|(name, severity, required)| {
                ConditionProfile::new(*name, *severity, required.iter().copied())
            })
            .collect();
        Self { profiles }
    }
}
