use serde::{Deserialize, Deserializer, Serialize};

/// Symptoms chosen by the caller.
///
/// Set semantics with insertion order kept for display. Scoring never
/// depends on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymptomSelection {
    symptoms: Vec<String>,
}

impl SymptomSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symptom. Returns `false` (and changes nothing) when it is
    /// already selected or blank.
    pub fn add(&mut self, symptom: impl Into<String>) -> bool {
        let symptom = symptom.into();
        let trimmed = symptom.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return false;
        }
        self.symptoms.push(trimmed.to_string());
        true
    }

    /// Remove a symptom. Returns `true` if it was selected.
    pub fn remove(&mut self, symptom: &str) -> bool {
        let symptom = symptom.trim();
        let before = self.symptoms.len();
        self.symptoms.retain(|s| s != symptom);
        self.symptoms.len() != before
    }

    /// Reset to the empty selection.
    pub fn clear(&mut self) {
        self.symptoms.clear();
    }

    /// Names compare after trimming, as `add` stores them.
    pub fn contains(&self, symptom: &str) -> bool {
        let symptom = symptom.trim();
        self.symptoms.iter().any(|s| s == symptom)
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symptoms.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.symptoms
    }
}

impl<S: Into<String>> FromIterator<S> for SymptomSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = Self::new();
        for symptom in iter {
            selection.add(symptom);
        }
        selection
    }
}

impl<'de> Deserialize<'de> for SymptomSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}
