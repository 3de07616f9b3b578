use serde::Serialize;

use super::catalog::{ConditionCatalog, ConditionProfile};
use super::selection::SymptomSelection;

/// One scored condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub condition: ConditionProfile,
    pub match_count: usize,
    pub required_count: usize,
    pub match_percentage: u8,
}

/// Score `selection` against every profile in `catalog`.
///
/// Only conditions with at least one matching symptom are returned, ordered
/// by match percentage (highest first). Equal percentages keep catalog
/// declaration order. An empty selection yields an empty result.
pub fn score(catalog: &ConditionCatalog, selection: &SymptomSelection) -> Vec<MatchResult> {
    if selection.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<MatchResult> = catalog
        .profiles()
        .iter()
        .filter_map(|profile| {
            let match_count = profile.match_count(selection);
            if match_count == 0 {
                return None;
            }
            let required_count = profile.required_symptoms().len();
            Some(MatchResult {
                condition: profile.clone(),
                match_count,
                required_count,
                match_percentage: percentage(match_count, required_count),
            })
        })
        .collect();

    // sort_by is stable: ties stay in catalog order
    results.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    results
}

/// `round(100 * matched / required)`, half rounded up.
fn percentage(matched: usize, required: usize) -> u8 {
    if required == 0 {
        return 0;
    }
    let scaled = (200 * matched + required) / (2 * required);
    scaled.min(100) as u8
}

impl ConditionCatalog {
    pub fn score(&self, selection: &SymptomSelection) -> Vec<MatchResult> {
        score(self, selection)
    }
}
