//! Local symptom checker endpoints. No backend involved.
//!
//! - `POST /api/checker/score`: rank catalog conditions for a selection
//! - `GET /api/checker/symptoms`: autocomplete over the symptom catalog
//! - `POST /api/checker/specialists`: doctors for diagnosed conditions

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::types::ApiContext;
use crate::checker::specialists::{recommend, Doctor};
use crate::checker::{MatchResult, SymptomSelection};

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub symptoms: SymptomSelection,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub results: Vec<MatchResult>,
}

pub async fn score(
    State(ctx): State<ApiContext>,
    Json(req): Json<ScoreRequest>,
) -> Json<ScoreResponse> {
    let results = ctx.conditions.score(&req.symptoms);
    tracing::debug!(
        symptom_count = req.symptoms.len(),
        matches = results.len(),
        "Checker scored selection"
    );
    Json(ScoreResponse { results })
}

#[derive(Debug, Default, Deserialize)]
pub struct SymptomQuery {
    #[serde(default)]
    pub q: String,
    /// Comma-separated symptoms already chosen.
    #[serde(default)]
    pub selected: String,
}

#[derive(Serialize)]
pub struct SymptomsResponse {
    pub symptoms: Vec<String>,
}

pub async fn symptoms(
    State(ctx): State<ApiContext>,
    Query(query): Query<SymptomQuery>,
) -> Json<SymptomsResponse> {
    let selected: SymptomSelection = query.selected.split(',').collect();
    let symptoms = ctx
        .symptoms
        .search(&query.q, &selected)
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(SymptomsResponse { symptoms })
}

#[derive(Debug, Deserialize)]
pub struct SpecialistsRequest {
    #[serde(default)]
    pub conditions: Vec<String>,
}

#[derive(Serialize)]
pub struct SpecialistsResponse {
    pub specialists: Vec<Doctor>,
}

pub async fn specialists(Json(req): Json<SpecialistsRequest>) -> Json<SpecialistsResponse> {
    let specialists = recommend(req.conditions.iter().map(String::as_str));
    Json(SpecialistsResponse { specialists })
}
