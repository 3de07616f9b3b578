//! `POST /api/diagnose`: one LLM diagnosis round-trip.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::checker::SymptomSelection;
use crate::pipeline::diagnosis::{self, DiagnosisRequest, DiagnosisResult};

const INVALID_AGE: &str = "Age must be a positive number.";

/// Wire body. `age` arrives as a number or as the raw text of a form field.
#[derive(Debug, Deserialize)]
pub struct DiagnoseBody {
    #[serde(default)]
    pub symptoms: Option<SymptomSelection>,
    #[serde(default)]
    pub age: Option<Value>,
}

pub async fn diagnose(
    State(ctx): State<ApiContext>,
    Json(body): Json<DiagnoseBody>,
) -> Result<Json<DiagnosisResult>, ApiError> {
    let request = DiagnosisRequest::new(
        body.symptoms.unwrap_or_default(),
        parse_age(body.age.as_ref())?,
    );
    let result = diagnosis::diagnose(ctx.backend.as_ref(), &request, None).await?;
    Ok(Json(result))
}

/// Blank or null means "not given". Zero passes through so request
/// validation rejects it with the same message as other bad ages.
fn parse_age(raw: Option<&Value>) -> Result<Option<u32>, ApiError> {
    let invalid = || ApiError::BadRequest(INVALID_AGE.into());
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
