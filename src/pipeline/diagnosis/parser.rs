use std::sync::LazyLock;

use regex::Regex;

use super::types::DiagnosisResult;

/// A line holding only a code fence and an optional info string.
static FENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*```[ \t]*([A-Za-z0-9_+.-]*)[ \t]*\r?$").expect("fence line pattern")
});

/// Reason a model response was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    NoJsonBlock,
    InvalidJson(String),
    BlankField(&'static str),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoJsonBlock => write!(f, "no fenced JSON block found"),
            Self::InvalidJson(e) => write!(f, "JSON does not match diagnosis schema: {e}"),
            Self::BlankField(field) => write!(f, "required field is blank: {field}"),
        }
    }
}

/// Extract the first fenced JSON block from free-form model output.
///
/// A block tagged `json` (any case) wins over an untagged one; an untagged
/// block is used only when no tagged block exists. Blocks in other
/// languages are skipped.
pub fn extract_json_block(response: &str) -> Option<&str> {
    let blocks: Vec<(&str, &str)> = fenced_blocks(response).collect();
    blocks
        .iter()
        .find(|(info, _)| info.eq_ignore_ascii_case("json"))
        .or_else(|| blocks.iter().find(|(info, _)| info.is_empty()))
        .map(|&(_, body)| body.trim())
}

/// Fence lines taken in open/close pairs, yielding `(info, body)`.
/// An unclosed trailing fence is dropped.
fn fenced_blocks(response: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut fences = FENCE_LINE.captures_iter(response);
    std::iter::from_fn(move || {
        let open = fences.next()?;
        let close = fences.next()?;
        let info = open.get(1).map_or("", |m| m.as_str());
        let start = open.get(0)?.end();
        let end = close.get(0)?.start();
        Some((info, &response[start..end]))
    })
}

/// Parse a model response into a validated `DiagnosisResult`.
///
/// Every condition needs non-blank `name`, `confidence`, `explanation` and
/// `recommendation`; `disclaimer` must be non-blank. Anything else is a
/// `ParseFailure`, never a partially filled result.
pub fn parse_diagnosis_response(response: &str) -> Result<DiagnosisResult, ParseFailure> {
    let json = extract_json_block(response).ok_or(ParseFailure::NoJsonBlock)?;
    let result: DiagnosisResult =
        serde_json::from_str(json).map_err(|e| ParseFailure::InvalidJson(e.to_string()))?;
    validate(&result)?;
    Ok(result)
}

fn validate(result: &DiagnosisResult) -> Result<(), ParseFailure> {
    if result.disclaimer.trim().is_empty() {
        return Err(ParseFailure::BlankField("disclaimer"));
    }
    for condition in &result.conditions {
        let fields = [
            ("conditions[].name", &condition.name),
            ("conditions[].confidence", &condition.confidence),
            ("conditions[].explanation", &condition.explanation),
            ("conditions[].recommendation", &condition.recommendation),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ParseFailure::BlankField(*field));
        }
    }
    Ok(())
}
