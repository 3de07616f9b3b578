use super::parser::parse_diagnosis_response;
use super::prompt::build_diagnosis_prompt;
use super::types::{DiagnosisRequest, DiagnosisResult};
use super::DiagnosisError;
use crate::pipeline::backend::GenerativeBackend;
use crate::pipeline::cancel::{cancelled, CancelToken};

/// Reject requests that must never reach the backend.
pub fn validate_request(request: &DiagnosisRequest) -> Result<(), DiagnosisError> {
    if request.symptoms.is_empty() {
        return Err(DiagnosisError::InvalidRequest("Symptoms are required.".into()));
    }
    if request.age == Some(0) {
        return Err(DiagnosisError::InvalidRequest(
            "Age must be a positive number.".into(),
        ));
    }
    Ok(())
}

/// Run one diagnosis round-trip against `backend`.
///
/// Invalid requests fail before any network call. Backend failures are not
/// retried. A response that does not contain a valid fenced JSON diagnosis
/// fails with `MalformedBackendResponse` carrying the raw text.
pub async fn diagnose(
    backend: &dyn GenerativeBackend,
    request: &DiagnosisRequest,
    cancel: Option<&CancelToken>,
) -> Result<DiagnosisResult, DiagnosisError> {
    validate_request(request)?;
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(DiagnosisError::Cancelled);
    }

    let prompt = build_diagnosis_prompt(request);
    tracing::info!(
        backend = backend.name(),
        symptom_count = request.symptoms.len(),
        age_given = request.age.is_some(),
        "Diagnosis request started"
    );

    let raw = tokio::select! {
        response = backend.generate(&prompt) => response.map_err(|e| {
            tracing::warn!(
                backend = backend.name(),
                kind = e.kind(),
                error = %e,
                "Diagnosis backend call failed"
            );
            DiagnosisError::BackendUnavailable(e)
        })?,
        _ = cancelled(cancel) => {
            tracing::info!(backend = backend.name(), "Diagnosis request cancelled");
            return Err(DiagnosisError::Cancelled);
        }
    };

    match parse_diagnosis_response(&raw) {
        Ok(result) => {
            tracing::info!(
                conditions = result.conditions.len(),
                "Diagnosis response parsed"
            );
            Ok(result)
        }
        Err(failure) => {
            tracing::warn!(
                reason = %failure,
                raw_len = raw.len(),
                "Diagnosis response could not be parsed"
            );
            Err(DiagnosisError::MalformedBackendResponse {
                reason: failure.to_string(),
                raw,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::SymptomSelection;
    use crate::pipeline::backend::{BackendError, MockBackend};
    use crate::pipeline::cancel::cancel_pair;

    const VALID: &str = "```json\n{\"conditions\": [{\"name\": \"Flu\", \"confidence\": \"85%\", \
        \"explanation\": \"Fever is common in flu.\", \"recommendation\": \"Rest.\"}], \
        \"disclaimer\": \"Not a medical diagnosis.\"}\n```";

    fn request(symptoms: &[&str], age: Option<u32>) -> DiagnosisRequest {
        DiagnosisRequest::new(symptoms.iter().copied().collect::<SymptomSelection>(), age)
    }

    #[tokio::test]
    async fn empty_symptoms_rejected_without_network_call() {
        let backend = MockBackend::new(VALID);
        let err = diagnose(&backend, &request(&[], Some(30)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::InvalidRequest(_)));
        assert_eq!(err.kind(), "invalid_request");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn zero_age_rejected_without_network_call() {
        let backend = MockBackend::new(VALID);
        let err = diagnose(&backend, &request(&["Fever"], Some(0)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::InvalidRequest(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn valid_response_is_parsed() {
        let backend = MockBackend::new(VALID);
        let result = diagnose(&backend, &request(&["Fever"], Some(30)), None)
            .await
            .unwrap();
        assert_eq!(result.conditions.len(), 1);
        assert_eq!(result.conditions[0].confidence, "85%");
        assert_eq!(backend.call_count(), 1);

        let prompt = backend.last_prompt().unwrap();
        assert!(prompt.contains("Symptoms: Fever"));
        assert!(prompt.contains("age 30"));
    }

    #[tokio::test]
    async fn response_without_fenced_block_is_malformed_and_keeps_raw() {
        let raw = "You most likely have a cold. Drink fluids.";
        let backend = MockBackend::new(raw);
        let err = diagnose(&backend, &request(&["Fever"], Some(30)), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_backend_response");
        assert_eq!(err.raw_response(), Some(raw));
    }

    #[tokio::test]
    async fn schema_violation_is_malformed() {
        let backend = MockBackend::new("```json\n{\"conditions\": [{\"name\": \"Flu\"}]}\n```");
        let err = diagnose(&backend, &request(&["Fever"], None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::MalformedBackendResponse { .. }));
    }

    #[tokio::test]
    async fn backend_failure_is_unavailable_and_not_retried() {
        let backend = MockBackend::failing(BackendError::Status {
            status: 503,
            body: "overloaded".into(),
        });
        let err = diagnose(&backend, &request(&["Fever"], None), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DiagnosisError::BackendUnavailable(BackendError::Status { status: 503, .. })
        ));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_call() {
        let backend = MockBackend::hanging();
        let (handle, token) = cancel_pair();
        let req = request(&["Fever"], None);
        let (result, _) = tokio::join!(diagnose(&backend, &req, Some(&token)), async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            handle.cancel();
        });
        assert!(matches!(result, Err(DiagnosisError::Cancelled)));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_backend() {
        let backend = MockBackend::new(VALID);
        let (handle, token) = cancel_pair();
        handle.cancel();
        let err = diagnose(&backend, &request(&["Fever"], None), Some(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::Cancelled));
        assert_eq!(backend.call_count(), 0);
    }
}
