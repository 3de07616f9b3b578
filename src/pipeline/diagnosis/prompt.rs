use super::types::DiagnosisRequest;

/// Rendered in place of the age when the caller gave none.
pub const AGE_NOT_SPECIFIED: &str = "not specified";

/// Build the diagnosis prompt. Deterministic for a given request.
pub fn build_diagnosis_prompt(request: &DiagnosisRequest) -> String {
    let age = request
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| AGE_NOT_SPECIFIED.to_string());
    let symptoms = request.symptoms.as_slice().join(", ");

    format!(
        r#"As an AI medical assistant, please analyze the following symptoms for a person of age {age}.

Symptoms: {symptoms}

Based on these symptoms, provide:
1. A list of possible conditions, each with a confidence score (e.g., 85%).
2. A brief, easy-to-understand explanation for each potential condition.
3. A clear recommendation on the next steps (e.g., "Consult a general physician," "Seek immediate medical attention," "Rest and monitor symptoms").
4. A prominent disclaimer that this is not a medical diagnosis and a healthcare professional should be consulted.

Respond with a single JSON object wrapped in ```json``` fences, with exactly this format:

```json
{{
  "conditions": [
    {{
      "name": "Condition Name",
      "confidence": "XX%",
      "explanation": "...",
      "recommendation": "..."
    }}
  ],
  "disclaimer": "..."
}}
```
"#
    )
}
