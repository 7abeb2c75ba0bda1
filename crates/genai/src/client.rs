//! Gemini API client implementing [`Restructurer`].

use crate::instruction::SYSTEM_INSTRUCTION;
use deck_core::{Error, RestructureError, RestructuredSection, Restructurer, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Gemini API server URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model used for restructuring.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Sampling temperature of every request.
const TEMPERATURE: f32 = 0.7;

/// Timeout of a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Marker the API puts in quota errors that do not come back as HTTP 429.
const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    /// Base URL of the API server
    base_url: String,
    api_key: String,
    model: String,
    /// HTTP client
    client: Client,
}

impl GeminiClient {
    /// Create a client for the default server and model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a client against a custom server URL.
    pub fn with_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = build_client(REQUEST_TIMEOUT)?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            client,
        })
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Service(format!("Failed to create HTTP client: {}", e)))
}

impl Restructurer for GeminiClient {
    fn restructure(
        &self,
        fragments: &[String],
    ) -> std::result::Result<RestructuredSection, RestructureError> {
        let request = GenerateRequest::new(fragments);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| RestructureError::Failed(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RestructureError::Failed(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let section = parse_response(&body)?;
        log::debug!(
            "Restructured {} fragments into '{}' with {} items",
            fragments.len(),
            section.keys,
            section.items.len()
        );
        Ok(section)
    }
}

/// Map an unsuccessful HTTP response to a restructuring error.
fn classify_failure(status: StatusCode, body: &str) -> RestructureError {
    let message = format!("HTTP {}: {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains(RESOURCE_EXHAUSTED) {
        RestructureError::RateLimited(message)
    } else {
        RestructureError::Failed(message)
    }
}

/// Extract the section JSON from a `generateContent` response body.
fn parse_response(body: &str) -> std::result::Result<RestructuredSection, RestructureError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| RestructureError::Failed(format!("invalid response: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(RestructureError::Failed("empty model answer".to_string()));
    }

    serde_json::from_str(strip_code_fence(&text))
        .map_err(|e| RestructureError::Failed(format!("model answer is not a section: {}", e)))
}

/// Remove a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateRequest<'a> {
    fn new(fragments: &'a [String]) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: fragments.iter().map(|f| Part { text: f.as_str() }).collect(),
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: TEMPERATURE,
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::FlashCard;

    #[test]
    fn test_request_body_shape() {
        let fragments = vec!["Anatomy".to_string(), "Lens - focuses light".to_string()];
        let body = serde_json::to_value(GenerateRequest::new(&fragments)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][1]["text"], "Lens - focuses light");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            0
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "{\"keys\":\"Eye\",\"items\":[{\"term\":\"Lens\",\"definition\":\"focuses light\"}]}"}]
                }
            }]
        }"#;

        let section = parse_response(body).unwrap();
        assert_eq!(
            section,
            RestructuredSection {
                keys: "Eye".to_string(),
                items: vec![FlashCard::new("Lens", "focuses light")],
            }
        );
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let result = parse_response(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert!(matches!(result, Err(RestructureError::Failed(_))));
    }

    #[test]
    fn test_parse_response_with_non_json_answer() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Sorry, no."}]}}]}"#;
        assert!(matches!(
            parse_response(body),
            Err(RestructureError::Failed(_))
        ));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            RestructureError::RateLimited(_)
        ));
        assert!(matches!(
            classify_failure(
                StatusCode::BAD_REQUEST,
                r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#
            ),
            RestructureError::RateLimited(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            RestructureError::Failed(_)
        ));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::with_url("http://localhost:8080/", "key")
            .unwrap()
            .with_model("gemini-test");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
    }
}
