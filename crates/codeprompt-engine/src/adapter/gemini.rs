use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{ContentPart, GenerateContentRequest, GenerateContentResponse, GenerativeService};
use crate::http::response_json_or_error;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiService {
    api_base: String,
    api_key: String,
    http: HttpClient,
}

impl GeminiService {
    pub fn new(api_key: impl Into<String>, api_base: &str) -> Self {
        let api_base = api_base.trim().trim_end_matches('/');
        Self {
            api_base: if api_base.is_empty() {
                DEFAULT_GEMINI_API_BASE.to_string()
            } else {
                api_base.to_string()
            },
            api_key: api_key.into(),
            http: HttpClient::new(),
        }
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    pub(crate) fn build_payload(request: &GenerateContentRequest) -> Value {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => json!({ "text": text }),
                ContentPart::InlineData { mime_type, data } => json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": data,
                    }
                }),
            })
            .collect::<Vec<Value>>();

        let mut payload = Map::new();
        payload.insert(
            "contents".to_string(),
            json!([{ "role": "user", "parts": parts }]),
        );
        if let Some(instruction) = request
            .system_instruction
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            payload.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{ "text": instruction }] }),
            );
        }

        let mut generation_config = Map::new();
        if let Some(temperature) = request.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(schema) = request.response_schema.as_ref() {
            generation_config.insert(
                "responseMimeType".to_string(),
                Value::String("application/json".to_string()),
            );
            generation_config.insert("responseSchema".to_string(), schema.to_wire());
        }
        if !generation_config.is_empty() {
            payload.insert(
                "generationConfig".to_string(),
                Value::Object(generation_config),
            );
        }
        Value::Object(payload)
    }

    pub(crate) fn extract_text(payload: &Value) -> Result<(String, Option<String>)> {
        let candidates = payload
            .get("candidates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let Some(first) = candidates.first() else {
            let reason = payload
                .get("promptFeedback")
                .and_then(|feedback| feedback.get("blockReason"))
                .and_then(Value::as_str)
                .unwrap_or("no candidates returned");
            bail!("Gemini returned no content ({reason})");
        };
        let finish_reason = first
            .get("finishReason")
            .and_then(Value::as_str)
            .map(str::to_string);
        let text = first
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect::<Vec<&str>>()
                    .join("")
            })
            .unwrap_or_default();
        Ok((text, finish_reason))
    }
}

impl GenerativeService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let endpoint = self.endpoint_for_model(&request.model);
        info!(
            model = %request.model,
            parts = request.parts.len(),
            schema = request.response_schema.is_some(),
            "issuing generateContent call"
        );
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_payload(request))
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let payload = response_json_or_error("Gemini", response)?;
        let (text, finish_reason) = Self::extract_text(&payload)?;
        Ok(GenerateContentResponse {
            text,
            model: request.model.clone(),
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use codeprompt_contracts::schema::remix_script_schema;
    use serde_json::json;

    use super::GeminiService;
    use crate::adapter::{ContentPart, GenerateContentRequest};

    #[test]
    fn payload_carries_parts_instruction_and_schema() {
        let request = GenerateContentRequest {
            model: "gemini-2.5-flash".to_string(),
            parts: vec![
                ContentPart::InlineData {
                    mime_type: "video/mp4".to_string(),
                    data: "AAAA".to_string(),
                },
                ContentPart::text("Goal: views"),
            ],
            system_instruction: Some("You are a remix director.".to_string()),
            temperature: Some(0.85),
            response_schema: Some(remix_script_schema()),
        };
        let payload = GeminiService::build_payload(&request);

        assert_eq!(payload["contents"][0]["role"], "user");
        assert_eq!(
            payload["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "video/mp4"
        );
        assert_eq!(payload["contents"][0]["parts"][1]["text"], "Goal: views");
        assert_eq!(
            payload["systemInstruction"]["parts"][0]["text"],
            "You are a remix director."
        );
        assert_eq!(payload["generationConfig"]["temperature"], json!(0.85));
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            payload["generationConfig"]["responseSchema"]["type"],
            "OBJECT"
        );
    }

    #[test]
    fn payload_omits_empty_generation_config() {
        let request = GenerateContentRequest {
            model: "m".to_string(),
            parts: vec![ContentPart::text("describe")],
            system_instruction: None,
            temperature: None,
            response_schema: None,
        };
        let payload = GeminiService::build_payload(&request);
        assert!(payload.get("generationConfig").is_none());
        assert!(payload.get("systemInstruction").is_none());
    }

    #[test]
    fn extracts_joined_candidate_text() -> anyhow::Result<()> {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello " }, { "text": "world" }] },
                "finishReason": "STOP"
            }]
        });
        let (text, finish) = GeminiService::extract_text(&payload)?;
        assert_eq!(text, "Hello world");
        assert_eq!(finish.as_deref(), Some("STOP"));
        Ok(())
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = GeminiService::extract_text(&payload)
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.contains("SAFETY"));
    }

    #[test]
    fn endpoint_accepts_prefixed_models() {
        let service = GeminiService::new("key", "https://example.test/v1beta/");
        assert_eq!(
            service.endpoint_for_model("models/gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            service.endpoint_for_model("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
