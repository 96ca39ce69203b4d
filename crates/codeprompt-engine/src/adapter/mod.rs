//! Outbound generative calls.
//!
//! A [`GenerateContentRequest`] is one role-tagged user turn: text parts and
//! inline media, an optional system instruction, an optional temperature and
//! an optional output schema. Implementations of [`GenerativeService`] turn it
//! into the service's reply text. Structured replies are decoded once with
//! [`decode_structured`].

mod dryrun;
mod gemini;
mod scripted;

use std::sync::Arc;

use anyhow::Result;
use codeprompt_contracts::schema::ResponseSchema;
use serde_json::Value;
use tracing::warn;

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::media::MediaFile;

pub use dryrun::DryrunService;
pub use gemini::{GeminiService, DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL};
pub use scripted::ScriptedService;

#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

impl ContentPart {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn media(file: &MediaFile) -> Self {
        Self::InlineData {
            mime_type: file.mime_type.clone(),
            data: file.base64_data(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::InlineData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateContentRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f64>,
    pub response_schema: Option<ResponseSchema>,
}

impl GenerateContentRequest {
    pub fn media_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, ContentPart::InlineData { .. }))
            .count()
    }

    /// All text parts joined with newlines.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<&str>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateContentResponse {
    pub text: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

pub trait GenerativeService: Send + Sync {
    fn name(&self) -> &str;
    fn generate_content(&self, request: &GenerateContentRequest)
        -> Result<GenerateContentResponse>;
}

/// Gemini when a key is configured, otherwise the offline dryrun service.
pub fn service_for(config: &GenerationConfig, force_dryrun: bool) -> Arc<dyn GenerativeService> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    match api_key {
        Some(key) if !force_dryrun => Arc::new(GeminiService::new(key, &config.api_base)),
        Some(_) => Arc::new(DryrunService),
        None => {
            warn!("GEMINI_API_KEY or GOOGLE_API_KEY not set; using the dryrun service");
            Arc::new(DryrunService)
        }
    }
}

/// What to do when a structured reply does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    #[default]
    Strict,
    PassThroughRaw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredReply {
    Parsed(Value),
    Raw(String),
}

/// One parse attempt and one validation pass against `schema`.
pub fn decode_structured(
    text: &str,
    schema: &ResponseSchema,
    policy: ParsePolicy,
) -> Result<StructuredReply, GenerationError> {
    let cleaned = strip_code_fence(text);
    let failure = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => match schema.validate(&value) {
            Ok(()) => return Ok(StructuredReply::Parsed(value)),
            Err(violation) => format!("reply does not match the expected shape ({violation})"),
        },
        Err(err) => format!("reply is not valid JSON ({err})"),
    };
    match policy {
        ParsePolicy::Strict => Err(GenerationError::response_shape(failure)),
        ParsePolicy::PassThroughRaw => {
            warn!(reason = %failure, "structured reply passed through as raw text");
            Ok(StructuredReply::Raw(text.trim().to_string()))
        }
    }
}

pub fn strip_code_fence(text: &str) -> String {
    let raw = text.trim();
    if !(raw.starts_with("```") && raw.ends_with("```")) || raw.len() < 6 {
        return raw.to_string();
    }
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < 2 {
        return raw.to_string();
    }
    lines[1..lines.len() - 1].join("\n").trim().to_string()
}
