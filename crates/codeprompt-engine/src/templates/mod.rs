//! Pure prompt construction, one function per feature.
//!
//! Nothing here performs IO. Each builder validates its inputs and returns a
//! [`PromptPlan`] naming the instruction, the ordered parts, the sampling
//! temperature and, for structured features, the output schema plus the
//! policy to apply when the reply fails to decode.

mod analysis;
mod captions;
mod image;
mod influencer;
mod remix;
mod text;
mod video;

use codeprompt_contracts::schema::ResponseSchema;

use crate::adapter::{ContentPart, GenerateContentRequest, ParsePolicy};
use crate::error::GenerationError;
use crate::media::MediaFile;

pub use analysis::{action_plan_prompt, profile_analysis_prompt, ProfileAnalysisInput};
pub use captions::captions_prompt;
pub use image::{image_edit_prompt, image_prompt};
pub use influencer::{character_sheet_prompt, SHEET_FROM_IMAGE_DESCRIPTION};
pub use remix::{remix_prompt, RemixGoal};
pub use text::text_prompt;
pub use video::{
    next_segment_number, segment_count, video_prompt, VideoOptions, VideoPlanShape, VideoType,
};

pub mod labels {
    pub const TEXT: &str = "Failed to generate prompt";
    pub const IMAGE: &str = "Failed to generate image prompt";
    pub const IMAGE_EDIT: &str = "Failed to generate edit prompt";
    pub const VIDEO: &str = "Failed to generate video prompt";
    pub const CAPTIONS: &str = "Could not generate captions";
    pub const CHARACTER_SHEET: &str = "Could not generate the influencer character sheet";
    pub const REMIX: &str = "Could not generate the remix script";
    pub const ANALYSIS: &str = "Could not generate the strategic analysis";
    pub const ACTION_PLAN: &str = "Could not generate the action plan";
}

#[derive(Debug, Clone)]
pub enum PlanPart<'a> {
    Text(String),
    Media(&'a MediaFile),
}

#[derive(Debug, Clone)]
pub struct PromptPlan<'a> {
    pub label: &'static str,
    pub system_instruction: Option<String>,
    pub parts: Vec<PlanPart<'a>>,
    pub temperature: Option<f64>,
    pub schema: Option<ResponseSchema>,
    pub parse_policy: ParsePolicy,
}

impl<'a> PromptPlan<'a> {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            system_instruction: None,
            parts: Vec::new(),
            temperature: None,
            schema: None,
            parse_policy: ParsePolicy::Strict,
        }
    }

    pub(crate) fn instruction(mut self, text: String) -> Self {
        self.system_instruction = Some(text);
        self
    }

    pub(crate) fn text(mut self, text: String) -> Self {
        self.parts.push(PlanPart::Text(text));
        self
    }

    pub(crate) fn media(mut self, file: &'a MediaFile) -> Self {
        self.parts.push(PlanPart::Media(file));
        self
    }

    pub(crate) fn temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
        self
    }

    pub(crate) fn schema(mut self, schema: ResponseSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The instruction and every text part, for inspection and logging.
    pub fn full_text(&self) -> String {
        let mut out = self.system_instruction.clone().unwrap_or_default();
        for part in &self.parts {
            if let PlanPart::Text(text) = part {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    pub fn media_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, PlanPart::Media(_)))
            .count()
    }

    pub fn into_request(self, model: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            model: model.to_string(),
            parts: self
                .parts
                .into_iter()
                .map(|part| match part {
                    PlanPart::Text(text) => ContentPart::Text(text),
                    PlanPart::Media(file) => ContentPart::media(file),
                })
                .collect(),
            system_instruction: self.system_instruction,
            temperature: self.temperature,
            response_schema: self.schema,
        }
    }
}

pub(crate) fn require_text<'t>(
    value: &'t str,
    label: &str,
    message: &str,
) -> Result<&'t str, GenerationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::invalid_input(message).labeled(label));
    }
    Ok(trimmed)
}

pub(crate) fn require_image(
    file: &MediaFile,
    label: &str,
) -> Result<(), GenerationError> {
    if !file.is_image() {
        return Err(GenerationError::invalid_input(format!(
            "'{}' is not an image ({})",
            file.name, file.mime_type
        ))
        .labeled(label));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{labels, require_text, PlanPart, PromptPlan};
    use crate::adapter::ContentPart;
    use crate::media::MediaFile;

    #[test]
    fn request_keeps_part_order() {
        let logo = MediaFile::new("logo.png", "image/png", vec![1, 2, 3]);
        let plan = PromptPlan::new(labels::VIDEO)
            .instruction("be cinematic".to_string())
            .text("idea".to_string())
            .media(&logo)
            .temperature(0.9);
        assert_eq!(plan.media_count(), 1);
        assert!(matches!(plan.parts[0], PlanPart::Text(_)));

        let request = plan.into_request("gemini-2.5-flash");
        assert_eq!(request.parts[0], ContentPart::text("idea"));
        assert_eq!(
            request.parts[1],
            ContentPart::InlineData {
                mime_type: "image/png".to_string(),
                data: "AQID".to_string(),
            }
        );
        assert_eq!(request.temperature, Some(0.9));
    }

    #[test]
    fn blank_text_is_rejected_with_label() {
        let err = require_text("   ", labels::TEXT, "enter a topic").err();
        assert_eq!(
            err.map(|err| err.message).as_deref(),
            Some("Failed to generate prompt: enter a topic")
        );
    }
}
