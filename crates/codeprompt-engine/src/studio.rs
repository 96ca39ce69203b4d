use std::sync::Arc;

use codeprompt_contracts::catalog::TargetSpec;
use codeprompt_contracts::results::{
    ActionPlan, CaptionVariation, GenerationResult, ProfileAnalysis, RemixScript,
    VideoOutputFormat,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::{decode_structured, GenerativeService, ParsePolicy, StructuredReply};
use crate::error::{GenerationError, GenerationErrorKind};
use crate::media::MediaFile;
use crate::templates::{self, ProfileAnalysisInput, PromptPlan, RemixGoal, VideoOptions};

/// Runs each feature end to end: template, one call, one decode.
#[derive(Clone)]
pub struct ContentStudio {
    service: Arc<dyn GenerativeService>,
    model: String,
}

impl ContentStudio {
    pub fn new(service: Arc<dyn GenerativeService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn text_prompt(&self, topic: &str, target: &TargetSpec) -> Result<String, GenerationError> {
        self.call_text(templates::text_prompt(topic, target)?)
    }

    pub fn image_prompt(
        &self,
        image: Option<&MediaFile>,
        instruction: &str,
        target: &TargetSpec,
    ) -> Result<String, GenerationError> {
        self.call_text(templates::image_prompt(image, instruction, target)?)
    }

    pub fn image_edit_prompt(
        &self,
        image: Option<&MediaFile>,
        instruction: &str,
        target: &TargetSpec,
    ) -> Result<String, GenerationError> {
        self.call_text(templates::image_edit_prompt(image, instruction, target)?)
    }

    pub fn video_prompt(
        &self,
        idea: &str,
        target: &TargetSpec,
        options: &VideoOptions,
    ) -> Result<GenerationResult, GenerationError> {
        let plan = templates::video_prompt(idea, target, options)?;
        let Some(schema) = plan.schema.clone() else {
            let text = self.call_text(plan)?;
            return Ok(GenerationResult::Video {
                text,
                format: VideoOutputFormat::Plain,
            });
        };
        let (label, policy) = (plan.label, plan.parse_policy);
        let raw = self.call_raw(plan)?;
        match decode_structured(&raw, &schema, policy).map_err(|err| err.labeled(label))? {
            StructuredReply::Parsed(value) => Ok(GenerationResult::Video {
                text: pretty_json(&value),
                format: VideoOutputFormat::Structured,
            }),
            StructuredReply::Raw(text) => Ok(GenerationResult::Video {
                text,
                format: VideoOutputFormat::Plain,
            }),
        }
    }

    pub fn character_sheet(
        &self,
        description: &str,
        image: Option<&MediaFile>,
    ) -> Result<String, GenerationError> {
        self.call_text(templates::character_sheet_prompt(description, image)?)
    }

    pub fn remix_script(
        &self,
        video: Option<&MediaFile>,
        influencer_sheet: &str,
        goal: RemixGoal,
    ) -> Result<RemixScript, GenerationError> {
        self.call_structured(templates::remix_prompt(video, influencer_sheet, goal)?)
    }

    pub fn profile_analysis(
        &self,
        input: ProfileAnalysisInput<'_>,
    ) -> Result<ProfileAnalysis, GenerationError> {
        self.call_structured(templates::profile_analysis_prompt(input)?)
    }

    pub fn action_plan(
        &self,
        analysis: &ProfileAnalysis,
        goal: &str,
        platform: &str,
    ) -> Result<ActionPlan, GenerationError> {
        self.call_structured(templates::action_plan_prompt(analysis, goal, platform))
    }

    pub fn captions(
        &self,
        video_idea: &str,
        platform: &str,
    ) -> Result<Vec<CaptionVariation>, GenerationError> {
        let mut variations: Vec<CaptionVariation> =
            self.call_structured(templates::captions_prompt(video_idea, platform)?)?;
        for variation in &mut variations {
            variation.normalize_hashtags();
        }
        Ok(variations)
    }

    fn call_raw(&self, plan: PromptPlan<'_>) -> Result<String, GenerationError> {
        let label = plan.label;
        let request = plan.into_request(&self.model);
        debug!(
            service = self.service.name(),
            feature = label,
            media = request.media_count(),
            "generation request built"
        );
        self.service
            .generate_content(&request)
            .map(|response| response.text)
            .map_err(|err| {
                GenerationError::from_anyhow(GenerationErrorKind::Downstream, &err).labeled(label)
            })
    }

    fn call_text(&self, plan: PromptPlan<'_>) -> Result<String, GenerationError> {
        Ok(self.call_raw(plan)?.trim().to_string())
    }

    fn call_structured<T: DeserializeOwned>(
        &self,
        plan: PromptPlan<'_>,
    ) -> Result<T, GenerationError> {
        let label = plan.label;
        let Some(schema) = plan.schema.clone() else {
            return Err(
                GenerationError::response_shape("no output schema declared").labeled(label)
            );
        };
        let raw = self.call_raw(plan)?;
        match decode_structured(&raw, &schema, ParsePolicy::Strict).map_err(|err| err.labeled(label))? {
            StructuredReply::Parsed(value) => serde_json::from_value(value).map_err(|err| {
                GenerationError::response_shape(format!("reply could not be read ({err})"))
                    .labeled(label)
            }),
            StructuredReply::Raw(_) => Err(GenerationError::response_shape(
                "reply was not structured",
            )
            .labeled(label)),
        }
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Appends newly generated segments to an existing story.
///
/// Structured stories are merged as arrays and re-serialized. If either side
/// is not a JSON array the two are joined as plain text.
pub fn merge_story(existing: &str, addition: &str, format: VideoOutputFormat) -> String {
    if format == VideoOutputFormat::Structured {
        let parsed = (
            serde_json::from_str::<Value>(existing.trim()),
            serde_json::from_str::<Value>(addition.trim()),
        );
        if let (Ok(Value::Array(mut head)), Ok(Value::Array(tail))) = parsed {
            head.extend(tail);
            return pretty_json(&Value::Array(head));
        }
        warn!("structured story merge fell back to a plain-text join");
    }
    format!("{existing}\n{addition}")
}
