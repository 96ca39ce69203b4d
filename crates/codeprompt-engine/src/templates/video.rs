use std::sync::OnceLock;

use codeprompt_contracts::catalog::{dialogue_language_name, TargetSpec, NO_DIALOGUE, SEGMENT_SECONDS};
use codeprompt_contracts::results::VideoOutputFormat;
use codeprompt_contracts::schema::video_segments_schema;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::{labels, require_image, require_text, PromptPlan};
use crate::adapter::ParsePolicy;
use crate::error::GenerationError;
use crate::media::MediaFile;

const TEMPERATURE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoType {
    #[default]
    Normal,
    Commercial,
}

impl VideoType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "commercial" | "ad" => Some(Self::Commercial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoOptions {
    /// Seconds, a multiple of [`SEGMENT_SECONDS`].
    pub duration: u32,
    pub format: VideoOutputFormat,
    pub dialogue_language: String,
    /// Character sheet of a recurring influencer. Blank means none.
    pub influencer_sheet: String,
    pub background: Option<MediaFile>,
    pub logo: Option<MediaFile>,
    pub video_type: VideoType,
    pub on_screen_text: bool,
    /// Previously generated segments when continuing a story.
    pub existing: Option<String>,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            duration: SEGMENT_SECONDS,
            format: VideoOutputFormat::Plain,
            dialogue_language: NO_DIALOGUE.to_string(),
            influencer_sheet: String::new(),
            background: None,
            logo: None,
            video_type: VideoType::Normal,
            on_screen_text: false,
            existing: None,
        }
    }
}

impl VideoOptions {
    fn continuation(&self) -> Option<&str> {
        self.existing
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPlanShape {
    /// One cinematic prompt for a single 8-second clip.
    Single,
    Segmented { count: u32, first_segment: u32 },
}

impl VideoPlanShape {
    pub fn for_request(target: &TargetSpec, options: &VideoOptions) -> Self {
        let continuation = options.continuation();
        if target.multi_segment && (options.duration > SEGMENT_SECONDS || continuation.is_some()) {
            return Self::Segmented {
                count: segment_count(options.duration),
                first_segment: continuation.map(next_segment_number).unwrap_or(1),
            };
        }
        Self::Single
    }

    pub fn is_structured(self, format: VideoOutputFormat) -> bool {
        matches!(self, Self::Segmented { .. }) && format == VideoOutputFormat::Structured
    }
}

pub fn segment_count(duration: u32) -> u32 {
    duration / SEGMENT_SECONDS
}

fn segment_marker() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(\d+)\.").ok()).as_ref()
}

/// Number the first new segment gets when continuing `existing`.
pub fn next_segment_number(existing: &str) -> u32 {
    if let Ok(Value::Array(rows)) = serde_json::from_str::<Value>(existing.trim()) {
        let highest = rows
            .iter()
            .filter_map(|row| row.get("segment").and_then(Value::as_u64))
            .max();
        if let Some(highest) = highest {
            return u32::try_from(highest).unwrap_or(u32::MAX - 1) + 1;
        }
    }
    segment_marker()
        .and_then(|marker| marker.captures_iter(existing).last())
        .and_then(|captures| captures.get(1))
        .and_then(|number| number.as_str().parse::<u32>().ok())
        .map(|last| last.saturating_add(1))
        .unwrap_or(1)
}

pub fn video_prompt<'a>(
    idea: &str,
    target: &TargetSpec,
    options: &'a VideoOptions,
) -> Result<PromptPlan<'a>, GenerationError> {
    let idea = require_text(idea, labels::VIDEO, "describe the video idea")?;
    if options.duration == 0 || options.duration % SEGMENT_SECONDS != 0 {
        return Err(GenerationError::invalid_input(format!(
            "duration must be a positive multiple of {SEGMENT_SECONDS} seconds (got {})",
            options.duration
        ))
        .labeled(labels::VIDEO));
    }
    if options.continuation().is_some() && !target.multi_segment {
        return Err(GenerationError::invalid_input(format!(
            "'{}' cannot continue a story; pick a multi-segment target",
            target.name
        ))
        .labeled(labels::VIDEO));
    }
    if let Some(background) = options.background.as_ref() {
        require_image(background, labels::VIDEO)?;
    }
    let logo = match options.video_type {
        VideoType::Commercial => options.logo.as_ref(),
        VideoType::Normal => None,
    };
    if let Some(logo) = logo {
        require_image(logo, labels::VIDEO)?;
    }

    let briefing = Briefing::new(options, logo.is_some());
    let shape = VideoPlanShape::for_request(target, options);
    let instruction = match (shape, options.continuation()) {
        (VideoPlanShape::Segmented { count, first_segment }, Some(existing)) => {
            continuation_instruction(idea, existing, count, first_segment, options.format, &briefing)
        }
        (VideoPlanShape::Segmented { count, .. }, None) => segmented_instruction(
            idea,
            &target.name,
            options.duration,
            count,
            options.format,
            &briefing,
        ),
        (VideoPlanShape::Single, _) => {
            if options.duration > SEGMENT_SECONDS {
                warn!(
                    target_name = %target.name,
                    duration = options.duration,
                    "target has no multi-segment support; writing one single-clip prompt"
                );
            }
            single_instruction(idea, &target.name, &briefing)
        }
    };

    let mut plan = PromptPlan::new(labels::VIDEO)
        .instruction(instruction)
        .text(format!("User idea: \"{idea}\""))
        .temperature(TEMPERATURE);
    if let Some(background) = options.background.as_ref() {
        plan = plan.media(background);
    }
    if let Some(logo) = logo {
        plan = plan.media(logo);
    }
    if shape.is_structured(options.format) {
        plan = plan.schema(video_segments_schema());
        plan.parse_policy = ParsePolicy::PassThroughRaw;
    }
    Ok(plan)
}

struct Briefing {
    influencer: String,
    language: String,
    background: &'static str,
    commercial: &'static str,
    on_screen_text: &'static str,
}

impl Briefing {
    fn new(options: &VideoOptions, has_logo: bool) -> Self {
        let sheet = options.influencer_sheet.trim();
        let influencer = if sheet.is_empty() {
            "The main character can be invented freely from the scene idea.".to_string()
        } else {
            format!(
                "The main character is a specific digital influencer defined by this character sheet:\n---\n{sheet}\n---\nKeep the character description in the final prompt consistent with the sheet."
            )
        };

        let language_id = options.dialogue_language.trim();
        let language = if language_id.is_empty() || language_id == NO_DIALOGUE {
            "The scene is purely visual, with no dialogue or narration.".to_string()
        } else {
            let name = dialogue_language_name(language_id);
            format!(
                "The scene includes dialogue or narration in **{name}**. Work the spoken lines into the prompt clearly, for example: '...while a narrator says in {name}: \"[line here]\"'."
            )
        };

        let background = if options.background.is_some() {
            "The attached background image is the main reference for the setting. Study it and build the scene's environment on its atmosphere, style, lighting and elements."
        } else {
            "The setting can be invented freely from the scene idea."
        };

        let commercial = match (options.video_type, has_logo) {
            (VideoType::Commercial, true) => {
                "**COMMERCIAL BRIEF:** this is an advertisement. The attached logo must appear prominently and faithfully. Study it closely (exact colors, shapes, typography) and describe it in the prompt so it shows up naturally but clearly in the scene, for example on a billboard, a product or a T-shirt."
            }
            (VideoType::Commercial, false) => {
                "**COMMERCIAL BRIEF:** this is an advertisement. Keep the tone professional and focused on showing off the product or service implied by the idea."
            }
            (VideoType::Normal, _) => "",
        };

        let on_screen_text = if options.on_screen_text {
            "Also suggest short, punchy on-screen text that complements the narration or action, as is common in social videos."
        } else {
            "The video must be purely visual, with no on-screen text at all."
        };

        Self {
            influencer,
            language,
            background,
            commercial,
            on_screen_text,
        }
    }

    fn block(&self) -> String {
        [
            self.influencer.as_str(),
            self.language.as_str(),
            self.background,
            self.commercial,
            self.on_screen_text,
        ]
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
    }
}

fn format_instruction(format: VideoOutputFormat) -> &'static str {
    match format {
        VideoOutputFormat::Structured => {
            "The result MUST be a valid JSON array. Each object in the array is one 8-second segment with the keys \"segment\" (integer) and \"prompt\" (string)."
        }
        VideoOutputFormat::Plain => {
            "The result MUST be a numbered list where each item is the prompt for one 8-second segment."
        }
    }
}

fn continuation_instruction(
    idea: &str,
    existing: &str,
    count: u32,
    first_segment: u32,
    format: VideoOutputFormat,
    briefing: &Briefing,
) -> String {
    format!(
        "You are a continuity supervisor and lead screenwriter. Continue a story from the prompts that already exist.
**Original idea:** \"{idea}\"
**Existing prompts:**
{existing}
---
**Your job:** write the next {count} segments of 8 seconds each, numbering them from {first_segment}. Keep the character, tone and narrative consistent. The cut from the last existing prompt into your first new one must be seamless.
{}
{}
Add no explanation or extra text, only the new segments.",
        briefing.block(),
        format_instruction(format)
    )
}

fn segmented_instruction(
    idea: &str,
    model: &str,
    duration: u32,
    count: u32,
    format: VideoOutputFormat,
    briefing: &Briefing,
) -> String {
    format!(
        "You are an elite multilingual screenwriter and film director who specializes in video generation models. Write a sequence of prompts for \"{model}\" that together produce a {duration}-second video.
The user's scene idea is: \"{idea}\".
{}
Split the scene into {count} segments of 8 seconds each. Every prompt picks up where the previous one ended, so the scene flows continuously.
For each segment, describe vividly the action, camera movement, lighting, style, the character (consistent with the sheet) and the dialogue or narration when there is any, so each transition feels natural.
{}
Add no explanation or extra text, only the result in the requested format.",
        briefing.block(),
        format_instruction(format)
    )
}

fn single_instruction(idea: &str, model: &str, briefing: &Briefing) -> String {
    format!(
        "You are an elite film director and prompt engineer for video models such as Google VEO, Sora and Runway. Turn the user's simple idea into a rich, detailed cinematic prompt tuned for \"{model}\".
The scene idea is: \"{idea}\".
{}
The prompt is a vivid, evocative description. Cover:
1. **Scene and subject:** the environment (from the reference image, if any) and the main character (consistent with the sheet, if any).
2. **Action and dialogue:** what happens and what is said, when applicable.
3. **Cinematography:** shot type, angle and camera movement.
4. **Lighting:** the quality of the light.
5. **Visual style and mood.**
6. **Duration and parameters:** for Google VEO or Flow VEO, state that the clip runs 8 seconds. Adapt the syntax for other models.
Reply with the prompt only, ready to use, with no extra explanation.",
        briefing.block()
    )
}
