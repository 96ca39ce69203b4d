use codeprompt_contracts::schema::remix_script_schema;

use super::{labels, PromptPlan};
use crate::error::GenerationError;
use crate::media::{MediaFile, MAX_REMIX_VIDEO_BYTES};

const TEMPERATURE: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemixGoal {
    #[default]
    Views,
    Interaction,
    Followers,
}

impl RemixGoal {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "views" => Some(Self::Views),
            "interaction" | "engagement" => Some(Self::Interaction),
            "followers" => Some(Self::Followers),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Interaction => "interaction",
            Self::Followers => "followers",
        }
    }

    fn strategy(self) -> &'static str {
        match self {
            Self::Views => "Optimize the script for MAXIMUM VIEWS. Open with an extremely fast hook, build a curiosity loop and end abruptly to invite replays.",
            Self::Interaction => "Optimize the script for MAXIMUM INTERACTION. Ask direct questions, stir constructive controversy and close with a clear call to comment.",
            Self::Followers => "Optimize the script to GAIN FOLLOWERS. Show off the influencer's unique personality, build an emotional connection and end with a strong call to follow.",
        }
    }
}

/// `influencer_sheet` may be blank for narration-only remixes.
pub fn remix_prompt<'a>(
    video: Option<&'a MediaFile>,
    influencer_sheet: &str,
    goal: RemixGoal,
) -> Result<PromptPlan<'a>, GenerationError> {
    let Some(video) = video else {
        return Err(GenerationError::invalid_input("upload the video to remix").labeled(labels::REMIX));
    };
    if !video.is_video() {
        return Err(GenerationError::invalid_input(format!(
            "'{}' is not a video file ({})",
            video.name, video.mime_type
        ))
        .labeled(labels::REMIX));
    }
    if video.size() > MAX_REMIX_VIDEO_BYTES {
        return Err(GenerationError::invalid_input(
            "the video must be at most 30 seconds long (about 30 MB)",
        )
        .labeled(labels::REMIX));
    }

    let instruction = format!(
        "You are a viral content director and remix specialist for TikTok and Instagram Reels. Study a reference video and write a remix script for a specific digital influencer.

You will receive:
1. The video to remix (up to 30 seconds).
2. The character sheet of the influencer doing the remix. If it is empty, the remix is voice-over only.
3. The main goal of the remix.

Your job:
- Go through the video frame by frame to understand its content, pacing and key moments.
- Write narration or dialogue for the influencer that is relevant, witty and true to their personality as the sheet defines it.
- Write clear instructions for HOW to build the remix (for example \"Layout: side by side\", \"Reaction: point at the object on screen at 5 seconds\", \"Use the green screen effect with the original video behind\").
- {}

Reply with a JSON object shaped as {{ \"narration_script\": \"...\", \"remix_instructions\": \"...\" }}. Add no explanation or extra text.",
        goal.strategy()
    );
    Ok(PromptPlan::new(labels::REMIX)
        .instruction(instruction)
        .media(video)
        .text(format!(
            "Influencer character sheet:\n{}\n\nRemix goal: {}",
            influencer_sheet.trim(),
            goal.as_str()
        ))
        .temperature(TEMPERATURE)
        .schema(remix_script_schema()))
}
