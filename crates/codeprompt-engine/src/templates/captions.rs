use codeprompt_contracts::catalog::platform_name;
use codeprompt_contracts::schema::captions_schema;

use super::{labels, require_text, PromptPlan};
use crate::error::GenerationError;

const TEMPERATURE: f64 = 0.8;

pub fn captions_prompt(
    video_idea: &str,
    platform: &str,
) -> Result<PromptPlan<'static>, GenerationError> {
    let idea = require_text(
        video_idea,
        labels::CAPTIONS,
        "describe the video idea before asking for captions",
    )?;
    let platform = platform_name(platform);
    let instruction = format!(
        "You are a world-class viral content strategist with deep knowledge of the algorithms and user behavior of **{platform}**.
Your job is to build a complete publishing package for a video based on this idea: \"{idea}\".

Reply with a JSON array of exactly 3 objects, each one caption variation tuned for **{platform}**.

Every object has:
- \"variation\" (integer): the variation number (1, 2 or 3).
- \"hook\" (string): a short, punchy opening line that grabs attention in the first 2 seconds, following {platform} best practice.
- \"body\" (string): the caption body, which opens a curiosity gap through storytelling to keep the viewer engaged.
- \"cta\" (string): a clear call to action for the kind of engagement the {platform} algorithm rewards most (comments, shares, saves).
- \"hashtags\" (string): one string with the 10 best hashtags for reach in the video's niche on {platform}, mixing long-tail and trending tags. Separate them with spaces and start each with '#'."
    );
    Ok(PromptPlan::new(labels::CAPTIONS)
        .instruction(instruction)
        .text(format!(
            "Write 3 caption variations for the video idea \"{idea}\", tuned for {platform}."
        ))
        .temperature(TEMPERATURE)
        .schema(captions_schema()))
}
