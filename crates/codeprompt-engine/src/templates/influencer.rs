use super::{labels, require_image, PromptPlan};
use crate::error::GenerationError;
use crate::media::MediaFile;

const TEMPERATURE: f64 = 0.7;

/// Description used when a sheet is built from a reference image alone.
pub const SHEET_FROM_IMAGE_DESCRIPTION: &str =
    "Build a detailed character sheet from the image of this character.";

const INSTRUCTION: &str = "You are an elite character designer for generative AI. Write an extremely detailed, reusable character sheet. The output is one dense paragraph of comma-separated keywords and short phrases, strong enough to keep the character consistent across different scenes and prompts.

The sheet fixes, immutably:
- **Face and expression:** facial structure, eye shape and color, nose, mouth, resting expression.
- **Hair:** color, style, length and texture.
- **Body:** build and approximate height.
- **Wardrobe:** the signature outfit (for example cyberpunk with neon jackets, minimalist streetwear, elven fantasy).
- **Unique markings:** tattoos, scars, recurring accessories (glasses, piercings, necklaces).

When an image is provided, reading it takes top priority. With text only, work from the text. The result is a masterpiece of concise, information-dense writing, ready to copy and paste. Add no explanation, only the character sheet.";

pub fn character_sheet_prompt<'a>(
    description: &str,
    image: Option<&'a MediaFile>,
) -> Result<PromptPlan<'a>, GenerationError> {
    let description = match (description.trim(), image) {
        ("", None) => {
            return Err(GenerationError::invalid_input(
                "describe the influencer or upload a reference image",
            )
            .labeled(labels::CHARACTER_SHEET))
        }
        ("", Some(_)) => SHEET_FROM_IMAGE_DESCRIPTION,
        (text, _) => text,
    };
    let mut plan = PromptPlan::new(labels::CHARACTER_SHEET)
        .instruction(INSTRUCTION.to_string())
        .text(format!("User instruction: \"{description}\""))
        .temperature(TEMPERATURE);
    if let Some(image) = image {
        require_image(image, labels::CHARACTER_SHEET)?;
        plan = plan.media(image);
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::{character_sheet_prompt, SHEET_FROM_IMAGE_DESCRIPTION};
    use crate::media::MediaFile;
    use crate::templates::PlanPart;

    #[test]
    fn text_only_sheet() -> anyhow::Result<()> {
        let plan = character_sheet_prompt("retro gamer, 30s, green mohawk", None)?;
        assert_eq!(plan.media_count(), 0);
        assert!(plan.full_text().contains("green mohawk"));
        assert!(plan.full_text().contains("Unique markings"));
        assert_eq!(plan.temperature, Some(0.7));
        Ok(())
    }

    #[test]
    fn image_is_attached_after_description() -> anyhow::Result<()> {
        let portrait = MediaFile::new("me.png", "image/png", vec![9]);
        let plan = character_sheet_prompt("", Some(&portrait))?;
        assert!(matches!(plan.parts[0], PlanPart::Text(_)));
        assert!(matches!(plan.parts[1], PlanPart::Media(_)));
        assert!(plan.full_text().contains(SHEET_FROM_IMAGE_DESCRIPTION));
        Ok(())
    }

    #[test]
    fn nothing_to_work_from_is_invalid() {
        assert!(character_sheet_prompt("  ", None).is_err());
    }
}
