use codeprompt_contracts::catalog::TargetSpec;

use super::{labels, require_image, require_text, PromptPlan};
use crate::error::GenerationError;
use crate::media::MediaFile;

const EDIT_TEMPERATURE: f64 = 0.7;

/// Describes an uploaded image, or expands a bare idea when no image is given.
pub fn image_prompt<'a>(
    image: Option<&'a MediaFile>,
    instruction: &str,
    target: &TargetSpec,
) -> Result<PromptPlan<'a>, GenerationError> {
    let model = &target.name;
    let Some(image) = image else {
        let idea = require_text(
            instruction,
            labels::IMAGE,
            "describe the image you want when no image is uploaded",
        )?;
        let text = format!(
            "You are a prompt engineer for image generation models such as Midjourney, DALL-E and Stable Diffusion.
Write a visually rich, detailed prompt for \"{model}\" based only on this idea from the user: \"{idea}\".

Tune the prompt for \"{model}\" and describe vividly:
- **Subject:** what should appear in the image.
- **Style:** the artistic treatment (photorealistic, 3D, illustration).
- **Setting and lighting:** the details of the scene.
- **Parameters:** model-specific syntax, if any.

Reply with the final prompt only, ready to copy and paste."
        );
        return Ok(PromptPlan::new(labels::IMAGE).text(text));
    };

    require_image(image, labels::IMAGE)?;
    let modification = match instruction.trim() {
        "" => "The goal is a prompt that recreates a similar image.".to_string(),
        extra => format!(
            "**Required change:** besides describing the image, the final prompt MUST work in this instruction from the user: \"{extra}\". The result is the description of the image merged with that change."
        ),
    };
    let text = format!(
        "Study this image in close detail and write a powerful descriptive prompt for the image generator \"{model}\".
{modification}

The final prompt is a single string of text that uses the syntax and keywords that work best on \"{model}\". In the format that model prefers, describe:
- **Main subject:** who or what is in the image.
- **Composition and angle:** how elements are placed and where the camera sits.
- **Art style:** for example photorealistic, oil painting, anime, digital art, watercolor.
- **Lighting:** for example soft daylight, cinematic lighting, neon, golden hour.
- **Color palette:** dominant colors and mood.
- **Specific details:** textures, reflections, emotions.
- **Parameters:** \"{model}\" switches where relevant (for example --ar 16:9 or --v 6.0 on Midjourney).

Reply with the prompt only, with no explanation around it."
    );
    Ok(PromptPlan::new(labels::IMAGE).media(image).text(text))
}

pub fn image_edit_prompt<'a>(
    image: Option<&'a MediaFile>,
    instruction: &str,
    target: &TargetSpec,
) -> Result<PromptPlan<'a>, GenerationError> {
    let Some(image) = image else {
        return Err(
            GenerationError::invalid_input("upload the image to edit").labeled(labels::IMAGE_EDIT)
        );
    };
    let instruction = require_text(
        instruction,
        labels::IMAGE_EDIT,
        "describe the change to make to the image",
    )?;
    require_image(image, labels::IMAGE_EDIT)?;
    let model = &target.name;
    let system = format!(
        "You are a prompt engineer for image editing models (inpainting and outpainting) such as Adobe Firefly and Playground AI.
Look at the base image and the user's short instruction, then write one detailed, tool-agnostic text prompt that another model can follow to perform the edit. It will be pasted into \"{model}\".
First describe the essentials of the original image (subject, style, lighting), then state the requested change plainly.
Example output: \"photo of a man wearing yellow glasses, studio lighting, add a black pirate hat on his head\".
Reply with the text prompt only, with no explanation."
    );
    Ok(PromptPlan::new(labels::IMAGE_EDIT)
        .instruction(system)
        .media(image)
        .text(format!("User instruction: \"{instruction}\""))
        .temperature(EDIT_TEMPERATURE))
}

#[cfg(test)]
mod tests {
    use codeprompt_contracts::catalog::{TargetCatalog, TargetKind, TargetSpec};

    use super::{image_edit_prompt, image_prompt};
    use crate::error::GenerationErrorKind;
    use crate::media::MediaFile;
    use crate::templates::PlanPart;

    fn target(id: &str, kind: TargetKind) -> TargetSpec {
        match TargetCatalog::default().ensure(id, kind) {
            Some(target) => target,
            None => panic!("missing target {id}"),
        }
    }

    fn photo() -> MediaFile {
        MediaFile::new("photo.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff])
    }

    #[test]
    fn uploaded_image_goes_before_instruction() -> anyhow::Result<()> {
        let photo = photo();
        let plan = image_prompt(Some(&photo), "make it night time", &target("midjourney", TargetKind::Image))?;
        assert!(matches!(plan.parts[0], PlanPart::Media(_)));
        let text = plan.full_text();
        assert!(text.contains("make it night time"));
        assert!(text.contains("\"Midjourney\""));
        assert!(plan.temperature.is_none());
        assert!(plan.system_instruction.is_none());
        Ok(())
    }

    #[test]
    fn uploaded_image_without_instruction_recreates() -> anyhow::Result<()> {
        let photo = photo();
        let plan = image_prompt(Some(&photo), "  ", &target("geral-imagem", TargetKind::Image))?;
        assert!(plan.full_text().contains("recreates a similar image"));
        Ok(())
    }

    #[test]
    fn description_mode_has_no_media() -> anyhow::Result<()> {
        let plan = image_prompt(None, "a fox in the snow", &target("dall-e-3", TargetKind::Image))?;
        assert_eq!(plan.media_count(), 0);
        assert!(plan.full_text().contains("\"a fox in the snow\""));
        Ok(())
    }

    #[test]
    fn no_image_and_no_instruction_is_invalid() {
        let err = image_prompt(None, "", &target("dall-e-3", TargetKind::Image)).err();
        assert_eq!(err.map(|err| err.kind), Some(GenerationErrorKind::InvalidInput));
    }

    #[test]
    fn non_image_upload_is_invalid() {
        let clip = MediaFile::new("clip.mp4", "video/mp4", vec![0]);
        let err = image_prompt(Some(&clip), "", &target("dall-e-3", TargetKind::Image)).err();
        assert!(err
            .map(|err| err.message.contains("not an image"))
            .unwrap_or(false));
    }

    #[test]
    fn edit_requires_image_and_instruction() -> anyhow::Result<()> {
        let edit_target = target("adobe-firefly", TargetKind::ImageEdit);
        let photo = photo();
        assert!(image_edit_prompt(None, "add a hat", &edit_target).is_err());
        let empty = image_edit_prompt(Some(&photo), "   ", &edit_target).err();
        assert_eq!(empty.map(|err| err.kind), Some(GenerationErrorKind::InvalidInput));

        let plan = image_edit_prompt(Some(&photo), "add a hat", &edit_target)?;
        assert_eq!(plan.temperature, Some(0.7));
        assert!(plan.full_text().contains("User instruction: \"add a hat\""));
        Ok(())
    }
}
