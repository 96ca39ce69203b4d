use codeprompt_contracts::catalog::TargetSpec;

use super::{labels, require_text, PromptPlan};
use crate::error::GenerationError;

const TEMPERATURE: f64 = 0.8;

pub fn text_prompt(topic: &str, target: &TargetSpec) -> Result<PromptPlan<'static>, GenerationError> {
    let topic = require_text(topic, labels::TEXT, "enter a topic for the prompt")?;
    let model = &target.name;
    let instruction = format!(
        "You are a prompt engineer who specializes in generative AI. Write a detailed, effective prompt for a beginner to use with the AI \"{model}\".
The user gives you a short topic. Expand it into a rich, structured prompt that follows the conventions and syntax that work best on \"{model}\".
Where it applies to \"{model}\", the prompt must cover:
1. **Persona/Role:** the role the AI should take on.
2. **Task:** a clear statement of the job.
3. **Context:** the background the AI needs.
4. **Output format:** the shape of the expected answer.
5. **Tone and style:** the voice to write in.
6. **Model parameters:** any special switches \"{model}\" understands (for example --ar on Midjourney).

Reply with the finished prompt only, ready to copy and paste, with no explanation around it."
    );
    Ok(PromptPlan::new(labels::TEXT)
        .instruction(instruction)
        .text(format!("User topic: \"{topic}\""))
        .temperature(TEMPERATURE))
}

#[cfg(test)]
mod tests {
    use codeprompt_contracts::catalog::{TargetCatalog, TargetKind};

    use super::text_prompt;
    use crate::error::GenerationErrorKind;

    #[test]
    fn instruction_names_every_directive() -> anyhow::Result<()> {
        let catalog = TargetCatalog::default();
        let Some(target) = catalog.ensure("geral-texto", TargetKind::Text) else {
            panic!("default text target missing");
        };
        let plan = text_prompt("cafeteria logo", &target)?;
        let text = plan.full_text();
        for directive in ["Persona", "Task", "Context", "Output format"] {
            assert!(text.contains(directive), "missing {directive}");
        }
        assert!(text.contains("User topic: \"cafeteria logo\""));
        assert_eq!(plan.temperature, Some(0.8));
        assert!(plan.schema.is_none());
        Ok(())
    }

    #[test]
    fn whitespace_topic_is_invalid() {
        let catalog = TargetCatalog::default();
        let Some(target) = catalog.ensure("geral-texto", TargetKind::Text) else {
            panic!("default text target missing");
        };
        let err = text_prompt(" \n\t", &target).err();
        assert_eq!(err.map(|err| err.kind), Some(GenerationErrorKind::InvalidInput));
    }
}
