use anyhow::Result;

use super::{GenerateContentRequest, GenerateContentResponse, GenerativeService};

/// Offline stand-in used when no API key is configured.
///
/// Free-text calls echo the prompt. Schema calls return the schema's
/// placeholder instance, so every structured path still decodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryrunService;

impl GenerativeService for DryrunService {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let text = match request.response_schema.as_ref() {
            Some(schema) => serde_json::to_string_pretty(&schema.placeholder())?,
            None => format!(
                "[dryrun {}] {}",
                request.model,
                request.prompt_text().trim()
            ),
        };
        Ok(GenerateContentResponse {
            text,
            model: request.model.clone(),
            finish_reason: Some("DRYRUN".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use codeprompt_contracts::schema::captions_schema;

    use super::DryrunService;
    use crate::adapter::{
        decode_structured, ContentPart, GenerateContentRequest, GenerativeService, ParsePolicy,
        StructuredReply,
    };

    fn request(schema: bool) -> GenerateContentRequest {
        GenerateContentRequest {
            model: "gemini-2.5-flash".to_string(),
            parts: vec![ContentPart::text("Video idea: \"rainy rooftop\"")],
            system_instruction: None,
            temperature: Some(0.8),
            response_schema: schema.then(captions_schema),
        }
    }

    #[test]
    fn echoes_free_text() -> Result<()> {
        let reply = DryrunService.generate_content(&request(false))?;
        assert_eq!(
            reply.text,
            "[dryrun gemini-2.5-flash] Video idea: \"rainy rooftop\""
        );
        Ok(())
    }

    #[test]
    fn schema_reply_decodes_strictly() -> Result<()> {
        let reply = DryrunService.generate_content(&request(true))?;
        let decoded = decode_structured(&reply.text, &captions_schema(), ParsePolicy::Strict)?;
        let StructuredReply::Parsed(value) = decoded else {
            panic!("expected parsed reply");
        };
        assert_eq!(value.as_array().map(Vec::len), Some(3));
        Ok(())
    }
}
