use std::fmt;

const MAX_ERROR_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// A required input was missing or blank. No call was issued.
    InvalidInput,
    /// The transport or the service failed.
    Downstream,
    /// A structured reply did not parse or did not match its schema.
    ResponseShape,
}

impl GenerationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Downstream => "downstream",
            Self::ResponseShape => "response_shape",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::InvalidInput, message)
    }

    pub fn downstream(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Downstream, message)
    }

    pub fn response_shape(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::ResponseShape, message)
    }

    /// Flattens the whole cause chain into one line.
    pub fn from_anyhow(kind: GenerationErrorKind, err: &anyhow::Error) -> Self {
        Self::new(kind, error_chain_text(err, MAX_ERROR_CHARS))
    }

    /// Prefixes the message with the label of the feature that failed.
    pub fn labeled(mut self, label: &str) -> Self {
        if !label.is_empty() && !self.message.starts_with(label) {
            self.message = format!("{label}: {}", self.message);
        }
        self
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GenerationError {}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() || parts.last().map(String::as_str) == Some(trimmed) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{error_chain_text, truncate_text, GenerationError, GenerationErrorKind};

    #[test]
    fn chain_text_keeps_every_context() {
        let err = anyhow!("connection reset")
            .context("Gemini request failed")
            .context("generate content");
        assert_eq!(
            error_chain_text(&err, 200),
            "generate content | caused by: Gemini request failed | caused by: connection reset"
        );
    }

    #[test]
    fn labeled_prefixes_once() {
        let err = GenerationError::downstream("quota exceeded")
            .labeled("Failed to generate text prompt")
            .labeled("Failed to generate text prompt");
        assert_eq!(err.to_string(), "Failed to generate text prompt: quota exceeded");
        assert_eq!(err.kind, GenerationErrorKind::Downstream);
    }

    #[test]
    fn truncation_marks_cut() {
        assert_eq!(truncate_text("abcdef", 3), "abc…");
        assert_eq!(truncate_text("abc", 3), "abc");
    }
}
