use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSegment {
    pub segment: u32,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionVariation {
    pub variation: u32,
    pub hook: String,
    pub body: String,
    pub cta: String,
    pub hashtags: String,
}

impl CaptionVariation {
    pub fn hashtag_tokens(&self) -> Vec<&str> {
        self.hashtags.split_whitespace().collect()
    }

    /// Collapses whitespace and prefixes every hashtag token with `#`.
    pub fn normalize_hashtags(&mut self) {
        self.hashtags = self
            .hashtags
            .split(|ch: char| ch.is_whitespace() || ch == ',')
            .map(|token| token.trim_start_matches('#'))
            .filter(|token| !token.is_empty())
            .map(|token| format!("#{token}"))
            .collect::<Vec<String>>()
            .join(" ");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemixScript {
    pub narration_script: String,
    pub remix_instructions: String,
}

/// Stage-one diagnosis of a social profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAnalysis {
    pub evidence_quote: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStep {
    pub step: u32,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViralContentSuggestion {
    pub idea: String,
    pub format: String,
    pub suggested_script: String,
}

/// Stage-two plan built on top of a [`ProfileAnalysis`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action_plan: Vec<ActionStep>,
    pub viral_content_suggestion: ViralContentSuggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoOutputFormat {
    Plain,
    Structured,
}

impl VideoOutputFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plain" | "normal" | "text" => Some(Self::Plain),
            "structured" | "json" => Some(Self::Structured),
            _ => None,
        }
    }
}

/// What a successful generation hands back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Text(String),
    Video {
        text: String,
        format: VideoOutputFormat,
    },
    Captions(Vec<CaptionVariation>),
    Remix(RemixScript),
    ProfileReport {
        analysis: ProfileAnalysis,
        plan: Option<ActionPlan>,
    },
}

impl GenerationResult {
    /// Text a user would copy out of the result panel.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) | Self::Video { text, .. } => text.clone(),
            Self::Captions(variations) => variations
                .iter()
                .map(|row| {
                    format!(
                        "Variation {}\n{}\n{}\n{}\n{}",
                        row.variation, row.hook, row.body, row.cta, row.hashtags
                    )
                })
                .collect::<Vec<String>>()
                .join("\n\n"),
            Self::Remix(script) => format!(
                "Narration script:\n{}\n\nRemix instructions:\n{}",
                script.narration_script, script.remix_instructions
            ),
            Self::ProfileReport { analysis, plan } => {
                let mut out = format!(
                    "Evidence: {}\n\nStrengths:\n{}\n\nWeaknesses:\n{}",
                    analysis.evidence_quote,
                    bullet_list(&analysis.strengths),
                    bullet_list(&analysis.weaknesses)
                );
                if let Some(plan) = plan {
                    out.push_str("\n\nAction plan:\n");
                    for step in &plan.action_plan {
                        out.push_str(&format!("{}. {}\n", step.step, step.action));
                    }
                    let viral = &plan.viral_content_suggestion;
                    out.push_str(&format!(
                        "\nViral idea: {}\nFormat: {}\nScript: {}",
                        viral.idea, viral.format, viral.suggested_script
                    ));
                }
                out
            }
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{CaptionVariation, GenerationResult, ProfileAnalysis, VideoOutputFormat};

    #[test]
    fn normalize_hashtags_prefixes_and_collapses() {
        let mut caption = CaptionVariation {
            variation: 1,
            hook: "h".to_string(),
            body: "b".to_string(),
            cta: "c".to_string(),
            hashtags: "#coffee  latte,##barista\n#fyp".to_string(),
        };
        caption.normalize_hashtags();
        assert_eq!(caption.hashtags, "#coffee #latte #barista #fyp");
        assert!(caption.hashtag_tokens().iter().all(|t| t.starts_with('#')));
    }

    #[test]
    fn output_format_accepts_legacy_names() {
        assert_eq!(VideoOutputFormat::parse("json"), Some(VideoOutputFormat::Structured));
        assert_eq!(VideoOutputFormat::parse("normal"), Some(VideoOutputFormat::Plain));
        assert_eq!(VideoOutputFormat::parse("yaml"), None);
    }

    #[test]
    fn profile_report_display_lists_points() {
        let result = GenerationResult::ProfileReport {
            analysis: ProfileAnalysis {
                evidence_quote: "Your bio says 'coffee lover'".to_string(),
                strengths: vec!["consistent palette".to_string()],
                weaknesses: vec!["no call to action".to_string()],
            },
            plan: None,
        };
        let text = result.display_text();
        assert!(text.contains("- consistent palette"));
        assert!(text.contains("- no call to action"));
        assert!(!text.contains("Action plan"));
    }
}
