use codeprompt_contracts::catalog::{analysis_goal_name, platform_name};
use codeprompt_contracts::results::ProfileAnalysis;
use codeprompt_contracts::schema::{action_plan_schema, profile_analysis_schema};

use super::{labels, require_image, PromptPlan};
use crate::error::GenerationError;
use crate::media::MediaFile;

const STAGE_ONE_TEMPERATURE: f64 = 0.85;
const STAGE_TWO_TEMPERATURE: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
pub struct ProfileAnalysisInput<'a> {
    pub platform: &'a str,
    pub username: &'a str,
    pub goal: &'a str,
    pub screenshots: &'a [MediaFile],
}

/// Stage one: a blunt diagnosis read off the profile screenshots.
pub fn profile_analysis_prompt<'a>(
    input: ProfileAnalysisInput<'a>,
) -> Result<PromptPlan<'a>, GenerationError> {
    if input.screenshots.is_empty() {
        return Err(
            GenerationError::invalid_input("add at least one profile screenshot")
                .labeled(labels::ANALYSIS),
        );
    }
    for screenshot in input.screenshots {
        require_image(screenshot, labels::ANALYSIS)?;
    }
    let platform = platform_name(input.platform);
    let goal = analysis_goal_name(input.goal);
    let username = input.username.trim().trim_start_matches('@');
    let instruction = format!(
        "You are an elite digital marketing consultant known for \"brutally necessary\" honesty. Study the screenshots of a user's profile and give a direct diagnosis with no sugar-coating.

**Profile context:**
- **Platform:** {platform}
- **Username:** @{username}
- **Main goal:** {goal}

**Your analysis:**
Read the screenshots provided. Be direct, use strong language and point out the flaws in a way that stings, for the user's own good.

**Required output format:**
Reply with a JSON object that has:
- \"evidence_quote\" (string): a short sentence quoting something SPECIFIC you read in the images (for example \"I saw your bio says 'X'...\" or \"In your latest post about 'Y'...\"). This proves you actually analyzed the profile.
- \"strengths\" (array of strings): 2-3 things the profile gets right, based on the images.
- \"weaknesses\" (array of strings): 2-3 weak points or common mistakes you see, stated bluntly."
    );

    let mut plan = PromptPlan::new(labels::ANALYSIS)
        .instruction(instruction)
        .temperature(STAGE_ONE_TEMPERATURE)
        .schema(profile_analysis_schema());
    for screenshot in input.screenshots {
        plan = plan.media(screenshot);
    }
    Ok(plan.text(format!(
        "Analyze this {platform} profile with the goal: {goal}."
    )))
}

/// Stage two: an action plan that builds on a finished stage-one diagnosis.
pub fn action_plan_prompt(
    analysis: &ProfileAnalysis,
    goal: &str,
    platform: &str,
) -> PromptPlan<'static> {
    let platform = platform_name(platform);
    let goal = analysis_goal_name(goal);
    let instruction = format!(
        "You are a growth hacker and content strategist. You have a profile diagnosis and now need an action plan that reaches the user's goal.

**Diagnosis received:**
- **Strengths:** {}
- **Weaknesses:** {}
- **Main goal:** {goal}

**Your job:**
Write a concrete, step-by-step action plan plus one viral content idea that fixes the weaknesses and builds on the strengths to reach the goal.

**Required output format:**
Reply with a JSON object that has:
- \"action_plan\" (array of objects): 3-4 actionable steps, each with \"step\" (integer) and \"action\" (string).
- \"viral_content_suggestion\" (object): one viral post idea.
  - \"idea\" (string): the core concept of the post.
  - \"format\" (string): the best format for the idea on {platform}.
  - \"suggested_script\" (string): a short script or walkthrough for making it.",
        analysis.strengths.join(", "),
        analysis.weaknesses.join(", ")
    );
    PromptPlan::new(labels::ACTION_PLAN)
        .instruction(instruction)
        .text(format!("Build an action plan for this {platform} profile."))
        .temperature(STAGE_TWO_TEMPERATURE)
        .schema(action_plan_schema())
}

#[cfg(test)]
mod tests {
    use codeprompt_contracts::results::ProfileAnalysis;
    use codeprompt_contracts::schema::{action_plan_schema, profile_analysis_schema};

    use super::{action_plan_prompt, profile_analysis_prompt, ProfileAnalysisInput};
    use crate::media::MediaFile;
    use crate::templates::PlanPart;

    #[test]
    fn screenshots_precede_the_request_text() -> anyhow::Result<()> {
        let shots = vec![
            MediaFile::new("1.png", "image/png", vec![1]),
            MediaFile::new("2.png", "image/png", vec![2]),
        ];
        let plan = profile_analysis_prompt(ProfileAnalysisInput {
            platform: "tiktok",
            username: "@latte.art",
            goal: "followers",
            screenshots: &shots,
        })?;
        assert_eq!(plan.media_count(), 2);
        assert!(matches!(plan.parts[2], PlanPart::Text(_)));
        let text = plan.full_text();
        assert!(text.contains("@latte.art"));
        assert!(!text.contains("@@"));
        assert!(text.contains("Gain more followers"));
        assert!(text.contains("TikTok"));
        assert!(text.contains("evidence_quote"));
        assert_eq!(plan.schema, Some(profile_analysis_schema()));
        Ok(())
    }

    #[test]
    fn no_screenshots_is_invalid() {
        let result = profile_analysis_prompt(ProfileAnalysisInput {
            platform: "tiktok",
            username: "someone",
            goal: "views",
            screenshots: &[],
        });
        assert!(result.is_err());
    }

    #[test]
    fn plan_carries_the_diagnosis() {
        let analysis = ProfileAnalysis {
            evidence_quote: "Your bio says 'coffee nerd'".to_string(),
            strengths: vec!["clear niche".to_string(), "good lighting".to_string()],
            weaknesses: vec!["no hooks".to_string()],
        };
        let plan = action_plan_prompt(&analysis, "views", "youtube-shorts");
        let text = plan.full_text();
        assert!(text.contains("clear niche, good lighting"));
        assert!(text.contains("no hooks"));
        assert!(text.contains("YouTube Shorts"));
        assert_eq!(plan.temperature, Some(0.9));
        assert_eq!(plan.schema, Some(action_plan_schema()));
    }
}
