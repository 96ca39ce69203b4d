//! Per-tab interaction state.
//!
//! One tab is active at a time. Its state is an explicit
//! [`TabState`]; editing inputs drops it back to `Idle` and switching tabs
//! resets inputs, results and errors. Every method takes `&mut self`, so the
//! same action can never be submitted twice while a call is in flight.

use codeprompt_contracts::activity::{ActivityEvent, ActivityLog};
use codeprompt_contracts::catalog::{
    TargetKind, TargetSelection, TargetSelector, TargetSpec, ANALYSIS_GOALS, IDEA_SUGGESTIONS,
    NO_DIALOGUE, SEGMENT_SECONDS, SOCIAL_PLATFORMS,
};
use codeprompt_contracts::features::{FeatureTag, Identity};
use codeprompt_contracts::results::{CaptionVariation, GenerationResult, VideoOutputFormat};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Url;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::access::{AccessDecision, AccessGate, RegistrationOutcome, UsageReceipt};
use crate::adapter::service_for;
use crate::admin::support_link;
use crate::config::AppConfig;
use crate::error::GenerationError;
use crate::media::MediaFile;
use crate::studio::{merge_story, ContentStudio};
use crate::templates::{
    self, labels, ProfileAnalysisInput, RemixGoal, VideoOptions, VideoType,
    SHEET_FROM_IMAGE_DESCRIPTION,
};

pub const ACTIVITY_LOG: &str = "activity.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Text,
    Image,
    ImageEdit,
    Video,
    Remix,
    Analysis,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Text,
        Tab::Image,
        Tab::ImageEdit,
        Tab::Video,
        Tab::Remix,
        Tab::Analysis,
    ];

    pub fn feature(self) -> FeatureTag {
        match self {
            Self::Text => FeatureTag::Text,
            Self::Image => FeatureTag::Image,
            Self::ImageEdit => FeatureTag::ImageEdit,
            Self::Video => FeatureTag::Video,
            Self::Remix => FeatureTag::Remix,
            Self::Analysis => FeatureTag::Analysis,
        }
    }

    pub fn target_kind(self) -> Option<TargetKind> {
        match self {
            Self::Text => Some(TargetKind::Text),
            Self::Image => Some(TargetKind::Image),
            Self::ImageEdit => Some(TargetKind::ImageEdit),
            Self::Video => Some(TargetKind::Video),
            Self::Remix | Self::Analysis => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.feature().as_str()
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let feature = FeatureTag::parse(raw)?;
        Self::ALL.into_iter().find(|tab| tab.feature() == feature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TabState {
    #[default]
    Idle,
    Submitting,
    Succeeded(GenerationResult),
    Failed(GenerationError),
}

impl TabState {
    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            Self::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GenerationError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Influencer source on the video tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfluencerChoice {
    #[default]
    None,
    Create,
    Existing,
}

impl InfluencerChoice {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "create" | "new" => Some(Self::Create),
            "existing" | "use" => Some(Self::Existing),
            _ => None,
        }
    }
}

/// Who speaks in a remix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemixNarration {
    #[default]
    VoiceOnly,
    CreateInfluencer,
    UseInfluencer,
}

impl RemixNarration {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "voice_only" | "voice" => Some(Self::VoiceOnly),
            "create_influencer" | "create" => Some(Self::CreateInfluencer),
            "use_influencer" | "use" | "existing" => Some(Self::UseInfluencer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InfluencerInputs {
    pub description: String,
    pub image: Option<MediaFile>,
    pub generated_sheet: String,
    pub existing_sheet: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImageInputs {
    /// Describe an uploaded image instead of expanding a text idea.
    pub use_upload: bool,
    pub image: Option<MediaFile>,
    pub instruction: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImageEditInputs {
    pub image: Option<MediaFile>,
    pub instruction: String,
}

#[derive(Debug, Clone)]
pub struct VideoInputs {
    pub idea: String,
    pub duration: u32,
    pub format: VideoOutputFormat,
    pub dialogue_language: String,
    pub video_type: VideoType,
    pub on_screen_text: bool,
    pub background: Option<MediaFile>,
    pub logo: Option<MediaFile>,
    pub influencer: InfluencerChoice,
    pub caption_platform: String,
}

impl Default for VideoInputs {
    fn default() -> Self {
        Self {
            idea: String::new(),
            duration: SEGMENT_SECONDS,
            format: VideoOutputFormat::Plain,
            dialogue_language: NO_DIALOGUE.to_string(),
            video_type: VideoType::Normal,
            on_screen_text: false,
            background: None,
            logo: None,
            influencer: InfluencerChoice::None,
            caption_platform: SOCIAL_PLATFORMS[0].id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemixInputs {
    pub video: Option<MediaFile>,
    pub goal: RemixGoal,
    pub narration: RemixNarration,
}

#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub platform: String,
    pub username: String,
    pub goal: String,
    pub screenshots: Vec<MediaFile>,
}

impl Default for AnalysisInputs {
    fn default() -> Self {
        Self {
            platform: SOCIAL_PLATFORMS[0].id.to_string(),
            username: String::new(),
            goal: ANALYSIS_GOALS[0].id.to_string(),
            screenshots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TabInputs {
    /// Requested target id. Blank picks the tab's default.
    pub target: Option<String>,
    pub topic: String,
    pub image: ImageInputs,
    pub image_edit: ImageEditInputs,
    pub video: VideoInputs,
    pub remix: RemixInputs,
    pub analysis: AnalysisInputs,
    pub influencer: InfluencerInputs,
}

/// The modal shown when a generation is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedNotice {
    pub feature: FeatureTag,
    pub decision: AccessDecision,
    pub message: String,
    /// Support chat offered once the free uses are spent.
    pub contact: Option<Url>,
}

impl DeniedNotice {
    fn new(feature: FeatureTag, decision: AccessDecision, support_contact: Option<&str>) -> Self {
        let (message, contact) = match decision {
            AccessDecision::LimitReached => (
                format!("You have used all free '{feature}' generations. Get in touch to unlock more."),
                support_contact.and_then(|handle| match support_link(handle) {
                    Ok(link) => Some(link),
                    Err(err) => {
                        warn!("support contact unusable: {err:#}");
                        None
                    }
                }),
            ),
            _ => (
                "Register your name, WhatsApp and email to start generating.".to_string(),
                None,
            ),
        };
        Self {
            feature,
            decision,
            message,
            contact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded { receipt: Option<UsageReceipt> },
    Failed(GenerationError),
    Denied(DeniedNotice),
}

pub struct StudioController {
    studio: ContentStudio,
    gate: AccessGate,
    selector: TargetSelector,
    activity: Option<ActivityLog>,
    support_contact: Option<String>,
    active: Tab,
    inputs: TabInputs,
    state: TabState,
    captions: Option<Vec<CaptionVariation>>,
    helper_error: Option<GenerationError>,
}

impl StudioController {
    pub fn new(studio: ContentStudio, gate: AccessGate) -> Self {
        Self {
            studio,
            gate,
            selector: TargetSelector::default(),
            activity: None,
            support_contact: None,
            active: Tab::Text,
            inputs: TabInputs::default(),
            state: TabState::Idle,
            captions: None,
            helper_error: None,
        }
    }

    /// Wires the configured service, the access gate and a fresh session's
    /// activity log under the data directory.
    pub fn from_config(config: &AppConfig, force_dryrun: bool) -> Self {
        let service = service_for(&config.generation, force_dryrun);
        let studio = ContentStudio::new(service, config.generation.model.clone());
        let activity = ActivityLog::new(
            config.resolved_data_dir().join(ACTIVITY_LOG),
            Uuid::new_v4().to_string(),
        );
        debug!(
            service = studio.service_name(),
            session_id = activity.session_id(),
            remote = config.remote.is_enabled(),
            "studio controller ready"
        );
        let controller = Self::new(studio, AccessGate::from_config(config)).with_activity(activity);
        match config.admin.support_contact.as_deref() {
            Some(contact) => controller.with_support_contact(contact),
            None => controller,
        }
    }

    pub fn with_activity(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn with_support_contact(mut self, contact: impl Into<String>) -> Self {
        self.support_contact = Some(contact.into());
        self
    }

    pub fn with_selector(mut self, selector: TargetSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn active_tab(&self) -> Tab {
        self.active
    }

    pub fn state(&self) -> &TabState {
        &self.state
    }

    pub fn inputs(&self) -> &TabInputs {
        &self.inputs
    }

    pub fn captions(&self) -> Option<&[CaptionVariation]> {
        self.captions.as_deref()
    }

    pub fn helper_error(&self) -> Option<&GenerationError> {
        self.helper_error.as_ref()
    }

    pub fn activity(&self) -> Option<&ActivityLog> {
        self.activity.as_ref()
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn studio(&self) -> &ContentStudio {
        &self.studio
    }

    pub fn selector(&self) -> &TargetSelector {
        &self.selector
    }

    pub fn register(&self, identity: Identity) -> anyhow::Result<RegistrationOutcome> {
        self.gate.register(identity)
    }

    /// Resets inputs, results and errors unconditionally.
    pub fn switch_tab(&mut self, tab: Tab) {
        debug!(from = self.active.as_str(), to = tab.as_str(), "switching tab");
        self.active = tab;
        self.inputs = TabInputs::default();
        self.state = TabState::Idle;
        self.captions = None;
        self.helper_error = None;
    }

    /// Applies an input change. Any shown result or error is dropped.
    pub fn edit<F>(&mut self, change: F)
    where
        F: FnOnce(&mut TabInputs),
    {
        change(&mut self.inputs);
        self.state = TabState::Idle;
        self.helper_error = None;
    }

    pub fn selected_target(&self) -> Option<Result<TargetSelection, String>> {
        let kind = self.active.target_kind()?;
        Some(self.selector.select(self.inputs.target.as_deref(), kind))
    }

    /// Character sheet the active tab would send along.
    pub fn final_influencer_sheet(&self) -> &str {
        let influencer = &self.inputs.influencer;
        match self.active {
            Tab::Video => match self.inputs.video.influencer {
                InfluencerChoice::None => "",
                InfluencerChoice::Create => influencer.generated_sheet.as_str(),
                InfluencerChoice::Existing => influencer.existing_sheet.as_str(),
            },
            Tab::Remix => match self.inputs.remix.narration {
                RemixNarration::VoiceOnly => "",
                RemixNarration::CreateInfluencer => influencer.generated_sheet.as_str(),
                RemixNarration::UseInfluencer => influencer.existing_sheet.as_str(),
            },
            _ => "",
        }
    }

    pub fn suggest_idea(&mut self) -> Option<&'static str> {
        self.suggest_idea_with(&mut rand::thread_rng())
    }

    /// Fills the active tab's primary text input with a random suggestion.
    pub fn suggest_idea_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&'static str> {
        if matches!(self.active, Tab::Remix | Tab::Analysis) {
            return None;
        }
        let idea = *IDEA_SUGGESTIONS.choose(rng)?;
        let tab = self.active;
        self.edit(|inputs| match tab {
            Tab::Text => inputs.topic = idea.to_string(),
            Tab::Image => inputs.image.instruction = idea.to_string(),
            Tab::ImageEdit => inputs.image_edit.instruction = idea.to_string(),
            Tab::Video => inputs.video.idea = idea.to_string(),
            Tab::Remix | Tab::Analysis => {}
        });
        Some(idea)
    }

    /// Validate, check access, generate, then record usage.
    pub fn submit(&mut self) -> SubmitOutcome {
        let feature = self.active.feature();
        if let Err(err) = self.preflight() {
            return self.fail(feature, err);
        }

        let decision = self.gate.check_access(feature);
        if !decision.is_allowed() {
            let notice = DeniedNotice::new(feature, decision, self.support_contact.as_deref());
            self.emit(ActivityEvent::AccessDenied {
                feature,
                decision: decision.as_str().to_string(),
            });
            return SubmitOutcome::Denied(notice);
        }

        self.state = TabState::Submitting;
        self.helper_error = None;
        if self.active == Tab::Video {
            self.captions = None;
        }
        match self.generate() {
            Ok(result) => {
                self.emit(ActivityEvent::GenerationSucceeded {
                    feature,
                    service: self.studio.service_name().to_string(),
                });
                self.state = TabState::Succeeded(result);
                let receipt = match self.gate.record_usage(feature) {
                    Ok(receipt) => {
                        self.emit(ActivityEvent::UsageRecorded {
                            feature,
                            local_count: receipt.local_count,
                            remote: format!("{:?}", receipt.remote),
                        });
                        Some(receipt)
                    }
                    Err(err) => {
                        warn!(feature = %feature, "local usage write failed: {err:#}");
                        None
                    }
                };
                SubmitOutcome::Succeeded { receipt }
            }
            Err(err) => self.fail(feature, err),
        }
    }

    fn fail(&mut self, feature: FeatureTag, err: GenerationError) -> SubmitOutcome {
        self.emit(ActivityEvent::GenerationFailed {
            feature,
            kind: err.kind.as_str().to_string(),
            message: err.message.clone(),
        });
        self.state = TabState::Failed(err.clone());
        SubmitOutcome::Failed(err)
    }

    fn target(&self) -> Result<TargetSpec, GenerationError> {
        let Some(selection) = self.selected_target() else {
            return Err(GenerationError::invalid_input(format!(
                "the {} tab has no target model",
                self.active.as_str()
            )));
        };
        let selection = selection.map_err(GenerationError::invalid_input)?;
        if let Some(reason) = selection.fallback_reason.as_deref() {
            debug!(target_id = %selection.target.id, reason, "target fallback");
        }
        Ok(selection.target)
    }

    fn remix_sheet(&self) -> Result<String, GenerationError> {
        let sheet = self.final_influencer_sheet().trim();
        if self.inputs.remix.narration != RemixNarration::VoiceOnly && sheet.is_empty() {
            return Err(GenerationError::invalid_input(
                "define the influencer for this remix option",
            )
            .labeled(labels::REMIX));
        }
        Ok(sheet.to_string())
    }

    fn video_options(&self, existing: Option<String>, duration: u32) -> VideoOptions {
        let video = &self.inputs.video;
        VideoOptions {
            duration,
            format: video.format,
            dialogue_language: video.dialogue_language.clone(),
            influencer_sheet: self.final_influencer_sheet().to_string(),
            background: video.background.clone(),
            logo: video.logo.clone(),
            video_type: video.video_type,
            on_screen_text: video.on_screen_text,
            existing,
        }
    }

    fn analysis_input(&self) -> ProfileAnalysisInput<'_> {
        let analysis = &self.inputs.analysis;
        ProfileAnalysisInput {
            platform: &analysis.platform,
            username: &analysis.username,
            goal: &analysis.goal,
            screenshots: &analysis.screenshots,
        }
    }

    fn upload_image(&self) -> Option<&MediaFile> {
        let image = &self.inputs.image;
        if image.use_upload {
            image.image.as_ref()
        } else {
            None
        }
    }

    /// Builds the prompt plan without calling out, so bad input is caught
    /// before the access check.
    fn preflight(&self) -> Result<(), GenerationError> {
        let inputs = &self.inputs;
        match self.active {
            Tab::Text => templates::text_prompt(&inputs.topic, &self.target()?).map(drop),
            Tab::Image => {
                if inputs.image.use_upload && inputs.image.image.is_none() {
                    return Err(GenerationError::invalid_input("upload an image to describe")
                        .labeled(labels::IMAGE));
                }
                templates::image_prompt(self.upload_image(), &inputs.image.instruction, &self.target()?)
                    .map(drop)
            }
            Tab::ImageEdit => templates::image_edit_prompt(
                inputs.image_edit.image.as_ref(),
                &inputs.image_edit.instruction,
                &self.target()?,
            )
            .map(drop),
            Tab::Video => {
                let options = self.video_options(None, inputs.video.duration);
                templates::video_prompt(&inputs.video.idea, &self.target()?, &options).map(drop)
            }
            Tab::Remix => {
                let sheet = self.remix_sheet()?;
                templates::remix_prompt(inputs.remix.video.as_ref(), &sheet, inputs.remix.goal)
                    .map(drop)
            }
            Tab::Analysis => templates::profile_analysis_prompt(self.analysis_input()).map(drop),
        }
    }

    fn generate(&self) -> Result<GenerationResult, GenerationError> {
        let inputs = &self.inputs;
        match self.active {
            Tab::Text => self
                .studio
                .text_prompt(&inputs.topic, &self.target()?)
                .map(GenerationResult::Text),
            Tab::Image => self
                .studio
                .image_prompt(self.upload_image(), &inputs.image.instruction, &self.target()?)
                .map(GenerationResult::Text),
            Tab::ImageEdit => self
                .studio
                .image_edit_prompt(
                    inputs.image_edit.image.as_ref(),
                    &inputs.image_edit.instruction,
                    &self.target()?,
                )
                .map(GenerationResult::Text),
            Tab::Video => {
                let options = self.video_options(None, inputs.video.duration);
                self.studio
                    .video_prompt(&inputs.video.idea, &self.target()?, &options)
            }
            Tab::Remix => self
                .studio
                .remix_script(inputs.remix.video.as_ref(), &self.remix_sheet()?, inputs.remix.goal)
                .map(GenerationResult::Remix),
            Tab::Analysis => self
                .studio
                .profile_analysis(self.analysis_input())
                .map(|analysis| GenerationResult::ProfileReport {
                    analysis,
                    plan: None,
                }),
        }
    }

    /// Appends `additional_duration` seconds of segments to the shown story.
    pub fn continue_story(&mut self, additional_duration: u32) -> Result<(), GenerationError> {
        let shown_story = match (self.active, &self.state) {
            (Tab::Video, TabState::Succeeded(GenerationResult::Video { text, format })) => {
                Some((text.clone(), *format))
            }
            _ => None,
        };
        let Some((story, story_format)) = shown_story else {
            return Err(self.helper_failure(
                GenerationError::invalid_input("generate a video prompt before continuing the story")
                    .labeled(labels::VIDEO),
            ));
        };
        let target = match self.target() {
            Ok(target) => target,
            Err(err) => return Err(self.helper_failure(err.labeled(labels::VIDEO))),
        };
        let options = self.video_options(Some(story.clone()), additional_duration);
        let shown = std::mem::replace(&mut self.state, TabState::Submitting);
        match self
            .studio
            .video_prompt(&self.inputs.video.idea, &target, &options)
        {
            Ok(GenerationResult::Video { text, format }) => {
                let merge_format = if story_format == VideoOutputFormat::Structured
                    && format == VideoOutputFormat::Structured
                {
                    VideoOutputFormat::Structured
                } else {
                    VideoOutputFormat::Plain
                };
                let merged = merge_story(&story, &text, merge_format);
                self.emit(ActivityEvent::StoryContinued {
                    added_seconds: additional_duration,
                    format: merge_format,
                });
                self.state = TabState::Succeeded(GenerationResult::Video {
                    text: merged,
                    format: merge_format,
                });
                self.helper_error = None;
                Ok(())
            }
            Ok(_) => {
                self.state = shown;
                Err(self.helper_failure(GenerationError::response_shape(
                    "continuation did not return video segments",
                )))
            }
            Err(err) => {
                self.state = shown;
                Err(self.helper_failure(err))
            }
        }
    }

    /// Stage two of the profile analysis. Needs a finished stage one.
    pub fn generate_action_plan(&mut self) -> Result<(), GenerationError> {
        let stage_one = match (self.active, &self.state) {
            (Tab::Analysis, TabState::Succeeded(GenerationResult::ProfileReport { analysis, .. })) => {
                Some(analysis.clone())
            }
            _ => None,
        };
        let Some(analysis) = stage_one else {
            return Err(self.helper_failure(
                GenerationError::invalid_input("run the profile analysis first")
                    .labeled(labels::ACTION_PLAN),
            ));
        };
        let plan = self.studio.action_plan(
            &analysis,
            &self.inputs.analysis.goal,
            &self.inputs.analysis.platform,
        );
        match plan {
            Ok(plan) => {
                self.state = TabState::Succeeded(GenerationResult::ProfileReport {
                    analysis,
                    plan: Some(plan),
                });
                self.helper_error = None;
                Ok(())
            }
            Err(err) => Err(self.helper_failure(err)),
        }
    }

    /// Caption variations for the current video idea.
    pub fn generate_captions(&mut self) -> Result<&[CaptionVariation], GenerationError> {
        if self.active != Tab::Video {
            return Err(self.helper_failure(
                GenerationError::invalid_input("captions are written for the video tab")
                    .labeled(labels::CAPTIONS),
            ));
        }
        self.captions = None;
        let video = &self.inputs.video;
        match self.studio.captions(&video.idea, &video.caption_platform) {
            Ok(captions) => {
                self.helper_error = None;
                Ok(self.captions.insert(captions).as_slice())
            }
            Err(err) => Err(self.helper_failure(err)),
        }
    }

    /// Builds a character sheet into the slot the current influencer option
    /// reads from.
    pub fn generate_character_sheet(&mut self) -> Result<String, GenerationError> {
        let slot = match self.active {
            Tab::Video => match self.inputs.video.influencer {
                InfluencerChoice::Create => Ok(false),
                InfluencerChoice::Existing => Ok(true),
                InfluencerChoice::None => Err("choose to create or reuse an influencer first"),
            },
            Tab::Remix => match self.inputs.remix.narration {
                RemixNarration::CreateInfluencer => Ok(false),
                RemixNarration::UseInfluencer => Ok(true),
                RemixNarration::VoiceOnly => Err("voice-only remixes have no influencer"),
            },
            _ => Err("influencers belong to the video and remix tabs"),
        };
        let wants_existing = match slot {
            Ok(wants_existing) => wants_existing,
            Err(message) => {
                return Err(self.helper_failure(
                    GenerationError::invalid_input(message).labeled(labels::CHARACTER_SHEET),
                ))
            }
        };

        let influencer = &self.inputs.influencer;
        let result = if wants_existing {
            match influencer.image.as_ref() {
                Some(image) => self
                    .studio
                    .character_sheet(SHEET_FROM_IMAGE_DESCRIPTION, Some(image)),
                None => Err(GenerationError::invalid_input(
                    "upload a reference image or paste the existing sheet",
                )
                .labeled(labels::CHARACTER_SHEET)),
            }
        } else if influencer.description.trim().is_empty() {
            Err(GenerationError::invalid_input("describe the influencer to create")
                .labeled(labels::CHARACTER_SHEET))
        } else {
            self.studio
                .character_sheet(&influencer.description, influencer.image.as_ref())
        };

        match result {
            Ok(sheet) => {
                let slot = if wants_existing {
                    &mut self.inputs.influencer.existing_sheet
                } else {
                    &mut self.inputs.influencer.generated_sheet
                };
                slot.clone_from(&sheet);
                self.helper_error = None;
                Ok(sheet)
            }
            Err(err) => Err(self.helper_failure(err)),
        }
    }

    fn helper_failure(&mut self, err: GenerationError) -> GenerationError {
        self.helper_error = Some(err.clone());
        err
    }

    fn emit(&self, event: ActivityEvent) {
        let Some(activity) = self.activity.as_ref() else {
            return;
        };
        let kind = event.kind();
        if let Err(err) = activity.record(self.active.as_str(), event) {
            warn!(event = kind, "activity log write failed: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use codeprompt_contracts::activity::{read_records, ActivityEvent, ActivityLog};
    use codeprompt_contracts::catalog::{TargetCatalog, TargetSelector, IDEA_SUGGESTIONS};
    use codeprompt_contracts::features::{FeatureTag, Identity};
    use codeprompt_contracts::local_store::LocalUsageStore;
    use codeprompt_contracts::results::{GenerationResult, VideoOutputFormat};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    use super::{
        InfluencerChoice, RemixNarration, StudioController, SubmitOutcome, Tab, TabState,
        ACTIVITY_LOG,
    };
    use crate::access::{AccessDecision, AccessGate};
    use crate::adapter::{ContentPart, ScriptedService};
    use crate::config::{AppConfig, UsagePolicy};
    use crate::error::GenerationErrorKind;
    use crate::media::MediaFile;
    use crate::studio::ContentStudio;

    struct Fixture {
        _temp: tempfile::TempDir,
        service: Arc<ScriptedService>,
        controller: StudioController,
    }

    fn fixture(replies: &[&str], registered: bool) -> Result<Fixture> {
        let temp = tempfile::tempdir()?;
        let service = Arc::new(ScriptedService::with_replies(replies.iter().copied()));
        let gate = AccessGate::new(
            LocalUsageStore::new(temp.path()),
            None,
            UsagePolicy::default(),
        );
        if registered {
            gate.register(Identity::new("Ana", "5534999990000", "ana@example.com"))?;
        }
        let controller = StudioController::new(ContentStudio::new(service.clone(), "gemini-2.5-flash"), gate)
            .with_activity(ActivityLog::new(temp.path().join("activity.jsonl"), "session-1"));
        Ok(Fixture {
            _temp: temp,
            service,
            controller,
        })
    }

    fn clip() -> MediaFile {
        MediaFile::new("clip.mp4", "video/mp4", vec![0; 16])
    }

    #[test]
    fn text_scenario_shows_reply_and_counts_usage() -> Result<()> {
        let mut fx = fixture(&["X"], true)?;
        fx.controller.edit(|inputs| {
            inputs.topic = "cafeteria logo".to_string();
            inputs.target = Some("geral-texto".to_string());
        });
        let receipt = match fx.controller.submit() {
            SubmitOutcome::Succeeded { receipt: Some(receipt) } => receipt,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(receipt.local_count, 1);
        assert_eq!(
            fx.controller.state(),
            &TabState::Succeeded(GenerationResult::Text("X".to_string()))
        );
        assert_eq!(fx.controller.gate().local().usage_count(FeatureTag::Text)?, 1);

        let request = &fx.service.requests()[0];
        let instruction = request.system_instruction.clone().unwrap_or_default();
        assert!(instruction.contains("Persona"));
        assert!(instruction.contains("Output format"));
        Ok(())
    }

    #[test]
    fn second_local_use_is_denied_without_calling() -> Result<()> {
        let mut fx = fixture(&["first", "second"], true)?;
        fx.controller.edit(|inputs| inputs.topic = "coffee".to_string());
        assert!(matches!(fx.controller.submit(), SubmitOutcome::Succeeded { .. }));
        let notice = match fx.controller.submit() {
            SubmitOutcome::Denied(notice) => notice,
            other => panic!("expected denial, got {other:?}"),
        };
        assert_eq!(notice.decision, AccessDecision::LimitReached);
        assert_eq!(fx.service.call_count(), 1);
        Ok(())
    }

    #[test]
    fn limit_reached_notice_links_to_support() -> Result<()> {
        let mut fx = fixture(&["first"], true)?;
        fx.controller = fx.controller.with_support_contact("+55 34 90000-1111");
        fx.controller.edit(|inputs| inputs.topic = "coffee".to_string());
        fx.controller.submit();
        let SubmitOutcome::Denied(notice) = fx.controller.submit() else {
            panic!("expected denial");
        };
        let link = notice.contact.ok_or_else(|| anyhow!("no support link"))?;
        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/5534900001111");
        Ok(())
    }

    #[test]
    fn unregistered_user_sees_registration_notice() -> Result<()> {
        let mut fx = fixture(&["unused"], false)?;
        fx.controller.edit(|inputs| inputs.topic = "coffee".to_string());
        let SubmitOutcome::Denied(notice) = fx.controller.submit() else {
            panic!("expected denial");
        };
        assert_eq!(notice.decision, AccessDecision::RegistrationRequired);
        assert!(notice.message.contains("Register"));
        assert_eq!(notice.contact, None);
        assert_eq!(fx.controller.state(), &TabState::Idle);
        assert_eq!(fx.service.call_count(), 0);
        Ok(())
    }

    #[test]
    fn empty_edit_instruction_fails_before_any_call() -> Result<()> {
        let mut fx = fixture(&["unused"], true)?;
        fx.controller.switch_tab(Tab::ImageEdit);
        fx.controller.edit(|inputs| {
            inputs.image_edit.image = Some(MediaFile::new("p.png", "image/png", vec![1]));
            inputs.image_edit.instruction = "   ".to_string();
        });
        let SubmitOutcome::Failed(err) = fx.controller.submit() else {
            panic!("expected validation failure");
        };
        assert_eq!(err.kind, GenerationErrorKind::InvalidInput);
        assert_eq!(fx.service.call_count(), 0);
        assert_eq!(fx.controller.gate().local().usage_count(FeatureTag::ImageEdit)?, 0);
        assert!(matches!(fx.controller.state(), TabState::Failed(_)));
        Ok(())
    }

    #[test]
    fn downstream_failure_records_no_usage() -> Result<()> {
        let mut fx = fixture(&[], true)?;
        fx.service.push_failure("HTTP 429 quota");
        fx.controller.edit(|inputs| inputs.topic = "coffee".to_string());
        let SubmitOutcome::Failed(err) = fx.controller.submit() else {
            panic!("expected failure");
        };
        assert_eq!(err.kind, GenerationErrorKind::Downstream);
        assert!(err.message.contains("HTTP 429 quota"));
        assert_eq!(fx.controller.gate().local().usage_count(FeatureTag::Text)?, 0);
        Ok(())
    }

    #[test]
    fn tab_round_trip_comes_back_idle() -> Result<()> {
        let mut fx = fixture(&["X"], true)?;
        fx.controller.edit(|inputs| inputs.topic = "coffee".to_string());
        fx.controller.submit();
        assert!(fx.controller.state().result().is_some());

        fx.controller.switch_tab(Tab::Video);
        fx.controller.switch_tab(Tab::Text);
        assert_eq!(fx.controller.state(), &TabState::Idle);
        assert!(fx.controller.state().error().is_none());
        assert!(fx.controller.inputs().topic.is_empty());
        assert!(fx.controller.captions().is_none());
        Ok(())
    }

    #[test]
    fn editing_inputs_returns_to_idle() -> Result<()> {
        let mut fx = fixture(&["X"], true)?;
        fx.controller.edit(|inputs| inputs.topic = "coffee".to_string());
        fx.controller.submit();
        fx.controller.edit(|inputs| inputs.topic.push_str(" shop"));
        assert_eq!(fx.controller.state(), &TabState::Idle);
        Ok(())
    }

    #[test]
    fn voice_only_remix_sends_empty_sheet() -> Result<()> {
        let reply = json!({"narration_script": "n", "remix_instructions": "r"}).to_string();
        let mut fx = fixture(&[reply.as_str()], true)?;
        fx.controller.switch_tab(Tab::Remix);
        fx.controller.edit(|inputs| {
            inputs.remix.video = Some(clip());
            inputs.remix.narration = RemixNarration::VoiceOnly;
            inputs.influencer.generated_sheet = "pink hair, cyberpunk jacket".to_string();
            inputs.influencer.existing_sheet = "blue eyes, freckles".to_string();
        });
        assert_eq!(fx.controller.final_influencer_sheet(), "");
        assert!(matches!(fx.controller.submit(), SubmitOutcome::Succeeded { .. }));

        let request = &fx.service.requests()[0];
        let text = request.prompt_text();
        assert!(text.contains("Influencer character sheet:\n\n"));
        assert!(!text.contains("pink hair"));
        assert!(!text.contains("freckles"));
        Ok(())
    }

    #[test]
    fn remix_with_influencer_needs_a_sheet() -> Result<()> {
        let mut fx = fixture(&["unused"], true)?;
        fx.controller.switch_tab(Tab::Remix);
        fx.controller.edit(|inputs| {
            inputs.remix.video = Some(clip());
            inputs.remix.narration = RemixNarration::UseInfluencer;
        });
        let SubmitOutcome::Failed(err) = fx.controller.submit() else {
            panic!("expected validation failure");
        };
        assert!(err.message.contains("define the influencer"));
        assert_eq!(fx.service.call_count(), 0);
        Ok(())
    }

    #[test]
    fn story_continues_with_numbering_and_merge() -> Result<()> {
        let first = json!([
            {"segment": 1, "prompt": "wide"},
            {"segment": 2, "prompt": "close"}
        ])
        .to_string();
        let second = json!([{"segment": 3, "prompt": "aerial"}]).to_string();
        let mut fx = fixture(&[first.as_str(), second.as_str()], true)?;
        fx.controller.switch_tab(Tab::Video);
        fx.controller.edit(|inputs| {
            inputs.target = Some("Flow VEO".to_string());
            inputs.video.idea = "rooftop chase".to_string();
            inputs.video.duration = 16;
            inputs.video.format = VideoOutputFormat::Structured;
        });
        assert!(matches!(fx.controller.submit(), SubmitOutcome::Succeeded { .. }));
        fx.controller.continue_story(8)?;

        let Some(GenerationResult::Video { text, format }) = fx.controller.state().result() else {
            panic!("expected a video result");
        };
        assert_eq!(*format, VideoOutputFormat::Structured);
        let merged: Value = serde_json::from_str(text)?;
        assert_eq!(merged.as_array().map(Vec::len), Some(3));

        let continuation = &fx.service.requests()[1];
        let instruction = continuation.system_instruction.clone().unwrap_or_default();
        assert!(instruction.contains("numbering them from 3"));
        assert!(instruction.contains("next 1 segments"));
        assert_eq!(fx.controller.gate().local().usage_count(FeatureTag::Video)?, 1);
        Ok(())
    }

    #[test]
    fn continuation_needs_a_shown_story() -> Result<()> {
        let mut fx = fixture(&[], true)?;
        fx.controller.switch_tab(Tab::Video);
        assert!(fx.controller.continue_story(8).is_err());
        assert!(fx.controller.helper_error().is_some());
        Ok(())
    }

    #[test]
    fn continuation_without_a_target_reports_a_helper_error() -> Result<()> {
        let mut fx = fixture(&["scene one"], true)?;
        fx.controller.switch_tab(Tab::Video);
        fx.controller.edit(|inputs| inputs.video.idea = "rooftop chase".to_string());
        assert!(matches!(fx.controller.submit(), SubmitOutcome::Succeeded { .. }));

        fx.controller = fx
            .controller
            .with_selector(TargetSelector::new(Some(TargetCatalog::new(Some(Default::default())))));
        let err = fx
            .controller
            .continue_story(8)
            .err()
            .ok_or_else(|| anyhow!("continuation should fail"))?;
        assert_eq!(fx.controller.helper_error(), Some(&err));
        assert!(fx.controller.state().result().is_some());
        assert_eq!(fx.service.call_count(), 1);
        Ok(())
    }

    #[test]
    fn action_plan_follows_stage_one() -> Result<()> {
        let stage_one = json!({
            "evidence_quote": "Your bio says 'coffee nerd'",
            "strengths": ["niche", "lighting"],
            "weaknesses": ["hooks", "posting cadence"]
        })
        .to_string();
        let stage_two = json!({
            "action_plan": [
                {"step": 1, "action": "rewrite bio"},
                {"step": 2, "action": "post daily"},
                {"step": 3, "action": "hook in 2s"}
            ],
            "viral_content_suggestion": {"idea": "i", "format": "reel", "suggested_script": "s"}
        })
        .to_string();
        let mut fx = fixture(&[stage_one.as_str(), stage_two.as_str()], true)?;
        fx.controller.switch_tab(Tab::Analysis);
        assert!(fx.controller.generate_action_plan().is_err());

        fx.controller.edit(|inputs| {
            inputs.analysis.username = "latte.nerd".to_string();
            inputs.analysis.screenshots = vec![MediaFile::new("s.png", "image/png", vec![1])];
        });
        assert!(matches!(fx.controller.submit(), SubmitOutcome::Succeeded { .. }));
        fx.controller.generate_action_plan()?;
        let Some(GenerationResult::ProfileReport { plan: Some(plan), .. }) = fx.controller.state().result() else {
            panic!("expected a plan");
        };
        assert_eq!(plan.action_plan.len(), 3);
        assert!(matches!(
            fx.service.requests()[0].parts[0],
            ContentPart::InlineData { .. }
        ));
        Ok(())
    }

    #[test]
    fn captions_are_ungated_helpers() -> Result<()> {
        let reply = json!([
            {"variation": 1, "hook": "h", "body": "b", "cta": "c", "hashtags": "#a #b"},
            {"variation": 2, "hook": "h", "body": "b", "cta": "c", "hashtags": "a b"},
            {"variation": 3, "hook": "h", "body": "b", "cta": "c", "hashtags": "#a"}
        ])
        .to_string();
        let mut fx = fixture(&[reply.as_str()], false)?;
        fx.controller.switch_tab(Tab::Video);
        fx.controller.edit(|inputs| inputs.video.idea = "latte art".to_string());
        let captions = fx.controller.generate_captions()?;
        assert_eq!(captions.len(), 3);
        assert_eq!(captions[1].hashtags, "#a #b");
        assert_eq!(fx.controller.gate().local().usage()?.total(), 0);
        Ok(())
    }

    #[test]
    fn character_sheet_fills_the_chosen_slot() -> Result<()> {
        let mut fx = fixture(&["sheet from text", "sheet from image"], true)?;
        fx.controller.switch_tab(Tab::Video);
        assert!(fx.controller.generate_character_sheet().is_err());

        fx.controller.edit(|inputs| {
            inputs.video.influencer = InfluencerChoice::Create;
            inputs.influencer.description = "retro gamer".to_string();
        });
        assert_eq!(fx.controller.generate_character_sheet()?, "sheet from text");
        assert_eq!(fx.controller.final_influencer_sheet(), "sheet from text");

        fx.controller.edit(|inputs| {
            inputs.video.influencer = InfluencerChoice::Existing;
            inputs.influencer.image = Some(MediaFile::new("me.png", "image/png", vec![1]));
        });
        fx.controller.generate_character_sheet()?;
        assert_eq!(fx.controller.inputs().influencer.existing_sheet, "sheet from image");
        assert_eq!(fx.controller.inputs().influencer.generated_sheet, "sheet from text");
        Ok(())
    }

    #[test]
    fn idea_fills_the_primary_input() -> Result<()> {
        let mut fx = fixture(&[], true)?;
        let mut rng = StdRng::seed_from_u64(7);
        fx.controller.switch_tab(Tab::Video);
        let Some(idea) = fx.controller.suggest_idea_with(&mut rng) else {
            panic!("video tab takes ideas");
        };
        assert!(IDEA_SUGGESTIONS.contains(&idea));
        assert_eq!(fx.controller.inputs().video.idea, idea);

        fx.controller.switch_tab(Tab::Remix);
        assert!(fx.controller.suggest_idea_with(&mut rng).is_none());
        Ok(())
    }

    #[test]
    fn outcomes_are_logged_as_activity() -> Result<()> {
        let mut fx = fixture(&["X"], true)?;
        fx.controller.edit(|inputs| inputs.topic = "coffee".to_string());
        fx.controller.submit();
        fx.controller.submit();

        let records = read_records(&fx._temp.path().join("activity.jsonl"))?;
        let kinds: Vec<&str> = records.iter().map(|record| record.event.kind()).collect();
        assert_eq!(
            kinds,
            vec!["generation_succeeded", "usage_recorded", "access_denied"]
        );
        assert!(records
            .iter()
            .all(|record| record.tab == "text" && record.session_id == "session-1"));
        assert_eq!(
            records[2].event,
            ActivityEvent::AccessDenied {
                feature: FeatureTag::Text,
                decision: AccessDecision::LimitReached.as_str().to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn from_config_runs_offline_in_dryrun() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = AppConfig {
            data_dir: Some(temp.path().to_path_buf()),
            ..AppConfig::default()
        };
        let mut controller = StudioController::from_config(&config, true);
        assert_eq!(controller.studio().service_name(), "dryrun");
        controller.register(Identity::new("Ana", "5534999990000", "ana@example.com"))?;
        controller.edit(|inputs| inputs.topic = "coffee".to_string());
        assert!(matches!(controller.submit(), SubmitOutcome::Succeeded { .. }));
        assert!(temp.path().join(ACTIVITY_LOG).exists());
        Ok(())
    }
}
