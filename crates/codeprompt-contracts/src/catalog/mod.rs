mod options;
mod selector;
mod targets;

pub use options::{
    analysis_goal_name, dialogue_language_name, platform_name, CatalogEntry, ANALYSIS_GOALS,
    DIALOGUE_LANGUAGES, IDEA_SUGGESTIONS, NO_DIALOGUE, SEGMENT_SECONDS, SOCIAL_PLATFORMS,
    VIDEO_DURATIONS,
};
pub use selector::{TargetSelection, TargetSelector};
pub use targets::{TargetCatalog, TargetKind, TargetSpec};
