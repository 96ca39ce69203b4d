/// Length of one generated video segment, in seconds.
pub const SEGMENT_SECONDS: u32 = 8;

pub const VIDEO_DURATIONS: &[u32] = &[8, 16, 24, 32, 40, 48, 56];

pub const NO_DIALOGUE: &str = "sem-dialogo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
}

pub const DIALOGUE_LANGUAGES: &[CatalogEntry] = &[
    CatalogEntry {
        id: NO_DIALOGUE,
        name: "No dialogue / narration",
    },
    CatalogEntry {
        id: "pt-br",
        name: "Portuguese (Brazil)",
    },
    CatalogEntry {
        id: "en-us",
        name: "English (US)",
    },
    CatalogEntry {
        id: "es-es",
        name: "Spanish",
    },
    CatalogEntry {
        id: "fr-fr",
        name: "French",
    },
    CatalogEntry {
        id: "de-de",
        name: "German",
    },
];

pub const SOCIAL_PLATFORMS: &[CatalogEntry] = &[
    CatalogEntry {
        id: "tiktok",
        name: "TikTok",
    },
    CatalogEntry {
        id: "instagram-reels",
        name: "Instagram Reels",
    },
    CatalogEntry {
        id: "youtube-shorts",
        name: "YouTube Shorts",
    },
    CatalogEntry {
        id: "x-twitter",
        name: "X (Twitter)",
    },
    CatalogEntry {
        id: "facebook-reels",
        name: "Facebook Reels",
    },
];

pub const ANALYSIS_GOALS: &[CatalogEntry] = &[
    CatalogEntry {
        id: "views",
        name: "Increase views",
    },
    CatalogEntry {
        id: "interaction",
        name: "Increase engagement",
    },
    CatalogEntry {
        id: "followers",
        name: "Gain more followers",
    },
];

pub const IDEA_SUGGESTIONS: &[&str] = &[
    "Futuristic",
    "Magical",
    "Minimalist",
    "Cyberpunk",
    "Vintage",
    "Dreamlike",
    "Adventure",
    "Mysterious",
    "Comic",
    "Epic",
    "Underwater",
    "Outer space",
    "Nature",
    "Urban",
    "Abstract",
    "Fantasy",
    "Gothic",
    "Solarpunk",
    "Retro",
    "Surreal",
];

fn lookup(entries: &[CatalogEntry], id: &str) -> String {
    entries
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.name.to_string())
        .unwrap_or_else(|| id.to_string())
}

pub fn dialogue_language_name(id: &str) -> String {
    lookup(DIALOGUE_LANGUAGES, id)
}

pub fn platform_name(id: &str) -> String {
    lookup(SOCIAL_PLATFORMS, id)
}

pub fn analysis_goal_name(id: &str) -> String {
    lookup(ANALYSIS_GOALS, id)
}
