use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Capability a usage counter and access check apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureTag {
    Text,
    Image,
    ImageEdit,
    Video,
    Remix,
    Analysis,
}

impl FeatureTag {
    pub const ALL: [FeatureTag; 6] = [
        FeatureTag::Text,
        FeatureTag::Image,
        FeatureTag::ImageEdit,
        FeatureTag::Video,
        FeatureTag::Remix,
        FeatureTag::Analysis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::ImageEdit => "image-edit",
            Self::Video => "video",
            Self::Remix => "remix",
            Self::Analysis => "analysis",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == normalized)
    }
}

impl fmt::Display for FeatureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered contact information. Saved once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub contact_handle: String,
    pub email: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        contact_handle: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            contact_handle: contact_handle.into().trim().to_string(),
            email: email.into().trim().to_string(),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.contact_handle.trim().is_empty() {
            missing.push("contact_handle");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Per-feature generation counters, keyed by the feature tag string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageRecord {
    counts: BTreeMap<String, u64>,
}

impl UsageRecord {
    pub fn count(&self, feature: FeatureTag) -> u64 {
        self.counts.get(feature.as_str()).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, feature: FeatureTag) -> u64 {
        let slot = self.counts.entry(feature.as_str().to_string()).or_insert(0);
        *slot = slot.saturating_add(1);
        *slot
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, value)| (key.as_str(), *value))
    }
}
