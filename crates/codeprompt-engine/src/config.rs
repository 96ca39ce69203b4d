//! Startup configuration.
//!
//! Built once from built-in defaults, then an optional TOML file
//! (`config.toml` in the platform config directory, or an explicit path),
//! then environment variables. The result is handed to the adapter, the
//! access gate and the admin console.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::adapter::{DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub policy: UsagePolicy,
    #[serde(default)]
    pub admin: AdminConfig,
    /// Where the local store and the activity log live.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_GEMINI_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

/// The remote lead store, or its explicit absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteConfig {
    #[default]
    Disabled,
    Supabase { url: String, anon_key: String },
}

impl RemoteConfig {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePolicy {
    /// Local generations allowed per feature when no remote store is set.
    #[serde(default = "default_free_uses")]
    pub free_uses_per_feature: u64,
    /// `usage_limit` given to newly registered remote leads.
    #[serde(default = "default_remote_limit")]
    pub default_remote_limit: u64,
}

impl Default for UsagePolicy {
    fn default() -> Self {
        Self {
            free_uses_per_feature: default_free_uses(),
            default_remote_limit: default_remote_limit(),
        }
    }
}

const fn default_free_uses() -> u64 {
    1
}

const fn default_remote_limit() -> u64 {
    1
}

/// With neither value set the admin surface stays locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub url_key: Option<String>,
    /// WhatsApp number users are sent to once their free uses run out.
    #[serde(default)]
    pub support_contact: Option<String>,
}

impl AppConfig {
    /// Defaults, then the TOML file, then the process environment.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.generation.api_key = Some(key);
        }
        if let Some(base) = get("GEMINI_API_BASE") {
            self.generation.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("CODEPROMPT_MODEL") {
            self.generation.model = model;
        }
        if let (Some(url), Some(anon_key)) = (
            get("CODEPROMPT_SUPABASE_URL"),
            get("CODEPROMPT_SUPABASE_ANON_KEY"),
        ) {
            self.remote = RemoteConfig::Supabase { url, anon_key };
        }
        if let Some(uses) = get("CODEPROMPT_FREE_USES").and_then(|raw| raw.parse::<u64>().ok()) {
            self.policy.free_uses_per_feature = uses;
        }
        if let Some(password) = get("CODEPROMPT_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
        if let Some(url_key) = get("CODEPROMPT_ADMIN_KEY") {
            self.admin.url_key = Some(url_key);
        }
        if let Some(contact) = get("CODEPROMPT_SUPPORT_CONTACT") {
            self.admin.support_contact = Some(contact);
        }
        if let Some(dir) = get("CODEPROMPT_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.generation
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = self.data_dir.as_ref() {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".codeprompt"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "codeprompt")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
