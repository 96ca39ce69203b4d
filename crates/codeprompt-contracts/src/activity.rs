use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::features::FeatureTag;
use crate::results::VideoOutputFormat;

/// Something the studio did that is worth a line in `activity.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    AccessDenied {
        feature: FeatureTag,
        decision: String,
    },
    GenerationSucceeded {
        feature: FeatureTag,
        service: String,
    },
    GenerationFailed {
        feature: FeatureTag,
        kind: String,
        message: String,
    },
    UsageRecorded {
        feature: FeatureTag,
        local_count: u64,
        remote: String,
    },
    StoryContinued {
        added_seconds: u32,
        format: VideoOutputFormat,
    },
}

impl ActivityEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "access_denied",
            Self::GenerationSucceeded { .. } => "generation_succeeded",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::UsageRecorded { .. } => "usage_recorded",
            Self::StoryContinued { .. } => "story_continued",
        }
    }
}

/// One line of the log. The envelope fields and the event fields are
/// disjoint, so an event can never rewrite `session_id`, `ts` or `tab`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub session_id: String,
    pub ts: String,
    pub tab: String,
    #[serde(flatten)]
    pub event: ActivityEvent,
}

/// Append-only writer for `activity.jsonl`, one compact record per line.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    inner: Arc<ActivityLogInner>,
}

#[derive(Debug)]
struct ActivityLogInner {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ActivityLogInner {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn record(&self, tab: &str, event: ActivityEvent) -> anyhow::Result<ActivityRecord> {
        let record = ActivityRecord {
            session_id: self.inner.session_id.clone(),
            ts: now_utc_iso(),
            tab: tab.to_string(),
            event,
        };

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(&record)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("activity log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(record)
    }
}

/// Reads every record back; lines that do not parse are skipped.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<ActivityRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(raw
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
