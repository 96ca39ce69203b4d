use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::features::{FeatureTag, Identity, UsageRecord};

pub const IDENTITY_DOCUMENT: &str = "identity.json";
pub const USAGE_DOCUMENT: &str = "usage.json";

/// Local persistence for the registered identity and per-feature counters.
///
/// Both documents are read and written whole. Writes land in a temp file in
/// the same directory and are renamed over the target. A missing document
/// reads as empty; one that exists but does not parse is an error, so usage
/// counters never silently reset.
#[derive(Debug, Clone)]
pub struct LocalUsageStore {
    dir: PathBuf,
}

impl LocalUsageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// An unreadable identity document reads as unregistered.
    pub fn identity(&self) -> Option<Identity> {
        read_document(&self.dir.join(IDENTITY_DOCUMENT))
            .ok()
            .flatten()
    }

    /// Saves the identity once. Saving the same identity again is a no-op,
    /// saving a different one is refused.
    pub fn save_identity(&self, identity: &Identity) -> anyhow::Result<()> {
        if let Some(existing) = read_document::<Identity>(&self.dir.join(IDENTITY_DOCUMENT))? {
            if &existing == identity {
                return Ok(());
            }
            bail!(
                "an identity is already registered for '{}'",
                existing.contact_handle
            );
        }
        write_document(&self.dir.join(IDENTITY_DOCUMENT), identity)
    }

    pub fn usage(&self) -> anyhow::Result<UsageRecord> {
        Ok(read_document(&self.dir.join(USAGE_DOCUMENT))?.unwrap_or_default())
    }

    pub fn usage_count(&self, feature: FeatureTag) -> anyhow::Result<u64> {
        Ok(self.usage()?.count(feature))
    }

    /// Re-reads the usage document, bumps one counter and writes it back.
    /// A corrupt document is left untouched.
    pub fn increment(&self, feature: FeatureTag) -> anyhow::Result<u64> {
        let mut usage = self.usage()?;
        let count = usage.increment(feature);
        write_document(&self.dir.join(USAGE_DOCUMENT), &usage)?;
        Ok(count)
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .with_context(|| format!("corrupt document {}", path.display()))
}

fn write_document<T: Serialize>(path: &Path, payload: &T) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    let body = serde_json::to_string_pretty(payload)?;
    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to stage a write in {}", parent.display()))?;
    staged.write_all(body.as_bytes())?;
    staged.as_file().sync_all()?;
    staged
        .persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
