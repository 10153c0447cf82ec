//! Directory-backed description store

use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use super::{Description, Manifest};

const MANIFEST: &str = "manifest.json";

fn name_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = PATTERN.get() {
        return Ok(pattern);
    }

    let pattern =
        Regex::new(r"^[A-Za-z0-9_.:-]+$").map_err(|e| Error::Internal(e.to_string()))?;
    Ok(PATTERN.get_or_init(|| pattern))
}

/// Check that a description name is safe to use as a directory name
pub fn validate_name(name: &str) -> Result<()> {
    if name.starts_with('.') || !name_pattern()?.is_match(name) {
        return Err(Error::InvalidDescriptionName(name.to_string()));
    }
    Ok(())
}

/// Store of descriptions, one sub-directory each
pub struct DescriptionStore {
    base_path: PathBuf,
}

impl DescriptionStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn description_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.description_path(name).join(MANIFEST)
    }

    /// Load a description's file scopes from its manifest
    ///
    /// A missing or unreadable store is `StoreUnavailable`; a readable store
    /// without the named manifest is `DescriptionNotFound`.
    pub fn load(&self, name: &str) -> Result<Description> {
        validate_name(name)?;

        if std::fs::read_dir(&self.base_path).is_err() {
            return Err(Error::StoreUnavailable(self.base_path.clone()));
        }

        let manifest_path = self.manifest_path(name);
        if !manifest_path.is_file() {
            return Err(Error::DescriptionNotFound(name.to_string()));
        }

        debug!("Loading description manifest {:?}", manifest_path);
        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;

        Ok(Description::from_manifest(
            name.to_string(),
            self.description_path(name),
            manifest,
        ))
    }

    /// Names of all stored descriptions, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.base_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().join(MANIFEST).is_file() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}
