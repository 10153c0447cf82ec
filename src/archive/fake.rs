//! In-memory archiver for tests

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Archiver;

/// Serves archive members from memory and counts every call
#[derive(Default)]
pub struct FakeArchiver {
    archives: HashMap<PathBuf, Vec<(String, Vec<u8>)>>,
    lists: AtomicUsize,
    extracts: AtomicUsize,
    listed: Mutex<Vec<PathBuf>>,
}

impl FakeArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member; directory members end with `/`
    pub fn add(&mut self, archive: impl Into<PathBuf>, member: &str, content: &[u8]) {
        self.archives
            .entry(archive.into())
            .or_default()
            .push((member.to_string(), content.to_vec()));
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extracts.load(Ordering::SeqCst)
    }

    /// Archives whose table of contents was requested, in call order
    pub fn listed(&self) -> Vec<PathBuf> {
        self.listed.lock().clone()
    }
}

impl Archiver for FakeArchiver {
    fn list(&self, archive: &Path) -> Result<Vec<String>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.listed.lock().push(archive.to_path_buf());

        let members = self.archives.get(archive).ok_or_else(|| Error::ExtractionFailed {
            archive: archive.to_path_buf(),
            reason: "unknown archive".to_string(),
        })?;
        Ok(members.iter().map(|(name, _)| name.clone()).collect())
    }

    fn extract(&self, archive: &Path, member: &str) -> Result<Vec<u8>> {
        self.extracts.fetch_add(1, Ordering::SeqCst);

        self.archives
            .get(archive)
            .and_then(|members| members.iter().find(|(name, _)| name == member))
            .map(|(_, content)| content.clone())
            .ok_or_else(|| Error::ExtractionFailed {
                archive: archive.to_path_buf(),
                reason: format!("{}: Not found in archive", member),
            })
    }
}
