//! System description model
//!
//! A description is a directory holding `manifest.json` plus one file
//! store per extracted scope. Only the file-bearing scopes are modelled
//! here; every other manifest section is ignored.

mod store;

pub use store::{validate_name, DescriptionStore};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the flat archive covering the unmanaged file set
pub const FLAT_ARCHIVE: &str = "files.tgz";

/// Directory holding per-directory archives of unmanaged files
pub const TREES_DIR: &str = "trees";

/// File-bearing scopes of a description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeName {
    ConfigFiles,
    ChangedManagedFiles,
    UnmanagedFiles,
}

impl ScopeName {
    /// Manifest key, also the file store directory name
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeName::ConfigFiles => "config_files",
            ScopeName::ChangedManagedFiles => "changed_managed_files",
            ScopeName::UnmanagedFiles => "unmanaged_files",
        }
    }
}

impl std::fmt::Display for ScopeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured file record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFile {
    /// Absolute path on the inspected system
    pub name: String,
}

impl SystemFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A scope that may carry file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileScope {
    /// Whether file bytes were captured (not only metadata)
    #[serde(default)]
    pub extracted: bool,

    /// Captured file records, in manifest order
    #[serde(default)]
    pub files: Vec<SystemFile>,
}

impl FileScope {
    pub fn extracted(files: impl IntoIterator<Item = SystemFile>) -> Self {
        Self {
            extracted: true,
            files: files.into_iter().collect(),
        }
    }
}

/// Manifest sections descfs reads
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Manifest {
    #[serde(default)]
    pub config_files: Option<FileScope>,
    #[serde(default)]
    pub changed_managed_files: Option<FileScope>,
    #[serde(default)]
    pub unmanaged_files: Option<FileScope>,
}

/// A loaded system description
#[derive(Debug, Clone)]
pub struct Description {
    /// Description name within its store
    pub name: String,
    /// Base directory of the description
    pub path: PathBuf,
    pub config_files: Option<FileScope>,
    pub changed_managed_files: Option<FileScope>,
    pub unmanaged_files: Option<FileScope>,
}

impl Description {
    /// Create an empty description rooted at `path`
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            config_files: None,
            changed_managed_files: None,
            unmanaged_files: None,
        }
    }

    pub(crate) fn from_manifest(name: String, path: PathBuf, manifest: Manifest) -> Self {
        Self {
            name,
            path,
            config_files: manifest.config_files,
            changed_managed_files: manifest.changed_managed_files,
            unmanaged_files: manifest.unmanaged_files,
        }
    }

    /// Get a scope by name, if the description contains it
    pub fn scope(&self, scope: ScopeName) -> Option<&FileScope> {
        match scope {
            ScopeName::ConfigFiles => self.config_files.as_ref(),
            ScopeName::ChangedManagedFiles => self.changed_managed_files.as_ref(),
            ScopeName::UnmanagedFiles => self.unmanaged_files.as_ref(),
        }
    }

    /// File store directory for a scope
    pub fn scope_dir(&self, scope: ScopeName) -> PathBuf {
        self.path.join(scope.as_str())
    }

    /// Flat archive holding unmanaged files (may not exist)
    pub fn flat_archive(&self) -> PathBuf {
        self.scope_dir(ScopeName::UnmanagedFiles).join(FLAT_ARCHIVE)
    }

    /// Root of the per-directory archive layout (may not exist)
    pub fn trees_dir(&self) -> PathBuf {
        self.scope_dir(ScopeName::UnmanagedFiles).join(TREES_DIR)
    }

    /// Location of a loose file captured in `scope`
    pub fn loose_file(&self, scope: ScopeName, virtual_path: &str) -> PathBuf {
        let relative = Path::new(virtual_path.trim_start_matches('/'));
        self.scope_dir(scope).join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let description = Description::new("web01", "/store/web01");

        assert_eq!(
            description.flat_archive(),
            PathBuf::from("/store/web01/unmanaged_files/files.tgz")
        );
        assert_eq!(
            description.trees_dir(),
            PathBuf::from("/store/web01/unmanaged_files/trees")
        );
        assert_eq!(
            description.loose_file(ScopeName::ConfigFiles, "/etc/cron.tab"),
            PathBuf::from("/store/web01/config_files/etc/cron.tab")
        );
    }

    #[test]
    fn test_manifest_ignores_other_scopes() {
        let json = r#"{
            "config_files": {
                "extracted": true,
                "files": [{ "name": "/etc/cron tab", "package_name": "cron", "mode": "644" }]
            },
            "groups": [{ "name": "audio" }],
            "meta": { "format_version": 3 }
        }"#;

        let manifest: Manifest = serde_json::from_str(json).unwrap();
        let description = Description::from_manifest("d".into(), "/d".into(), manifest);

        let config = description.scope(ScopeName::ConfigFiles).unwrap();
        assert!(config.extracted);
        assert_eq!(config.files, vec![SystemFile::new("/etc/cron tab")]);
        assert!(description.scope(ScopeName::UnmanagedFiles).is_none());
    }

    #[test]
    fn test_extracted_defaults_to_false() {
        let scope: FileScope = serde_json::from_str(r#"{ "files": [] }"#).unwrap();
        assert!(!scope.extracted);
    }
}
