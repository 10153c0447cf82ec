//! Static path tree
//!
//! Everything that can be enumerated up front: loose files of extracted
//! scopes and the table of contents of the flat unmanaged archive. Built
//! once when the session starts and never changed afterwards.

use crate::archive::Archiver;
use crate::description::{Description, ScopeName};
use crate::error::Result;
use std::collections::HashSet;
use tracing::{debug, info};

use super::path::{self, Entry};

/// Scopes whose loose files are served, in lookup order
const LOOSE_SCOPES: [ScopeName; 2] = [ScopeName::ConfigFiles, ScopeName::ChangedManagedFiles];

/// Flat namespace of statically known entries
pub struct PathTree {
    config_files: HashSet<String>,
    changed_managed_files: HashSet<String>,
    /// File members of the flat unmanaged archive
    unmanaged_files: HashSet<String>,
    /// Union of all of the above plus archive directory markers, in discovery order
    entries: Vec<Entry>,
}

impl PathTree {
    /// Collect static entries from a description
    pub fn build(description: &Description, archiver: &dyn Archiver) -> Result<Self> {
        let mut tree = PathTree {
            config_files: HashSet::new(),
            changed_managed_files: HashSet::new(),
            unmanaged_files: HashSet::new(),
            entries: Vec::new(),
        };

        for scope in LOOSE_SCOPES {
            let files = match description.scope(scope) {
                Some(files) if files.extracted => files,
                Some(_) => {
                    debug!("{} not extracted, not advertising its files", scope);
                    continue;
                }
                None => continue,
            };

            for file in &files.files {
                let inserted = match scope {
                    ScopeName::ConfigFiles => tree.config_files.insert(file.name.clone()),
                    _ => tree.changed_managed_files.insert(file.name.clone()),
                };
                if inserted {
                    tree.entries.push(Entry::file(file.name.clone()));
                }
            }
        }

        let flat_archive = description.flat_archive();
        if flat_archive.is_file() {
            for member in archiver.list(&flat_archive)? {
                let Some(entry) = Entry::from_member(&member) else {
                    continue;
                };
                if entry.is_file() {
                    tree.unmanaged_files.insert(entry.path.clone());
                }
                tree.entries.push(entry);
            }
        }

        info!(
            "Static tree: {} config, {} changed managed, {} flat unmanaged files",
            tree.config_files.len(),
            tree.changed_managed_files.len(),
            tree.unmanaged_files.len()
        );

        Ok(tree)
    }

    pub fn static_entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Immediate child names under `dir`
    pub fn list_children(&self, dir: &str) -> Vec<String> {
        path::children(dir, self.entries.iter().map(|e| e.path.as_str()))
    }

    /// First static scope advertising `path` as a file
    pub fn scope_of(&self, path: &str) -> Option<ScopeName> {
        if self.config_files.contains(path) {
            Some(ScopeName::ConfigFiles)
        } else if self.changed_managed_files.contains(path) {
            Some(ScopeName::ChangedManagedFiles)
        } else if self.unmanaged_files.contains(path) {
            Some(ScopeName::UnmanagedFiles)
        } else {
            None
        }
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.scope_of(path).is_some()
    }
}
