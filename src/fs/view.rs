//! Merged view of a description
//!
//! Combines the static path tree and the archive index into the four
//! questions a filesystem binding asks: what is in this directory, is this
//! a file, does this exist, and what are its bytes.

use crate::archive::Archiver;
use crate::description::Description;
use crate::error::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::archive_index::ArchiveIndex;
use super::path::{self, ROOT};
use super::reader::ContentReader;
use super::tree::PathTree;

/// Read-only view over all backing stores of one description
pub struct DescriptionView {
    tree: Arc<PathTree>,
    index: Arc<ArchiveIndex>,
    reader: ContentReader,
}

impl DescriptionView {
    /// Build the view; reads the flat archive table of contents once
    pub fn open(description: Description, archiver: Arc<dyn Archiver>) -> Result<Self> {
        let tree = Arc::new(PathTree::build(&description, archiver.as_ref())?);
        debug!(
            "Opening view of '{}' with {} static entries",
            description.name,
            tree.static_entries().len()
        );
        let index = Arc::new(ArchiveIndex::new(description.trees_dir(), archiver.clone()));
        let reader = ContentReader::new(description, tree.clone(), index.clone(), archiver);

        Ok(Self {
            tree,
            index,
            reader,
        })
    }

    /// Child names of `dir`, without duplicates or empty names
    pub fn list_directory(&self, dir: &str) -> Result<Vec<String>> {
        let listing = self.index.listing(dir)?;

        let mut names = self.tree.list_children(dir);
        if dir == ROOT {
            names.extend(self.index.top_level_directories()?);
        }
        names.extend(path::children(dir, listing.iter().map(|e| e.path.as_str())));

        let mut seen = HashSet::new();
        names.retain(|name| !name.is_empty() && seen.insert(name.clone()));
        Ok(names)
    }

    /// True if `path` is enumerated as a file by a static scope or an archive
    pub fn is_file(&self, path: &str) -> Result<bool> {
        if path == ROOT {
            return Ok(false);
        }
        if self.tree.contains_file(path) {
            return Ok(true);
        }

        let listing = self.index.listing(path::parent(path))?;
        Ok(listing.iter().any(|entry| entry.is_file() && entry.path == path))
    }

    /// Everything that is not an enumerated file is a directory
    pub fn is_directory(&self, path: &str) -> Result<bool> {
        Ok(!self.is_file(path)?)
    }

    /// True for the root, for files, and for names listed in the parent
    pub fn exists(&self, path: &str) -> Result<bool> {
        if path == ROOT || self.is_file(path)? {
            return Ok(true);
        }

        let name = path::file_name(path);
        Ok(self
            .list_directory(path::parent(path))?
            .iter()
            .any(|child| child == name))
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.reader.read(path)
    }

    pub fn size_hint(&self, path: &str) -> Option<u64> {
        self.reader.size_hint(path)
    }
}
