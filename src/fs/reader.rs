//! Content reader
//!
//! Resolves a virtual file to the store that holds its bytes, then
//! fetches them. Nothing is cached: every archive read runs the archive
//! tool again.

use crate::archive::Archiver;
use crate::description::{Description, ScopeName};
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::archive_index::ArchiveIndex;
use super::path;
use super::tree::PathTree;

/// Where the bytes of a virtual file live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    /// Plain copy inside a scope's file store
    LooseFile(PathBuf),
    /// Member of the flat `files.tgz`
    FlatArchiveMember { archive: PathBuf, member: String },
    /// Member of a per-directory archive under `trees`
    TreeArchiveMember { archive: PathBuf, member: String },
}

/// Fetches file contents from whichever store owns them
pub struct ContentReader {
    description: Description,
    tree: Arc<PathTree>,
    index: Arc<ArchiveIndex>,
    archiver: Arc<dyn Archiver>,
}

impl ContentReader {
    pub fn new(
        description: Description,
        tree: Arc<PathTree>,
        index: Arc<ArchiveIndex>,
        archiver: Arc<dyn Archiver>,
    ) -> Self {
        Self {
            description,
            tree,
            index,
            archiver,
        }
    }

    /// Decide which store owns `path`
    pub fn resolve(&self, path: &str) -> Result<Backing> {
        let backing = match self.tree.scope_of(path) {
            Some(scope @ (ScopeName::ConfigFiles | ScopeName::ChangedManagedFiles)) => {
                Backing::LooseFile(self.description.loose_file(scope, path))
            }
            Some(ScopeName::UnmanagedFiles) => Backing::FlatArchiveMember {
                archive: self.description.flat_archive(),
                member: path::relative(path).to_string(),
            },
            None => match self.index.owner_of(path) {
                Some(archive) => Backing::TreeArchiveMember {
                    archive,
                    member: path::relative(path).to_string(),
                },
                None => return Err(Error::NotFound(path.to_string())),
            },
        };

        debug!("{} resolved to {:?}", path, backing);
        Ok(backing)
    }

    /// Full contents of `path`
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        match self.resolve(path)? {
            Backing::LooseFile(file) => Ok(std::fs::read(file)?),
            Backing::FlatArchiveMember { archive, member }
            | Backing::TreeArchiveMember { archive, member } => {
                self.archiver.extract(&archive, &member)
            }
        }
    }

    /// Size known without extraction (loose files only)
    pub fn size_hint(&self, path: &str) -> Option<u64> {
        match self.resolve(path).ok()? {
            Backing::LooseFile(file) => std::fs::metadata(file).ok().map(|m| m.len()),
            _ => None,
        }
    }
}
