//! Test fixtures: descriptions on a temp dir backed by an in-memory archiver

use crate::archive::fake::FakeArchiver;
use crate::description::{Description, FileScope, ScopeName, SystemFile};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use super::archive_index::ArchiveIndex;
use super::path;
use super::reader::ContentReader;
use super::tree::PathTree;
use super::view::DescriptionView;

pub(crate) struct Fixture {
    pub _dir: TempDir,
    pub description: Description,
    pub archiver: Arc<FakeArchiver>,
    pub tree: Arc<PathTree>,
    pub index: Arc<ArchiveIndex>,
}

impl Fixture {
    pub fn builder() -> FixtureBuilder {
        let dir = tempdir().unwrap();
        let description = Description::new("fixture", dir.path().join("fixture"));
        fs::create_dir_all(&description.path).unwrap();
        FixtureBuilder {
            dir,
            description,
            archiver: FakeArchiver::new(),
        }
    }

    pub fn reader(&self) -> ContentReader {
        ContentReader::new(
            self.description.clone(),
            self.tree.clone(),
            self.index.clone(),
            self.archiver.clone(),
        )
    }

    pub fn view(&self) -> DescriptionView {
        DescriptionView::open(self.description.clone(), self.archiver.clone()).unwrap()
    }
}

pub(crate) struct FixtureBuilder {
    dir: TempDir,
    description: Description,
    archiver: FakeArchiver,
}

fn touch(file: &Path) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    if !file.exists() {
        fs::write(file, b"").unwrap();
    }
}

impl FixtureBuilder {
    fn loose(mut self, scope: ScopeName, name: &str, content: &[u8]) -> Self {
        let file = self.description.loose_file(scope, name);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, content).unwrap();

        let slot = match scope {
            ScopeName::ConfigFiles => &mut self.description.config_files,
            ScopeName::ChangedManagedFiles => &mut self.description.changed_managed_files,
            ScopeName::UnmanagedFiles => &mut self.description.unmanaged_files,
        };
        slot.get_or_insert_with(|| FileScope {
            extracted: true,
            files: Vec::new(),
        })
        .files
            .push(SystemFile::new(name));
        self
    }

    pub fn config_file(self, name: &str, content: &[u8]) -> Self {
        self.loose(ScopeName::ConfigFiles, name, content)
    }

    pub fn changed_managed_file(self, name: &str, content: &[u8]) -> Self {
        self.loose(ScopeName::ChangedManagedFiles, name, content)
    }

    /// Mark a scope as captured without file bytes
    pub fn unextracted(mut self, scope: ScopeName) -> Self {
        let slot = match scope {
            ScopeName::ConfigFiles => &mut self.description.config_files,
            ScopeName::ChangedManagedFiles => &mut self.description.changed_managed_files,
            ScopeName::UnmanagedFiles => &mut self.description.unmanaged_files,
        };
        slot.get_or_insert_with(FileScope::default).extracted = false;
        self
    }

    pub fn flat_member(mut self, name: &str, content: &[u8]) -> Self {
        let archive = self.description.flat_archive();
        touch(&archive);
        self.archiver.add(archive, path::relative(name), content);
        self
    }

    pub fn flat_dir(mut self, name: &str) -> Self {
        let archive = self.description.flat_archive();
        touch(&archive);
        self.archiver
            .add(archive, &format!("{}/", path::relative(name)), b"");
        self
    }

    /// Add a member to `trees/<archive>`, creating the archive file
    pub fn tree_member(mut self, archive: &str, name: &str, content: &[u8]) -> Self {
        let archive = self.description.trees_dir().join(archive);
        touch(&archive);
        self.archiver.add(archive, path::relative(name), content);
        self
    }

    pub fn tree_dir(mut self, archive: &str, name: &str) -> Self {
        let archive = self.description.trees_dir().join(archive);
        touch(&archive);
        self.archiver
            .add(archive, &format!("{}/", path::relative(name)), b"");
        self
    }

    pub fn build(self) -> Fixture {
        let archiver = Arc::new(self.archiver);
        let tree = Arc::new(PathTree::build(&self.description, archiver.as_ref()).unwrap());
        let index = Arc::new(ArchiveIndex::new(
            self.description.trees_dir(),
            archiver.clone(),
        ));

        Fixture {
            _dir: self.dir,
            description: self.description,
            archiver,
            tree,
            index,
        }
    }
}
