//! Archive index for the per-directory `trees` layout
//!
//! Large directories of unmanaged files are captured as one archive each,
//! stored at `trees/<relative-dir>.tgz`. A directory without its own
//! archive lives inside the nearest ancestor that has one, so both
//! listing and ownership lookups walk parent paths until they hit an
//! archive or the root.
//!
//! Results are memoized in lock-free-per-shard maps. Two callback threads
//! racing on the same uncached key may both compute it; the first value
//! stored wins and both return that value.

use crate::archive::Archiver;
use crate::error::Result;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::path::{self, Entry, ROOT};

/// Archive suffix for per-directory archives
pub const ARCHIVE_SUFFIX: &str = ".tgz";

/// Shared, immutable listing
pub type Listing = Arc<Vec<Entry>>;

/// Lazily built view over the `trees` archives
pub struct ArchiveIndex {
    /// Root of the `trees` layout on disk
    trees_root: PathBuf,
    /// Table-of-contents provider
    archiver: Arc<dyn Archiver>,
    /// Directory path -> visible archive entries
    listings: DashMap<String, Listing>,
    /// Leaf path -> owning archive
    owners: DashMap<String, Option<PathBuf>>,
}

impl ArchiveIndex {
    pub fn new(trees_root: impl Into<PathBuf>, archiver: Arc<dyn Archiver>) -> Self {
        Self {
            trees_root: trees_root.into(),
            archiver,
            listings: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    /// On-disk location mirroring a virtual directory
    fn location(&self, dir: &str) -> PathBuf {
        self.trees_root.join(path::relative(dir))
    }

    /// Archive that would hold the subtree of a virtual directory
    fn archive_for(&self, dir: &str) -> PathBuf {
        let mut archive = self.location(dir).into_os_string();
        archive.push(ARCHIVE_SUFFIX);
        PathBuf::from(archive)
    }

    /// Entries visible under `dir`, derived only from archives
    ///
    /// The root never has archive entries. A directory with no mirror
    /// directory under `trees` shares the listing of the nearest ancestor
    /// that has one; every path visited on the way is cached with it.
    pub fn listing(&self, dir: &str) -> Result<Listing> {
        let mut walked = Vec::new();
        let mut current = dir;

        let listing = loop {
            if current == ROOT {
                break Listing::default();
            }

            if let Some(hit) = self.listings.get(current) {
                debug!("archive listing cache hit for {}", current);
                break hit.value().clone();
            }

            let location = self.location(current);
            if location.is_dir() {
                let scanned = Arc::new(self.scan(current, &location)?);
                break self.store(current, scanned);
            }

            walked.push(current);
            current = path::parent(current);
        };

        let mut result = listing.clone();
        for (i, key) in walked.into_iter().enumerate() {
            let stored = self.store(key, listing.clone());
            if i == 0 {
                result = stored;
            }
        }

        debug!("{}: {} entries, {} listings cached", dir, result.len(), self.cached_listings());
        Ok(result)
    }

    /// Archive holding the bytes of `path`, if any ancestor has one
    pub fn owner_of(&self, leaf: &str) -> Option<PathBuf> {
        if let Some(hit) = self.owners.get(leaf) {
            return hit.value().clone();
        }

        let mut current = leaf;
        let owner = loop {
            if current == ROOT {
                break None;
            }

            let archive = self.archive_for(current);
            if archive.is_file() {
                break Some(archive);
            }

            current = path::parent(current);
        };

        debug!("archive owner of {}: {:?}", leaf, owner);
        self.owners
            .entry(leaf.to_string())
            .or_insert(owner)
            .value()
            .clone()
    }

    /// Names of the directories directly under the `trees` root
    pub fn top_level_directories(&self) -> Result<Vec<String>> {
        if !self.trees_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for child in std::fs::read_dir(&self.trees_root)? {
            let child = child?;
            if child.path().is_dir() {
                names.push(child.file_name().to_string_lossy().to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Number of cached directory listings
    pub fn cached_listings(&self) -> usize {
        self.listings.len()
    }

    fn store(&self, key: &str, listing: Listing) -> Listing {
        self.listings
            .entry(key.to_string())
            .or_insert(listing)
            .value()
            .clone()
    }

    /// Read a mirror directory: sub-directories plus the contents of every archive
    fn scan(&self, dir: &str, location: &Path) -> Result<Vec<Entry>> {
        debug!("scanning {:?} for {}", location, dir);

        let mut children = std::fs::read_dir(location)?.collect::<std::io::Result<Vec<_>>>()?;
        children.sort_by_key(|child| child.file_name());

        let mut entries = Vec::new();
        for child in children {
            let child_path = child.path();
            let name = child.file_name().to_string_lossy().to_string();

            if child_path.is_dir() {
                entries.push(Entry::directory(path::join(dir, &name)));
            }

            if name.ends_with(ARCHIVE_SUFFIX) && child_path.is_file() {
                let members = self.archiver.list(&child_path)?;
                entries.extend(members.iter().filter_map(|m| Entry::from_member(m)));
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::fake::FakeArchiver;
    use crate::error::Error;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Trees {
        dir: TempDir,
        archiver: FakeArchiver,
    }

    impl Trees {
        fn new() -> Self {
            Self {
                dir: tempdir().unwrap(),
                archiver: FakeArchiver::new(),
            }
        }

        fn root(&self) -> PathBuf {
            self.dir.path().join("trees")
        }

        fn archive(&mut self, relative: &str, members: &[&str]) -> PathBuf {
            let archive = self.root().join(relative);
            fs::create_dir_all(archive.parent().unwrap()).unwrap();
            fs::write(&archive, b"").unwrap();
            for member in members {
                self.archiver.add(&archive, member, b"data");
            }
            archive
        }

        fn mkdir(&self, relative: &str) {
            fs::create_dir_all(self.root().join(relative)).unwrap();
        }

        fn build(self) -> (TempDir, Arc<FakeArchiver>, ArchiveIndex) {
            let root = self.root();
            let archiver = Arc::new(self.archiver);
            let index = ArchiveIndex::new(root, archiver.clone());
            (self.dir, archiver, index)
        }
    }

    #[test]
    fn test_root_listing_is_empty() {
        let mut trees = Trees::new();
        trees.archive("var/log.tgz", &["var/log/messages"]);
        let (_dir, archiver, index) = trees.build();

        assert!(index.listing("/").unwrap().is_empty());
        assert_eq!(archiver.list_calls(), 0);
    }

    #[test]
    fn test_listing_resolves_through_parent_archive() {
        let mut trees = Trees::new();
        let log = trees.archive("var/log.tgz", &["var/log/messages"]);
        trees.archive("var.tgz", &["var/spool/mail"]);
        let (_dir, archiver, index) = trees.build();

        let listing = index.listing("/var/log").unwrap();
        assert_eq!(*listing, vec![Entry::file("/var/log/messages")]);
        assert_eq!(archiver.listed(), vec![log]);
    }

    #[test]
    fn test_listing_of_nested_directory_without_archive() {
        let mut trees = Trees::new();
        trees.archive("var/log.tgz", &["var/log/messages", "var/log/sub/", "var/log/sub/a"]);
        let (_dir, archiver, index) = trees.build();

        let log = index.listing("/var/log").unwrap();
        let sub = index.listing("/var/log/sub").unwrap();

        assert_eq!(log, sub);
        assert!(sub.contains(&Entry::directory("/var/log/sub")));
        assert!(sub.contains(&Entry::file("/var/log/sub/a")));
        assert_eq!(archiver.list_calls(), 1);
    }

    #[test]
    fn test_second_listing_is_a_cache_hit() {
        let mut trees = Trees::new();
        trees.archive("etc/ssh.tgz", &["etc/ssh/sshd_config"]);
        let (_dir, archiver, index) = trees.build();

        let first = index.listing("/etc/ssh").unwrap();
        let calls = archiver.list_calls();
        let second = index.listing("/etc/ssh").unwrap();

        assert_eq!(first, second);
        assert_eq!(archiver.list_calls(), calls);
        assert!(index.cached_listings() >= 2);
    }

    #[test]
    fn test_mirror_directory_lists_subdirectories_and_archives() {
        let mut trees = Trees::new();
        trees.mkdir("usr/share");
        trees.archive("usr/lib.tgz", &["usr/lib/", "usr/lib/libfoo.so"]);
        let (_dir, _archiver, index) = trees.build();

        let listing = index.listing("/usr").unwrap();
        assert_eq!(
            *listing,
            vec![
                Entry::directory("/usr/lib"),
                Entry::file("/usr/lib/libfoo.so"),
                Entry::directory("/usr/share"),
            ]
        );
    }

    #[test]
    fn test_unknown_path_walks_to_root() {
        let trees = Trees::new();
        let (_dir, archiver, index) = trees.build();

        assert!(index.listing("/does/not/exist").unwrap().is_empty());
        assert!(index.owner_of("/does/not/exist").is_none());
        assert_eq!(archiver.list_calls(), 0);
    }

    #[test]
    fn test_owner_of_finds_nearest_archive() {
        let mut trees = Trees::new();
        let log = trees.archive("var/log.tgz", &["var/log/messages"]);
        let var = trees.archive("var.tgz", &["var/spool/mail"]);
        let (_dir, _archiver, index) = trees.build();

        assert_eq!(index.owner_of("/var/log/messages"), Some(log.clone()));
        assert_eq!(index.owner_of("/var/log/sub/deep"), Some(log));
        assert_eq!(index.owner_of("/var/spool/mail"), Some(var));
        assert_eq!(index.owner_of("/etc/passwd"), None);
    }

    #[test]
    fn test_extraction_errors_are_not_cached() {
        let mut trees = Trees::new();
        trees.mkdir("opt");
        fs::write(trees.root().join("opt/broken.tgz"), b"").unwrap();
        let (_dir, archiver, index) = trees.build();

        assert!(matches!(index.listing("/opt"), Err(Error::ExtractionFailed { .. })));
        assert!(matches!(index.listing("/opt"), Err(Error::ExtractionFailed { .. })));
        assert_eq!(archiver.list_calls(), 2);
        assert_eq!(index.cached_listings(), 0);
    }

    #[test]
    fn test_concurrent_listings_agree() {
        let mut trees = Trees::new();
        trees.archive("srv/www.tgz", &["srv/www/index.html", "srv/www/img/logo.png"]);
        let (_dir, _archiver, index) = trees.build();
        let index = Arc::new(index);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = index.clone();
                std::thread::spawn(move || {
                    let dir = if i % 2 == 0 { "/srv/www" } else { "/srv/www/img" };
                    index.listing(dir).unwrap()
                })
            })
            .collect();

        let results: Vec<Listing> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for listing in &results {
            assert_eq!(listing, &results[0]);
        }
        assert_eq!(*index.listing("/srv/www").unwrap(), *results[0]);
    }

    #[test]
    fn test_top_level_directories() {
        let mut trees = Trees::new();
        trees.mkdir("var");
        trees.mkdir("etc");
        trees.archive("opt.tgz", &["opt/app"]);
        let (_dir, _archiver, index) = trees.build();

        assert_eq!(index.top_level_directories().unwrap(), vec!["etc", "var"]);
    }

    #[test]
    fn test_top_level_directories_without_trees() {
        let trees = Trees::new();
        let (_dir, _archiver, index) = trees.build();

        assert!(index.top_level_directories().unwrap().is_empty());
    }
}
