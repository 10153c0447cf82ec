//! Virtual path helpers
//!
//! Virtual paths are absolute, `/`-separated strings. They are kept as
//! `String` rather than `PathBuf` because they name entries inside the
//! description, never locations on the host.

use std::collections::HashSet;

/// Root of the virtual namespace
pub const ROOT: &str = "/";

/// Kind of a virtual entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// A virtual path tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Convert an archive member name (`etc/motd`, `./etc/`, ...) into an entry
    pub fn from_member(member: &str) -> Option<Self> {
        let trimmed = member.trim_start_matches("./").trim_start_matches('/');
        let is_dir = trimmed.ends_with('/');
        let trimmed = trimmed.trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }

        let path = format!("/{}", trimmed);
        Some(if is_dir {
            Entry::directory(path)
        } else {
            Entry::file(path)
        })
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Parent of a virtual path; the root is its own parent
pub fn parent(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => ROOT,
        Some(idx) => &trimmed[..idx],
    }
}

/// Append a single component to a directory path
pub fn join(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Path without its leading separator, as archive members are named
pub fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Last component of a virtual path
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// First component of `entry` below `dir`, if `entry` is a proper descendant
pub fn child_segment<'a>(dir: &str, entry: &'a str) -> Option<&'a str> {
    let rest = if dir == ROOT {
        entry.strip_prefix('/')?
    } else {
        entry
            .strip_prefix(dir.trim_end_matches('/'))?
            .strip_prefix('/')?
    };

    rest.split('/').next().filter(|segment| !segment.is_empty())
}

/// Immediate child names of `dir` among `entries`, deduplicated, in first-seen order
pub fn children<'a>(dir: &str, entries: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for entry in entries {
        if let Some(segment) = child_segment(dir, entry) {
            if seen.insert(segment) {
                names.push(segment.to_string());
            }
        }
    }
    names
}
