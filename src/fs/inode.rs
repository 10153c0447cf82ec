//! Inode table
//!
//! FUSE addresses entries by inode number; the view addresses them by
//! virtual path. Inodes are handed out on first lookup and stay stable
//! for the rest of the session.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use super::path::ROOT;

/// Inode number of the mount root
pub const ROOT_INO: u64 = 1;

/// Block size reported for every entry
const BLOCK_SIZE: u32 = 4096;

/// Kind of a node; the only metadata the view distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    pub fn to_fuser_type(&self) -> fuser::FileType {
        match self {
            NodeKind::File => fuser::FileType::RegularFile,
            NodeKind::Directory => fuser::FileType::Directory,
        }
    }

    fn perm(&self) -> u16 {
        match self {
            NodeKind::File => 0o444,
            NodeKind::Directory => 0o555,
        }
    }

    fn nlink(&self) -> u32 {
        match self {
            NodeKind::File => 1,
            NodeKind::Directory => 2,
        }
    }
}

/// A looked-up entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub ino: u64,
    pub parent: u64,
    /// Virtual path
    pub path: String,
    pub kind: NodeKind,
    /// Size if known without extraction, else 0
    pub size: u64,
}

impl Node {
    pub fn root() -> Self {
        Self {
            ino: ROOT_INO,
            parent: ROOT_INO,
            path: ROOT.to_string(),
            kind: NodeKind::Directory,
            size: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Convert to fuser FileAttr
    pub fn to_fuser_attr(&self, uid: u32, gid: u32, time: SystemTime) -> fuser::FileAttr {
        fuser::FileAttr {
            ino: self.ino,
            size: self.size,
            blocks: (self.size + 511) / 512,
            atime: time,
            mtime: time,
            ctime: time,
            crtime: time,
            kind: self.kind.to_fuser_type(),
            perm: self.kind.perm(),
            nlink: self.kind.nlink(),
            uid,
            gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }
}

/// Maps inode numbers to nodes and paths back to inode numbers
pub struct InodeTable {
    /// Next inode number
    next_ino: AtomicU64,
    /// ino -> node
    nodes: RwLock<HashMap<u64, Node>>,
    /// Virtual path -> ino
    by_path: RwLock<HashMap<String, u64>>,
}

impl InodeTable {
    pub fn new() -> Self {
        let root = Node::root();
        let table = Self {
            next_ino: AtomicU64::new(ROOT_INO + 1),
            nodes: RwLock::new(HashMap::new()),
            by_path: RwLock::new(HashMap::new()),
        };

        table.by_path.write().insert(root.path.clone(), root.ino);
        table.nodes.write().insert(root.ino, root);
        table
    }

    pub fn get(&self, ino: u64) -> Option<Node> {
        self.nodes.read().get(&ino).cloned()
    }

    pub fn get_by_path(&self, path: &str) -> Option<Node> {
        let ino = self.by_path.read().get(path).copied()?;
        self.get(ino)
    }

    /// Return the node registered for `path`, registering it if new
    pub fn get_or_insert(&self, parent: u64, path: String, kind: NodeKind, size: u64) -> Node {
        let mut by_path = self.by_path.write();
        if let Some(ino) = by_path.get(&path).copied() {
            if let Some(node) = self.get(ino) {
                return node;
            }
        }

        let ino = self.next_ino.fetch_add(1, Ordering::SeqCst);
        let node = Node {
            ino,
            parent,
            path: path.clone(),
            kind,
            size,
        };

        by_path.insert(path, ino);
        self.nodes.write().insert(ino, node.clone());
        node
    }

    /// Number of registered nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
