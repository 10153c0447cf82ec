//! Open file handles
//!
//! A file is extracted once when it is opened; reads slice the buffered
//! bytes and `release` drops them. Reopening extracts again.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Represents an open file
pub struct OpenFile {
    /// Full file contents
    pub content: Vec<u8>,
}

impl OpenFile {
    pub fn new(content: Vec<u8>) -> Self {
        OpenFile { content }
    }

    /// Bytes in `[offset, offset + size)`, clamped to the end of the file
    pub fn slice(&self, offset: u64, size: u32) -> &[u8] {
        let len = self.content.len();
        let start = usize::try_from(offset).unwrap_or(len).min(len);
        let end = start.saturating_add(size as usize).min(len);
        &self.content[start..end]
    }
}

/// Manages open file handles
pub struct HandleManager {
    /// Next handle ID
    next_id: AtomicU64,
    /// Open handles
    handles: RwLock<HashMap<u64, OpenFile>>,
}

impl HandleManager {
    pub fn new() -> Self {
        HandleManager {
            next_id: AtomicU64::new(1),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Register an open file and return its handle ID
    pub fn open(&self, content: Vec<u8>) -> u64 {
        let fh = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handles.write().insert(fh, OpenFile::new(content));
        fh
    }

    /// Copy of the requested range, or None for an unknown handle
    pub fn read(&self, fh: u64, offset: u64, size: u32) -> Option<Vec<u8>> {
        self.handles
            .read()
            .get(&fh)
            .map(|file| file.slice(offset, size).to_vec())
    }

    pub fn close(&self, fh: u64) -> Option<OpenFile> {
        self.handles.write().remove(&fh)
    }

    /// Number of open handles
    pub fn open_count(&self) -> usize {
        self.handles.read().len()
    }
}

impl Default for HandleManager {
    fn default() -> Self {
        Self::new()
    }
}
