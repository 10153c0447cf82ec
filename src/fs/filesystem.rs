//! FUSE binding for a description view
//!
//! Translates inode-addressed FUSE callbacks into path-addressed view
//! queries. Every write-type callback fails with `EROFS`.

use fuser::{
    Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use super::handle::HandleManager;
use super::inode::{InodeTable, Node, NodeKind};
use super::path;
use super::view::DescriptionView;
use crate::error::{Error, Result};

/// FUSE filesystem serving one description
pub struct DescriptionFs {
    /// Merged view over all backing stores
    view: DescriptionView,
    /// Inode management
    inodes: InodeTable,
    /// Open file handles
    handles: HandleManager,
    /// Attribute/entry TTL
    ttl: Duration,
    /// Timestamp reported for every entry
    mounted_at: SystemTime,
    uid: u32,
    gid: u32,
}

impl DescriptionFs {
    pub fn new(view: DescriptionView, ttl: Duration) -> Self {
        Self {
            view,
            inodes: InodeTable::new(),
            handles: HandleManager::new(),
            ttl,
            mounted_at: SystemTime::now(),
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }

    fn node(&self, ino: u64) -> Result<Node> {
        self.inodes
            .get(ino)
            .ok_or_else(|| Error::NotFound(format!("inode {}", ino)))
    }

    fn attr(&self, node: &Node) -> fuser::FileAttr {
        node.to_fuser_attr(self.uid, self.gid, self.mounted_at)
    }

    /// Register (or reuse) the node for a child path
    fn child_node(&self, parent: u64, child: String) -> Result<Node> {
        if let Some(node) = self.inodes.get_by_path(&child) {
            return Ok(node);
        }

        let (kind, size) = if self.view.is_file(&child)? {
            (NodeKind::File, self.view.size_hint(&child).unwrap_or(0))
        } else {
            (NodeKind::Directory, 0)
        };
        Ok(self.inodes.get_or_insert(parent, child, kind, size))
    }

    /// Resolve `name` inside directory `parent`
    fn lookup_node(&self, parent: u64, name: &OsStr) -> Result<Node> {
        let parent = self.node(parent)?;
        if !parent.is_dir() {
            return Err(Error::NotADirectory(parent.path));
        }

        let name = name
            .to_str()
            .ok_or_else(|| Error::NotFound(name.to_string_lossy().to_string()))?;
        let child = path::join(&parent.path, name);

        if let Some(node) = self.inodes.get_by_path(&child) {
            return Ok(node);
        }
        if !self.view.exists(&child)? {
            return Err(Error::NotFound(child));
        }

        self.child_node(parent.ino, child)
    }

    /// Directory entries including `.` and `..`
    fn dir_entries(&self, ino: u64) -> Result<Vec<(u64, NodeKind, String)>> {
        let dir = self.node(ino)?;
        if !dir.is_dir() {
            return Err(Error::NotADirectory(dir.path));
        }

        let mut entries = vec![
            (dir.ino, NodeKind::Directory, ".".to_string()),
            (dir.parent, NodeKind::Directory, "..".to_string()),
        ];

        for name in self.view.list_directory(&dir.path)? {
            let child = self.child_node(dir.ino, path::join(&dir.path, &name))?;
            entries.push((child.ino, child.kind, name));
        }

        Ok(entries)
    }

    /// Extract a file into a new handle
    fn open_file(&self, ino: u64, flags: i32) -> Result<u64> {
        let node = self.node(ino)?;
        if node.is_dir() {
            return Err(Error::IsADirectory(node.path));
        }

        let accmode = flags & libc::O_ACCMODE;
        if accmode == libc::O_WRONLY || accmode == libc::O_RDWR {
            return Err(Error::Unsupported("open for writing"));
        }

        let content = self.view.read(&node.path)?;
        Ok(self.handles.open(content))
    }

    /// Log a failed callback and return its errno
    fn fail(&self, op: &str, err: Error) -> i32 {
        match err {
            Error::NotFound(_) => debug!("{}: {}", op, err),
            _ => warn!("{} failed: {}", op, err),
        }
        err.errno()
    }

    /// errno for a write-type request
    fn reject(&self, op: &'static str) -> i32 {
        self.fail(op, Error::Unsupported(op))
    }

    /// Write access is refused; anything else only needs a known inode
    fn check_access(&self, ino: u64, mask: i32) -> Result<()> {
        if mask & libc::W_OK != 0 {
            return Err(Error::Unsupported("write access"));
        }
        self.node(ino).map(|_| ())
    }
}

impl Filesystem for DescriptionFs {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        debug!("lookup(parent={}, name={:?})", parent, name);

        match self.lookup_node(parent, name) {
            Ok(node) => reply.entry(&self.ttl, &self.attr(&node), 0),
            Err(e) => reply.error(self.fail("lookup", e)),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        debug!("getattr(ino={})", ino);

        match self.node(ino) {
            Ok(node) => reply.attr(&self.ttl, &self.attr(&node)),
            Err(e) => reply.error(self.fail("getattr", e)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!("readdir(ino={}, offset={})", ino, offset);

        let entries = match self.dir_entries(ino) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(self.fail("readdir", e));
                return;
            }
        };

        let skip = offset.max(0) as usize;
        for (i, (child_ino, kind, name)) in entries.iter().enumerate().skip(skip) {
            let buffer_full = reply.add(*child_ino, (i + 1) as i64, kind.to_fuser_type(), name);
            if buffer_full {
                break;
            }
        }

        reply.ok();
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("open(ino={}, flags={})", ino, flags);

        match self.open_file(ino, flags) {
            // Archive members have no known size; bypass the page cache size check
            Ok(fh) => reply.opened(fh, fuser::consts::FOPEN_DIRECT_IO),
            Err(e) => reply.error(self.fail("open", e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!("read(ino={}, fh={}, offset={}, size={})", ino, fh, offset, size);

        match self.handles.read(fh, offset.max(0) as u64, size) {
            Some(data) => reply.data(&data),
            None => reply.error(libc::EBADF),
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.handles.close(fh);
        debug!(
            "release(ino={}, fh={}), {} handles open",
            ino,
            fh,
            self.handles.open_count()
        );
        reply.ok();
    }

    fn access(&mut self, _req: &Request, ino: u64, mask: i32, reply: ReplyEmpty) {
        debug!("access(ino={}, mask={})", ino, mask);

        match self.check_access(ino, mask) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(self.fail("access", e)),
        }
    }

    fn statfs(&mut self, _req: &Request, _ino: u64, reply: fuser::ReplyStatfs) {
        reply.statfs(
            0,                        // blocks
            0,                        // bfree
            0,                        // bavail
            self.inodes.len() as u64, // files
            0,                        // ffree
            4096,                     // bsize
            255,                      // namelen
            4096,                     // frsize
        );
    }

    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        debug!("setattr(ino={})", ino);
        reply.error(self.reject("setattr"));
    }

    fn mknod(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        debug!("mknod(parent={}, name={:?})", parent, name);
        reply.error(self.reject("mknod"));
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        debug!("mkdir(parent={}, name={:?})", parent, name);
        reply.error(self.reject("mkdir"));
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("unlink(parent={}, name={:?})", parent, name);
        reply.error(self.reject("unlink"));
    }

    fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("rmdir(parent={}, name={:?})", parent, name);
        reply.error(self.reject("rmdir"));
    }

    fn symlink(
        &mut self,
        _req: &Request,
        parent: u64,
        link_name: &OsStr,
        _target: &Path,
        reply: ReplyEntry,
    ) {
        debug!("symlink(parent={}, name={:?})", parent, link_name);
        reply.error(self.reject("symlink"));
    }

    fn rename(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        debug!("rename(parent={}, name={:?})", parent, name);
        reply.error(self.reject("rename"));
    }

    fn link(
        &mut self,
        _req: &Request,
        ino: u64,
        _newparent: u64,
        _newname: &OsStr,
        reply: ReplyEntry,
    ) {
        debug!("link(ino={})", ino);
        reply.error(self.reject("link"));
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        _offset: i64,
        _data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        debug!("write(ino={}, fh={})", ino, fh);
        reply.error(self.reject("write"));
    }

    fn create(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        debug!("create(parent={}, name={:?})", parent, name);
        reply.error(self.reject("create"));
    }
}
