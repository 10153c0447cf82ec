//! Archive access
//!
//! Captured unmanaged files live in gzip-compressed tarballs. descfs never
//! unpacks them to disk; it asks an external archive tool for a table of
//! contents or for a single member streamed to stdout.

mod tar;

#[cfg(test)]
pub(crate) mod fake;

pub use tar::TarArchiver;

use crate::error::Result;
use std::path::Path;

/// Table-of-contents and single-member access to an archive
pub trait Archiver: Send + Sync {
    /// Member names as the archive records them (relative, `/`-terminated for directories)
    fn list(&self, archive: &Path) -> Result<Vec<String>>;

    /// Bytes of one member; `member` is relative (no leading `/`)
    fn extract(&self, archive: &Path, member: &str) -> Result<Vec<u8>>;
}
