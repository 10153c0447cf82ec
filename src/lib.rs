//! descfs - Read-only FUSE view of captured system descriptions
//!
//! A description holds the files captured from an inspected system as
//! loose copies, one flat archive, or a tree of per-directory archives.
//! This library mounts all of them as a single browsable directory tree
//! and extracts archive members only when they are read.

pub mod archive;
pub mod config;
pub mod description;
pub mod error;
pub mod fs;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archive::{Archiver, TarArchiver};
    pub use crate::config::Config;
    pub use crate::description::{Description, DescriptionStore};
    pub use crate::error::{Error, Result};
    pub use crate::fs::DescriptionView;
    pub use crate::session::MountSession;
}
