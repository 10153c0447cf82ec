//! FUSE filesystem implementation
//!
//! Serves a description as a read-only tree. Loose files, the flat
//! unmanaged archive and the per-directory `trees` archives are merged
//! into one namespace:
//! - `tree`: statically known entries
//! - `archive_index`: lazily resolved `trees` listings
//! - `reader`: byte access for any file
//! - `view`: the merged listing/type/read contract
//! - `filesystem`: the `fuser` binding on top of the view

mod archive_index;
mod filesystem;
mod handle;
mod inode;
pub mod path;
mod reader;
mod tree;
mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use archive_index::{ArchiveIndex, Listing};
pub use filesystem::DescriptionFs;
pub use handle::{HandleManager, OpenFile};
pub use inode::{InodeTable, Node, NodeKind, ROOT_INO};
pub use path::{Entry, EntryKind};
pub use reader::{Backing, ContentReader};
pub use tree::PathTree;
pub use view::DescriptionView;
