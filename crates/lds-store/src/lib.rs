//! File-backed directory loading for the LDAP directory store.
//!
//! This crate turns a directory tree into one immutable, fully cross-linked
//! [`Store`] generation:
//!
//! ```text
//! <root>/users/<uid>.<ext>          YAML user record
//! <root>/groups/<cn>.<ext>          YAML group record (gidNumber required)
//! <root>/layers/<id>/<uid>.<ext>    membership entry, usually a symlink
//! ```
//!
//! # Pipeline
//!
//! - [`scan`] -- lists one directory level and maps each entry through a
//!   caller-supplied transform, failing fast on the first error
//! - [`tree`] -- runs the users, groups and layers scans concurrently and
//!   produces a [`RawTree`]
//! - [`resolve`] -- links raw records into a [`Store`]; pure and infallible
//!
//! # Design Rules
//!
//! 1. A store is built from scratch on every load. There is no incremental update.
//! 2. Structural I/O failures abort the whole load; no partial store escapes.
//! 3. A malformed user record is fatal; a malformed or incomplete group record
//!    is skipped and recorded as a [`Diagnostic`](lds_types::Diagnostic).
//! 4. Dangling references never fail a load.

pub mod error;
pub mod resolve;
pub mod scan;
pub mod store;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{StoreError, StoreResult};
pub use resolve::resolve;
pub use scan::{scan_dir, Contents, Entry};
pub use store::Store;
pub use tree::{load_tree, RawGroup, RawLayer, RawTree, RawUser, GROUPS_DIR, LAYERS_DIR, USERS_DIR};
