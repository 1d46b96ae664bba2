//! Live-reloading LDAP directory.
//!
//! A [`Directory`] owns the current [`Store`](lds_store::Store) generation
//! and keeps it in step with the directory tree it was initialized on. A
//! [`Query`] handle answers lookups, layer membership, group listing and
//! layer credential checks against whatever generation is current.
//!
//! # Guarantees
//!
//! - Queries never observe a partially built store: a generation becomes
//!   visible in one swap, after it is fully resolved.
//! - A failed reload leaves the previous generation in place.
//! - Reloads are serialized and bursts of changes are coalesced.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> lds_directory::DirectoryResult<()> {
//! use lds_directory::{Directory, DirectoryConfig};
//!
//! let directory = Directory::new(DirectoryConfig::default());
//! directory.initialize("/srv/ldap").await?;
//!
//! let keys = directory.query().public_keys("alice")?;
//! # let _ = keys;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod query;
pub mod snapshot;
mod watch;

pub use auth::{EnvSecrets, LayerAuth, SecretSource, StaticSecrets};
pub use config::DirectoryConfig;
pub use controller::{Directory, ReloadStatus, State};
pub use error::{AuthError, DirectoryError, DirectoryResult};
pub use query::{Groups, LayerUsers, Query};
pub use snapshot::Snapshot;
