//! Foundation types for the LDAP directory store (LDS).
//!
//! This crate provides the record schemas read from the directory tree and
//! the resolved entities served to LDAP clients. Every other LDS crate depends
//! on `lds-types`.
//!
//! # Key Types
//!
//! - [`User`] -- A resolved user entry, keyed by `uid`
//! - [`Group`] -- A resolved POSIX group, keyed by `cn`
//! - [`Layer`] -- An authorization layer with an explicit member list
//! - [`PrimaryGroup`] -- A user's default group, resolved or left dangling
//! - [`UserRecord`] / [`GroupRecord`] -- The YAML schemas of `users/` and `groups/` files
//! - [`Diagnostic`] -- A non-fatal data-quality finding recorded during a load
//! - [`id_from_filename`] -- The filename-to-identifier rule

pub mod diagnostic;
pub mod entity;
pub mod error;
pub mod id;
pub mod record;

pub use diagnostic::{Diagnostic, SkipReason};
pub use entity::{Group, Layer, PrimaryGroup, User};
pub use error::TypeError;
pub use id::id_from_filename;
pub use record::{GroupRecord, UserRecord};
