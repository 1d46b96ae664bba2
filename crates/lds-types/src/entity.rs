//! Resolved directory entities.
//!
//! Entities reference each other by key (`uid`, `cn`). A key stored in a
//! resolved field always names an entity of the same store generation;
//! anything that failed to resolve is either dropped or, for the primary
//! group, kept as [`PrimaryGroup::Unresolved`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// A user's default group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "cn", rename_all = "lowercase")]
pub enum PrimaryGroup {
    /// Names a group present in the same store.
    Resolved(String),
    /// The raw identifier from the record; no such group was loaded.
    Unresolved(String),
}

impl PrimaryGroup {
    /// The group identifier, resolved or not.
    pub fn cn(&self) -> &str {
        match self {
            Self::Resolved(cn) | Self::Unresolved(cn) => cn,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl fmt::Display for PrimaryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(cn) => write!(f, "{cn}"),
            Self::Unresolved(cn) => write!(f, "{cn} (unresolved)"),
        }
    }
}

/// A user entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    /// Always equal to `uid`.
    pub cn: String,
    /// Ordered, single-line public keys. Empty when the record has none.
    pub public_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_group: Option<PrimaryGroup>,
    /// Keys of the resolved groups this user belongs to.
    pub groups: BTreeSet<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
}

impl User {
    /// Create a user with no group links.
    pub fn new(uid: impl Into<String>, public_keys: Vec<String>) -> Self {
        let uid = uid.into();
        Self {
            cn: uid.clone(),
            uid,
            public_keys,
            primary_group: None,
            groups: BTreeSet::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Returns `true` if the user is a resolved member of `cn`.
    pub fn in_group(&self, cn: &str) -> bool {
        self.groups.contains(cn)
    }
}

/// A POSIX group entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub cn: String,
    pub gid_number: u32,
    /// Users whose `groups` resolved to this group, ordered by uid.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
}

impl Group {
    pub fn new(cn: impl Into<String>, gid_number: u32) -> Self {
        Self {
            cn: cn.into(),
            gid_number,
            members: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Members as an optional list: `None` when no user resolved into it.
    pub fn members(&self) -> Option<&[String]> {
        if self.members.is_empty() {
            None
        } else {
            Some(&self.members)
        }
    }
}

/// An authorization layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Layer {
    pub id: String,
    /// Keys of the resolved member users, ordered by uid.
    pub users: Vec<String>,
}

impl Layer {
    /// Create a layer stub with no members.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            users: Vec::new(),
        }
    }
}
