use std::fmt;

use serde::Serialize;

/// Why a group record was left out of a store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SkipReason {
    MissingGidNumber,
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGidNumber => write!(f, "missing gidNumber"),
            Self::Malformed(reason) => write!(f, "malformed record: {reason}"),
        }
    }
}

/// A non-fatal data-quality finding recorded while building a store.
///
/// Dangling layer members are intentionally absent: they are dropped without
/// any trace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    GroupSkipped { cn: String, reason: SkipReason },
    DanglingPrimaryGroup { uid: String, group: String },
    DanglingGroup { uid: String, group: String },
    DuplicateUser { uid: String },
    DuplicateGroup { cn: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupSkipped { cn, reason } => write!(f, "group {cn} skipped: {reason}"),
            Self::DanglingPrimaryGroup { uid, group } => {
                write!(f, "user {uid}: primary group {group} not found")
            }
            Self::DanglingGroup { uid, group } => write!(f, "user {uid}: group {group} not found"),
            Self::DuplicateUser { uid } => write!(f, "duplicate user {uid}, last record wins"),
            Self::DuplicateGroup { cn } => write!(f, "duplicate group {cn}, last record wins"),
        }
    }
}
