//! Reference resolution.
//!
//! [`resolve`] turns a [`RawTree`] into a [`Store`]. It never touches the
//! filesystem and never fails: dangling references are tolerated and
//! recorded.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::warn;

use lds_types::{Diagnostic, Group, Layer, PrimaryGroup, User, UserRecord};

use crate::store::Store;
use crate::tree::{RawGroup, RawLayer, RawTree, RawUser};

/// Link raw records into a store generation rooted at `dir`.
///
/// - Groups and users are indexed by key; on duplicate keys the last record
///   wins and a duplicate diagnostic is recorded.
/// - A user's primary group is resolved when the group exists, and kept as
///   [`PrimaryGroup::Unresolved`] (with a warning) otherwise.
/// - A user's declared groups are de-duplicated; each one that exists gets
///   the user appended to its `members`, the rest are dropped with a warning.
/// - Layer member ids that name no user are dropped silently.
pub fn resolve(dir: &Path, raw: RawTree) -> Store {
    let RawTree {
        users: raw_users,
        groups: raw_groups,
        layers: raw_layers,
        mut diagnostics,
    } = raw;

    let mut groups = index_groups(raw_groups, &mut diagnostics);
    let records = index_users(raw_users, &mut diagnostics);

    // BTreeMap iteration is uid-ordered, so members come out sorted.
    let mut users = BTreeMap::new();
    for (uid, record) in records {
        let user = link_user(uid, record, &mut groups, &mut diagnostics);
        users.insert(user.uid.clone(), user);
    }

    let layers = raw_layers
        .into_iter()
        .map(|RawLayer { id, members }| {
            let resolved = members
                .into_iter()
                .filter(|uid| users.contains_key(uid))
                .collect();
            (
                id.clone(),
                Layer {
                    id,
                    users: resolved,
                },
            )
        })
        .collect();

    diagnostics.sort();

    Store {
        dir: dir.to_path_buf(),
        users,
        groups,
        layers,
        diagnostics,
    }
}

fn index_groups(raw: Vec<RawGroup>, diagnostics: &mut Vec<Diagnostic>) -> BTreeMap<String, Group> {
    let mut groups = BTreeMap::new();
    for RawGroup { cn, record } in raw {
        let group = Group {
            cn: cn.clone(),
            gid_number: record.gid_number,
            members: Vec::new(),
            attributes: record.attributes,
        };
        if groups.insert(cn.clone(), group).is_some() {
            warn!(group = %cn, "duplicate group, keeping last record");
            diagnostics.push(Diagnostic::DuplicateGroup { cn });
        }
    }
    groups
}

fn index_users(raw: Vec<RawUser>, diagnostics: &mut Vec<Diagnostic>) -> BTreeMap<String, UserRecord> {
    let mut records = BTreeMap::new();
    for RawUser { uid, record } in raw {
        if records.insert(uid.clone(), record).is_some() {
            warn!(%uid, "duplicate user, keeping last record");
            diagnostics.push(Diagnostic::DuplicateUser { uid });
        }
    }
    records
}

fn link_user(
    uid: String,
    record: UserRecord,
    groups: &mut BTreeMap<String, Group>,
    diagnostics: &mut Vec<Diagnostic>,
) -> User {
    let primary_group = record.primary_group.map(|cn| {
        if groups.contains_key(&cn) {
            PrimaryGroup::Resolved(cn)
        } else {
            warn!(%uid, group = %cn, "primary group not found");
            diagnostics.push(Diagnostic::DanglingPrimaryGroup {
                uid: uid.clone(),
                group: cn.clone(),
            });
            PrimaryGroup::Unresolved(cn)
        }
    });

    let declared: BTreeSet<String> = record.groups.into_iter().collect();
    let mut resolved = BTreeSet::new();
    for cn in declared {
        match groups.get_mut(&cn) {
            Some(group) => {
                group.members.push(uid.clone());
                resolved.insert(cn);
            }
            None => {
                warn!(%uid, group = %cn, "group not found");
                diagnostics.push(Diagnostic::DanglingGroup {
                    uid: uid.clone(),
                    group: cn,
                });
            }
        }
    }

    User {
        cn: uid.clone(),
        uid,
        public_keys: record.public_keys,
        primary_group,
        groups: resolved,
        attributes: record.attributes,
    }
}
