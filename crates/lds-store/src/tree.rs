//! Loading the three top-level record collections.

use std::path::Path;

use tracing::{debug, warn};

use lds_types::{id_from_filename, Diagnostic, GroupRecord, SkipReason, TypeError, UserRecord};

use crate::error::{StoreError, StoreResult};
use crate::scan::{join_reporting, scan_dir, Contents, Entry};

pub const USERS_DIR: &str = "users";
pub const GROUPS_DIR: &str = "groups";
pub const LAYERS_DIR: &str = "layers";

/// A decoded user file, not yet linked to any group.
#[derive(Clone, Debug, PartialEq)]
pub struct RawUser {
    pub uid: String,
    pub record: UserRecord,
}

/// A decoded group file.
#[derive(Clone, Debug, PartialEq)]
pub struct RawGroup {
    pub cn: String,
    pub record: GroupRecord,
}

/// A layer directory and the member ids found in it, sorted and de-duplicated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLayer {
    pub id: String,
    pub members: Vec<String>,
}

/// Everything read from a directory tree, before reference resolution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTree {
    pub users: Vec<RawUser>,
    pub groups: Vec<RawGroup>,
    pub layers: Vec<RawLayer>,
    /// Records dropped while loading (skipped groups).
    pub diagnostics: Vec<Diagnostic>,
}

/// Load users, groups and layers from `root` concurrently.
///
/// All three branches run to completion. Every failing branch is logged and
/// the first one (users, then groups, then layers) fails the whole load.
pub async fn load_tree(root: &Path) -> StoreResult<RawTree> {
    let (users, groups, layers) =
        tokio::join!(load_users(root), load_groups(root), load_layers(root));

    for err in [users.as_ref().err(), groups.as_ref().err(), layers.as_ref().err()]
        .into_iter()
        .flatten()
    {
        warn!(root = %root.display(), error = %err, "tree load branch failed");
    }
    let users = users?;
    let (groups, diagnostics) = groups?;
    let layers = layers?;

    debug!(
        root = %root.display(),
        users = users.len(),
        groups = groups.len(),
        layers = layers.len(),
        "directory tree loaded"
    );

    Ok(RawTree {
        users,
        groups,
        layers,
        diagnostics,
    })
}

async fn load_users(root: &Path) -> StoreResult<Vec<RawUser>> {
    let dir = root.join(USERS_DIR);
    scan_dir(&dir, Contents::Read, |entry| match entry {
        Entry::File {
            name,
            contents: Some(text),
        } => {
            let record = UserRecord::parse(&text).map_err(|source| StoreError::Parse {
                path: dir.join(&name),
                source,
            })?;
            Ok(Some(RawUser {
                uid: id_from_filename(&name).to_string(),
                record,
            }))
        }
        other => {
            debug!(dir = %dir.display(), name = other.name(), "skipping non-file user entry");
            Ok(None)
        }
    })
    .await
}

async fn load_groups(root: &Path) -> StoreResult<(Vec<RawGroup>, Vec<Diagnostic>)> {
    let dir = root.join(GROUPS_DIR);
    let loaded = scan_dir(&dir, Contents::Read, |entry| match entry {
        Entry::File {
            name,
            contents: Some(text),
        } => {
            let cn = id_from_filename(&name).to_string();
            match GroupRecord::parse(&text) {
                Ok(record) => Ok(Some(Ok(RawGroup { cn, record }))),
                Err(err) => {
                    let reason = match err {
                        TypeError::MissingField(_) => SkipReason::MissingGidNumber,
                        TypeError::Yaml(e) => SkipReason::Malformed(e.to_string()),
                    };
                    warn!(group = %cn, %reason, "omitting group");
                    Ok(Some(Err(Diagnostic::GroupSkipped { cn, reason })))
                }
            }
        }
        other => {
            debug!(dir = %dir.display(), name = other.name(), "skipping non-file group entry");
            Ok(None)
        }
    })
    .await?;

    let mut groups = Vec::with_capacity(loaded.len());
    let mut skipped = Vec::new();
    for item in loaded {
        match item {
            Ok(group) => groups.push(group),
            Err(diagnostic) => skipped.push(diagnostic),
        }
    }
    Ok((groups, skipped))
}

async fn load_layers(root: &Path) -> StoreResult<Vec<RawLayer>> {
    let dir = root.join(LAYERS_DIR);
    let stubs = scan_dir(&dir, Contents::Skip, |entry| match entry {
        Entry::Dir { name } | Entry::Symlink { name } => Ok(Some(name)),
        Entry::File { name, .. } => {
            debug!(dir = %dir.display(), %name, "skipping file in layers directory");
            Ok(None)
        }
    })
    .await?;

    join_reporting(stubs.into_iter().map(|id| {
        let layer_dir = dir.join(&id);
        async move {
            let mut members = scan_dir(&layer_dir, Contents::Skip, |entry| {
                Ok(Some(id_from_filename(entry.name()).to_string()))
            })
            .await?;
            members.sort();
            members.dedup();
            Ok::<_, StoreError>(RawLayer { id, members })
        }
    }))
    .await
}
