use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use lds_types::{Diagnostic, Group, Layer, User};

use crate::error::{StoreError, StoreResult};
use crate::resolve::resolve;
use crate::tree::load_tree;

/// One immutable, fully linked generation of the directory.
///
/// Every key held in a resolved field (`User::groups`, a resolved
/// `User::primary_group`, `Group::members`, `Layer::users`) names an entity
/// of this same generation. Stores are never mutated after [`resolve`]
/// returns; a reload builds a new one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Store {
    pub(crate) dir: PathBuf,
    pub(crate) users: BTreeMap<String, User>,
    pub(crate) groups: BTreeMap<String, Group>,
    pub(crate) layers: BTreeMap<String, Layer>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Store {
    /// Load and resolve the tree rooted at `dir`.
    pub async fn load(dir: &Path) -> StoreResult<Self> {
        let raw = load_tree(dir).await?;
        Ok(resolve(dir, raw))
    }

    /// Like [`Store::load`], but fail with [`StoreError::Timeout`] if the
    /// filesystem pass takes longer than `limit`.
    pub async fn load_within(dir: &Path, limit: Option<Duration>) -> StoreResult<Self> {
        match limit {
            None => Self::load(dir).await,
            Some(after) => tokio::time::timeout(after, Self::load(dir))
                .await
                .map_err(|_| StoreError::Timeout {
                    dir: dir.to_path_buf(),
                    after,
                })?,
        }
    }

    /// The source directory this generation was loaded from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn user(&self, uid: &str) -> Option<&User> {
        self.users.get(uid)
    }

    pub fn group(&self, cn: &str) -> Option<&Group> {
        self.groups.get(cn)
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// All users, ordered by uid.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// All groups, ordered by cn.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// All layers, ordered by id.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Member users of a layer. Empty if the layer does not exist.
    pub fn layer_members<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a User> + 'a {
        self.layers
            .get(id)
            .into_iter()
            .flat_map(|layer| layer.users.iter())
            .filter_map(|uid| self.users.get(uid))
    }

    /// Member users of a group. Empty if the group does not exist.
    pub fn group_members<'a>(&'a self, cn: &str) -> impl Iterator<Item = &'a User> + 'a {
        self.groups
            .get(cn)
            .into_iter()
            .flat_map(|group| group.members.iter())
            .filter_map(|uid| self.users.get(uid))
    }

    /// Non-fatal findings from loading this generation, sorted.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}
