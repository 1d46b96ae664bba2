//! Read-only queries over the current store generation.
//!
//! Queries never wait on a reload: each one reads whatever generation is
//! current when it is issued. The sequence-producing queries capture that
//! generation and keep serving it until they are exhausted.

use std::iter::FusedIterator;
use std::sync::Arc;
use std::vec;

use lds_store::Store;
use lds_types::{Group, Layer, User};

use crate::auth::LayerAuth;
use crate::error::{AuthError, DirectoryError, DirectoryResult};
use crate::snapshot::Snapshot;

/// A cloneable query handle onto a directory's snapshot.
#[derive(Clone, Debug)]
pub struct Query {
    snapshot: Arc<Snapshot>,
    auth: LayerAuth,
}

impl Query {
    pub fn new(snapshot: Arc<Snapshot>, auth: LayerAuth) -> Self {
        Self { snapshot, auth }
    }

    /// The generation queries are currently answered from.
    pub fn store(&self) -> DirectoryResult<Arc<Store>> {
        self.snapshot.load().ok_or(DirectoryError::NotReady)
    }

    pub fn find_user(&self, uid: &str) -> DirectoryResult<Option<User>> {
        Ok(self.store()?.user(uid).cloned())
    }

    pub fn find_layer(&self, id: &str) -> DirectoryResult<Option<Layer>> {
        Ok(self.store()?.layer(id).cloned())
    }

    /// A user's public keys: `None` for an unknown user, possibly empty otherwise.
    pub fn public_keys(&self, uid: &str) -> DirectoryResult<Option<Vec<String>>> {
        Ok(self.store()?.user(uid).map(|user| user.public_keys.clone()))
    }

    /// Check a layer credential. Independent of the loaded store, so this
    /// works before the first load completes.
    pub fn authenticate(&self, layer: &str, credential: &str) -> Result<String, AuthError> {
        self.auth.authenticate(layer, credential)
    }

    /// Member users of a layer. An unknown layer yields an empty sequence.
    pub fn layer_users(&self, id: &str) -> DirectoryResult<LayerUsers> {
        let store = self.store()?;
        let uids = store
            .layer(id)
            .map(|layer| layer.users.clone())
            .unwrap_or_default();
        Ok(LayerUsers {
            store,
            uids: uids.into_iter(),
        })
    }

    /// Every loaded group, ordered by cn.
    pub fn groups(&self) -> DirectoryResult<Groups> {
        let store = self.store()?;
        let cns: Vec<String> = store.groups().map(|group| group.cn.clone()).collect();
        Ok(Groups {
            store,
            cns: cns.into_iter(),
        })
    }
}

/// One-shot sequence of a layer's users. `None` marks the end.
#[derive(Debug)]
pub struct LayerUsers {
    store: Arc<Store>,
    uids: vec::IntoIter<String>,
}

impl Iterator for LayerUsers {
    type Item = User;

    fn next(&mut self) -> Option<User> {
        // Layer members always resolve within their own generation.
        self.uids
            .by_ref()
            .find_map(|uid| self.store.user(&uid).cloned())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.uids.len()))
    }
}

impl FusedIterator for LayerUsers {}

/// One-shot sequence of all groups. `None` marks the end.
#[derive(Debug)]
pub struct Groups {
    store: Arc<Store>,
    cns: vec::IntoIter<String>,
}

impl Iterator for Groups {
    type Item = Group;

    fn next(&mut self) -> Option<Group> {
        self.cns
            .by_ref()
            .find_map(|cn| self.store.group(&cn).cloned())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cns.len()))
    }
}

impl FusedIterator for Groups {}
