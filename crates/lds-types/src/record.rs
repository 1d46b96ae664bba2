//! On-disk record schemas.
//!
//! Files under `users/` and `groups/` are YAML mappings. Only the keys the
//! directory interprets are typed; every other key is carried through in
//! `attributes` so LDAP clients still see it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Schema of a `users/<uid>.<ext>` file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// SSH public keys, one per line-free string.
    #[serde(default)]
    pub public_keys: Vec<String>,
    /// Identifier (`cn`) of the user's default group.
    #[serde(default)]
    pub primary_group: Option<String>,
    /// Identifiers (`cn`) of the groups the user belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
}

impl UserRecord {
    /// Decode a user record from YAML text.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        let mut record: UserRecord = serde_yaml::from_str(text)?;
        // Identity comes from the filename, never from the file body.
        record.attributes.remove("uid");
        record.attributes.remove("cn");
        Ok(record)
    }
}

/// Schema of a `groups/<cn>.<ext>` file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub gid_number: u32,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
}

/// Intermediate shape used to tell a missing `gidNumber` apart from a
/// malformed one.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialGroupRecord {
    #[serde(default)]
    gid_number: Option<u32>,
    #[serde(flatten)]
    attributes: BTreeMap<String, serde_yaml::Value>,
}

impl GroupRecord {
    /// Decode a group record from YAML text.
    ///
    /// Returns [`TypeError::MissingField`] when the mapping has no
    /// `gidNumber`, and [`TypeError::Yaml`] for anything that is not a valid
    /// group mapping.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        let partial: PartialGroupRecord = serde_yaml::from_str(text)?;
        let gid_number = partial
            .gid_number
            .ok_or(TypeError::MissingField("gidNumber"))?;

        let mut attributes = partial.attributes;
        attributes.remove("cn");
        attributes.remove("members");
        Ok(Self {
            gid_number,
            attributes,
        })
    }
}
