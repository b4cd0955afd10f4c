//! Resource models.
//!
//! Each resource kind is a plain immutable value type paired with a static
//! [`ResourceSchema`]. [`Resource`] is the closed union the adapter works
//! with; untyped property maps only enter through
//! [`Resource::from_properties`], which validates them against the schema.

mod acl;
mod file;
mod group;
mod ha;
mod pool;
mod provider;
mod role;

pub use acl::{AclInputs, AclType, ACL_SCHEMA};
pub use file::{FileInputs, FileSourceRaw, FILE_SCHEMA};
pub use group::{GroupInputs, DEFAULT_GROUP_COMMENT, GROUP_SCHEMA};
pub use ha::{HaInputs, HaState, HA_SCHEMA};
pub use pool::{PoolInputs, DEFAULT_POOL_COMMENT, POOL_SCHEMA};
pub use provider::{
    ProviderConfig, ENV_SSH_PASS, ENV_SSH_USER, ENV_TOKEN, ENV_URL, ENV_USER, PROVIDER_SCHEMA,
};
pub use role::{RoleInputs, ROLE_SCHEMA};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProviderError, Result};
use crate::schema::ResourceSchema;
use crate::value::{lookup, PropertyMap, PropertyValue};

/// The resource kinds this provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Provider configuration (endpoint and credentials)
    Provider,
    /// A file uploaded to a datastore
    File,
    /// A resource pool
    Pool,
    /// A user group
    Group,
    /// A role with a set of privileges
    Role,
    /// An access control entry
    Acl,
    /// High availability management of a virtual machine
    Ha,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Provider,
        ResourceKind::File,
        ResourceKind::Pool,
        ResourceKind::Group,
        ResourceKind::Role,
        ResourceKind::Acl,
        ResourceKind::Ha,
    ];

    pub fn schema(&self) -> &'static ResourceSchema {
        match self {
            ResourceKind::Provider => &PROVIDER_SCHEMA,
            ResourceKind::File => &FILE_SCHEMA,
            ResourceKind::Pool => &POOL_SCHEMA,
            ResourceKind::Group => &GROUP_SCHEMA,
            ResourceKind::Role => &ROLE_SCHEMA,
            ResourceKind::Acl => &ACL_SCHEMA,
            ResourceKind::Ha => &HA_SCHEMA,
        }
    }

    pub fn type_token(&self) -> &'static str {
        self.schema().type_token
    }

    /// Resolve a host type token back to a kind.
    pub fn from_type_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_token() == token)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_token())
    }
}

/// Conversion between a typed model and its property map.
pub trait ResourceModel: Sized {
    const KIND: ResourceKind;

    /// Serialize into properties; secret fields become secret handles.
    fn to_properties(&self) -> PropertyMap;

    /// Build from properties that already passed schema validation.
    fn from_validated(props: &PropertyMap) -> Result<Self>;

    /// Apply schema defaults, validate, and build the model.
    fn from_properties(props: &PropertyMap) -> Result<Self> {
        let schema = Self::KIND.schema();
        let mut props = props.clone();
        schema.apply_defaults(&mut props);
        schema.validate(&props)?;
        Self::from_validated(&props)
    }
}

/// Desired state of one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Provider(ProviderConfig),
    File(FileInputs),
    Pool(PoolInputs),
    Group(GroupInputs),
    Role(RoleInputs),
    Acl(AclInputs),
    Ha(HaInputs),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Provider(_) => ResourceKind::Provider,
            Resource::File(_) => ResourceKind::File,
            Resource::Pool(_) => ResourceKind::Pool,
            Resource::Group(_) => ResourceKind::Group,
            Resource::Role(_) => ResourceKind::Role,
            Resource::Acl(_) => ResourceKind::Acl,
            Resource::Ha(_) => ResourceKind::Ha,
        }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.kind().schema()
    }

    pub fn to_properties(&self) -> PropertyMap {
        match self {
            Resource::Provider(config) => config.to_properties(),
            Resource::File(file) => file.to_properties(),
            Resource::Pool(pool) => pool.to_properties(),
            Resource::Group(group) => group.to_properties(),
            Resource::Role(role) => role.to_properties(),
            Resource::Acl(acl) => acl.to_properties(),
            Resource::Ha(ha) => ha.to_properties(),
        }
    }

    /// Validate an untyped property map and build the matching variant.
    pub fn from_properties(kind: ResourceKind, props: &PropertyMap) -> Result<Self> {
        Ok(match kind {
            ResourceKind::Provider => Resource::Provider(ProviderConfig::from_properties(props)?),
            ResourceKind::File => Resource::File(FileInputs::from_properties(props)?),
            ResourceKind::Pool => Resource::Pool(PoolInputs::from_properties(props)?),
            ResourceKind::Group => Resource::Group(GroupInputs::from_properties(props)?),
            ResourceKind::Role => Resource::Role(RoleInputs::from_properties(props)?),
            ResourceKind::Acl => Resource::Acl(AclInputs::from_properties(props)?),
            ResourceKind::Ha => Resource::Ha(HaInputs::from_properties(props)?),
        })
    }
}

impl From<ProviderConfig> for Resource {
    fn from(value: ProviderConfig) -> Self {
        Resource::Provider(value)
    }
}

impl From<FileInputs> for Resource {
    fn from(value: FileInputs) -> Self {
        Resource::File(value)
    }
}

impl From<PoolInputs> for Resource {
    fn from(value: PoolInputs) -> Self {
        Resource::Pool(value)
    }
}

impl From<GroupInputs> for Resource {
    fn from(value: GroupInputs) -> Self {
        Resource::Group(value)
    }
}

impl From<RoleInputs> for Resource {
    fn from(value: RoleInputs) -> Self {
        Resource::Role(value)
    }
}

impl From<AclInputs> for Resource {
    fn from(value: AclInputs) -> Self {
        Resource::Acl(value)
    }
}

impl From<HaInputs> for Resource {
    fn from(value: HaInputs) -> Self {
        Resource::Ha(value)
    }
}

/// Read a string property at a dotted path, looking through secret handles.
pub(crate) fn string_at(kind: ResourceKind, props: &PropertyMap, path: &str) -> Result<String> {
    optional_string_at(props, path)?.ok_or_else(|| ProviderError::missing(kind.type_token(), path))
}

/// Read an optional string property; absent and null both yield `None`.
pub(crate) fn optional_string_at(props: &PropertyMap, path: &str) -> Result<Option<String>> {
    match lookup(props, path) {
        None | Some(PropertyValue::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ProviderError::mismatch(path, "string", value.type_name())),
    }
}

/// Read a whole-number property.
pub(crate) fn integer_at(kind: ResourceKind, props: &PropertyMap, path: &str) -> Result<i64> {
    let value = lookup(props, path).ok_or_else(|| ProviderError::missing(kind.type_token(), path))?;
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 && n.is_finite() => Ok(n as i64),
        Some(n) => Err(ProviderError::mismatch(path, "integer", n.to_string())),
        None => Err(ProviderError::mismatch(path, "integer", value.type_name())),
    }
}

/// Read an optional boolean property, falling back to `default`.
pub(crate) fn bool_at(props: &PropertyMap, path: &str, default: bool) -> Result<bool> {
    match lookup(props, path) {
        None | Some(PropertyValue::Null) => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| ProviderError::mismatch(path, "bool", value.type_name())),
    }
}

/// Read an optional list of strings; absent yields an empty list.
pub(crate) fn strings_at(props: &PropertyMap, path: &str) -> Result<Vec<String>> {
    let items = match lookup(props, path) {
        None | Some(PropertyValue::Null) => return Ok(Vec::new()),
        Some(value) => value
            .as_array()
            .ok_or_else(|| ProviderError::mismatch(path, "array", value.type_name()))?,
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ProviderError::mismatch(format!("{}[{}]", path, i), "string", item.type_name())
            })
        })
        .collect()
}

/// Check that `value` is one of the `allowed` keywords.
pub(crate) fn one_of(path: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ProviderError::mismatch(
            path,
            format!("one of {}", allowed.join(", ")),
            value,
        ))
    }
}
