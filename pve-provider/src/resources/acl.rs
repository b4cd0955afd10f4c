//! Access control entries (`pve:acl:ACL`).

use std::fmt;
use std::str::FromStr;

use crate::error::{ProviderError, Result};
use crate::schema::{FieldSchema, ResourceSchema};
use crate::value::PropertyMap;

use super::{bool_at, one_of, string_at, ResourceKind, ResourceModel};

// An entry is identified by all of its fields, so any change replaces it.
const ACL_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("path")
        .required()
        .force_replace()
        .describe("The path of the ACL."),
    FieldSchema::string("roleid")
        .required()
        .force_replace()
        .describe("The role ID of the ACL."),
    FieldSchema::string("type")
        .required()
        .force_replace()
        .describe("The type of the ACL. Must be 'user', 'group', or 'token'."),
    FieldSchema::string("ugid")
        .required()
        .force_replace()
        .describe("The user/group/token ID of the ACL."),
    FieldSchema::bool("propagate")
        .force_replace()
        .with_default_bool(false)
        .describe("Whether the ACL should be propagated."),
];

pub static ACL_SCHEMA: ResourceSchema = ResourceSchema {
    type_token: "pve:acl:ACL",
    description: "An access control entry granting a role on a path.",
    fields: ACL_FIELDS,
    delete_before_replace: false,
};

/// Who an access control entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclType {
    User,
    Group,
    Token,
}

impl AclType {
    const NAMES: [&'static str; 3] = ["user", "group", "token"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AclType::User => "user",
            AclType::Group => "group",
            AclType::Token => "token",
        }
    }
}

impl fmt::Display for AclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AclType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        one_of("type", s, &Self::NAMES)?;
        Ok(match s {
            "user" => AclType::User,
            "group" => AclType::Group,
            _ => AclType::Token,
        })
    }
}

/// Desired state of an access control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclInputs {
    pub path: String,
    pub role_id: String,
    pub acl_type: AclType,
    pub ugid: String,
    pub propagate: bool,
}

impl AclInputs {
    pub fn new(
        path: impl Into<String>,
        role_id: impl Into<String>,
        acl_type: AclType,
        ugid: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            role_id: role_id.into(),
            acl_type,
            ugid: ugid.into(),
            propagate: false,
        }
    }

    pub fn with_propagate(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }
}

impl ResourceModel for AclInputs {
    const KIND: ResourceKind = ResourceKind::Acl;

    fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("path".into(), self.path.clone().into());
        props.insert("roleid".into(), self.role_id.clone().into());
        props.insert("type".into(), self.acl_type.as_str().into());
        props.insert("ugid".into(), self.ugid.clone().into());
        props.insert("propagate".into(), self.propagate.into());
        props
    }

    fn from_validated(props: &PropertyMap) -> Result<Self> {
        let acl_type = string_at(Self::KIND, props, "type")?.parse::<AclType>()?;
        Ok(Self::new(
            string_at(Self::KIND, props, "path")?,
            string_at(Self::KIND, props, "roleid")?,
            acl_type,
            string_at(Self::KIND, props, "ugid")?,
        )
        .with_propagate(bool_at(props, "propagate", false)?))
    }
}
