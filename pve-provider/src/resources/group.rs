//! User groups (`pve:group:Group`).

use crate::error::Result;
use crate::schema::{FieldSchema, ResourceSchema};
use crate::value::PropertyMap;

use super::{string_at, ResourceKind, ResourceModel};

pub const DEFAULT_GROUP_COMMENT: &str = "Default group comment";

const GROUP_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("name")
        .required()
        .force_replace()
        .describe("The name of the Proxmox group."),
    FieldSchema::string("comment")
        .with_default(DEFAULT_GROUP_COMMENT)
        .describe("An optional comment for the group."),
];

pub static GROUP_SCHEMA: ResourceSchema = ResourceSchema {
    type_token: "pve:group:Group",
    description: "A group of Proxmox users.",
    fields: GROUP_FIELDS,
    delete_before_replace: false,
};

/// Desired state of a user group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInputs {
    pub name: String,
    pub comment: String,
}

impl GroupInputs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: DEFAULT_GROUP_COMMENT.to_string(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

impl ResourceModel for GroupInputs {
    const KIND: ResourceKind = ResourceKind::Group;

    fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("name".into(), self.name.clone().into());
        props.insert("comment".into(), self.comment.clone().into());
        props
    }

    fn from_validated(props: &PropertyMap) -> Result<Self> {
        Ok(Self::new(string_at(Self::KIND, props, "name")?)
            .with_comment(string_at(Self::KIND, props, "comment")?))
    }
}
