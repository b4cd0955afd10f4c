//! Roles (`pve:role:Role`).

use crate::error::Result;
use crate::schema::{FieldSchema, FieldType, ResourceSchema};
use crate::value::{PropertyMap, PropertyValue};

use super::{string_at, strings_at, ResourceKind, ResourceModel};

const ROLE_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("name")
        .required()
        .force_replace()
        .describe("The name of the Proxmox role."),
    FieldSchema::array("privileges", &FieldType::String)
        .describe("Privileges granted by this role (e.g. VM.PowerMgmt)."),
];

pub static ROLE_SCHEMA: ResourceSchema = ResourceSchema {
    type_token: "pve:role:Role",
    description: "A named set of privileges.",
    fields: ROLE_FIELDS,
    delete_before_replace: false,
};

/// Desired state of a role. Privilege order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInputs {
    pub name: String,
    pub privileges: Vec<String>,
}

impl RoleInputs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privileges: Vec::new(),
        }
    }

    pub fn with_privileges<I, S>(mut self, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.privileges = privileges.into_iter().map(Into::into).collect();
        self
    }
}

impl ResourceModel for RoleInputs {
    const KIND: ResourceKind = ResourceKind::Role;

    fn to_properties(&self) -> PropertyMap {
        let privileges: Vec<PropertyValue> =
            self.privileges.iter().map(|p| p.clone().into()).collect();

        let mut props = PropertyMap::new();
        props.insert("name".into(), self.name.clone().into());
        props.insert("privileges".into(), privileges.into());
        props
    }

    fn from_validated(props: &PropertyMap) -> Result<Self> {
        Ok(Self::new(string_at(Self::KIND, props, "name")?)
            .with_privileges(strings_at(props, "privileges")?))
    }
}
