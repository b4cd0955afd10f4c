//! Resource pools (`pve:pool:Pool`).

use crate::error::Result;
use crate::schema::{FieldSchema, ResourceSchema};
use crate::value::PropertyMap;

use super::{string_at, ResourceKind, ResourceModel};

pub const DEFAULT_POOL_COMMENT: &str = "Default pool comment";

const POOL_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("name")
        .required()
        .force_replace()
        .describe("The name of the Proxmox pool."),
    FieldSchema::string("comment")
        .with_default(DEFAULT_POOL_COMMENT)
        .describe("An optional comment for the pool."),
];

pub static POOL_SCHEMA: ResourceSchema = ResourceSchema {
    type_token: "pve:pool:Pool",
    description: "A pool grouping virtual machines under a common name.",
    fields: POOL_FIELDS,
    delete_before_replace: true,
};

/// Desired state of a resource pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolInputs {
    pub name: String,
    pub comment: String,
}

impl PoolInputs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: DEFAULT_POOL_COMMENT.to_string(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

impl ResourceModel for PoolInputs {
    const KIND: ResourceKind = ResourceKind::Pool;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::properties_from_json;
    use serde_json::json;

    #[test]
    fn test_default_comment() {
        let props = properties_from_json(json!({ "name": "ci" }));
        let pool = PoolInputs::from_properties(&props).unwrap();
        assert_eq!(pool.comment, DEFAULT_POOL_COMMENT);
        assert_eq!(pool, PoolInputs::new("ci"));
    }

    #[test]
    fn test_explicit_comment() {
        let props = properties_from_json(json!({ "name": "ci", "comment": "runners" }));
        let pool = PoolInputs::from_properties(&props).unwrap();
        assert_eq!(pool.comment, "runners");
    }
}
