//! High availability management of a virtual machine (`pve:ha:Ha`).

use std::fmt;
use std::str::FromStr;

use crate::error::{ProviderError, Result};
use crate::schema::{FieldSchema, ResourceSchema};
use crate::value::PropertyMap;

use super::{integer_at, one_of, optional_string_at, string_at, ResourceKind, ResourceModel};

const HA_FIELDS: &[FieldSchema] = &[
    FieldSchema::number("resourceId")
        .required()
        .force_replace()
        .describe("The ID of the virtual machine that will be managed by HA."),
    FieldSchema::string("group").describe("The HA group identifier."),
    FieldSchema::string("state")
        .with_default("started")
        .describe("The state of the HA resource (default: started)."),
];

// A VM can only be under one HA entry at a time, so the old entry goes first.
pub static HA_SCHEMA: ResourceSchema = ResourceSchema {
    type_token: "pve:ha:Ha",
    description: "HA configuration of a virtual machine.",
    fields: HA_FIELDS,
    delete_before_replace: true,
};

/// Requested HA state of the managed virtual machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HaState {
    Ignored,
    #[default]
    Started,
    Stopped,
}

impl HaState {
    const NAMES: [&'static str; 3] = ["ignored", "started", "stopped"];

    pub fn as_str(&self) -> &'static str {
        match self {
            HaState::Ignored => "ignored",
            HaState::Started => "started",
            HaState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for HaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HaState {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        one_of("state", s, &Self::NAMES)?;
        Ok(match s {
            "ignored" => HaState::Ignored,
            "stopped" => HaState::Stopped,
            _ => HaState::Started,
        })
    }
}

/// Desired state of an HA entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaInputs {
    pub resource_id: i64,
    pub group: Option<String>,
    pub state: HaState,
}

impl HaInputs {
    pub fn new(resource_id: i64) -> Self {
        Self {
            resource_id,
            group: None,
            state: HaState::default(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_state(mut self, state: HaState) -> Self {
        self.state = state;
        self
    }
}

impl ResourceModel for HaInputs {
    const KIND: ResourceKind = ResourceKind::Ha;

    fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("resourceId".into(), self.resource_id.into());
        if let Some(group) = &self.group {
            props.insert("group".into(), group.clone().into());
        }
        props.insert("state".into(), self.state.as_str().into());
        props
    }

    fn from_validated(props: &PropertyMap) -> Result<Self> {
        Ok(Self {
            resource_id: integer_at(Self::KIND, props, "resourceId")?,
            group: optional_string_at(props, "group")?,
            state: string_at(Self::KIND, props, "state")?.parse::<HaState>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::properties_from_json;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let props = properties_from_json(json!({ "resourceId": 100 }));
        let ha = HaInputs::from_properties(&props).unwrap();
        assert_eq!(ha, HaInputs::new(100));
        assert_eq!(ha.state, HaState::Started);
        assert!(!ha.to_properties().contains_key("group"));
    }

    #[test]
    fn test_invalid_state() {
        let props = properties_from_json(json!({ "resourceId": 100, "state": "paused" }));
        assert_eq!(
            HaInputs::from_properties(&props).unwrap_err(),
            ProviderError::mismatch("state", "one of ignored, started, stopped", "paused")
        );
    }

    #[test]
    fn test_resource_id_must_be_number() {
        let props = properties_from_json(json!({ "resourceId": "100" }));
        assert_eq!(
            HaInputs::from_properties(&props).unwrap_err(),
            ProviderError::mismatch("resourceId", "number", "string")
        );
    }
}
