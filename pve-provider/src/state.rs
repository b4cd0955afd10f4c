//! Observed state and resource identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProviderError, Result};
use crate::host::HostRecord;
use crate::resources::{Resource, ResourceKind};
use crate::value::PropertyMap;

/// Opaque, host-assigned resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured resource name, stable across updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Urn {
    pub stack: String,
    pub project: String,
    pub type_token: String,
    pub name: String,
}

impl Urn {
    pub fn new(
        stack: impl Into<String>,
        project: impl Into<String>,
        type_token: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            stack: stack.into(),
            project: project.into(),
            type_token: type_token.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "urn:pulumi:{}::{}::{}::{}",
            self.stack, self.project, self.type_token, self.name
        )
    }
}

/// Last observed state of a resource together with its identity.
///
/// Only the adapter builds these, from records returned by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceState {
    urn: Urn,
    id: ResourceId,
    kind: ResourceKind,
    #[serde(rename = "outputs")]
    properties: PropertyMap,
    #[serde(skip)]
    resource: Resource,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub(crate) fn from_record(kind: ResourceKind, record: HostRecord) -> Result<Self> {
        if record.urn.type_token != kind.type_token() {
            return Err(ProviderError::mismatch(
                "type",
                kind.type_token(),
                record.urn.type_token,
            ));
        }

        let resource = Resource::from_properties(kind, &record.properties)?;

        Ok(Self {
            urn: record.urn,
            id: record.id,
            kind,
            properties: resource.to_properties(),
            resource,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.urn.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Observed outputs as a typed model.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Observed outputs as properties (secrets sealed).
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urn_format() {
        let urn = Urn::new("dev", "infra", "pve:storage:File", "cloud-init");
        assert_eq!(urn.to_string(), "urn:pulumi:dev::infra::pve:storage:File::cloud-init");
    }
}
