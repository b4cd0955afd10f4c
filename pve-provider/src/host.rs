//! The orchestration host seam.
//!
//! The host owns the authoritative state store and talks to the
//! virtualization platform. The adapter only reaches it through
//! [`ResourceHost`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::state::{ResourceId, Urn};
use crate::value::PropertyMap;

/// Options accompanying a registration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterOptions {
    /// Property paths the host must store encrypted and mask in output
    pub secret_field_names: Vec<String>,
    /// Existing identity when updating in place; `None` creates
    pub identity_for_update: Option<ResourceId>,
    /// Identity this registration replaces. Unless `delete_before_replace`
    /// is set, the old instance still exists while the new one is created.
    pub replaces: Option<ResourceId>,
    /// Set on the create half of a replace whose old instance was deleted
    /// first
    pub delete_before_replace: bool,
}

/// A registration call.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub type_token: String,
    pub name: String,
    pub properties: PropertyMap,
    pub options: RegisterOptions,
}

/// What the host remembers about a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostRecord {
    pub id: ResourceId,
    pub urn: Urn,
    pub properties: PropertyMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Narrow interface to the external orchestration host.
///
/// Implementations own their retry and timeout policy; errors are
/// returned to the caller as-is.
#[async_trait]
pub trait ResourceHost: Send + Sync {
    /// Register (create or update) a resource.
    ///
    /// With `options.identity_for_update` set, the existing record is
    /// updated and keeps its identity; otherwise a new identity is assigned.
    /// A registration carrying `options.replaces` may reuse the name of the
    /// instance it replaces.
    async fn register(&self, request: RegisterRequest) -> Result<HostRecord>;

    /// Fetch the current record for a resource.
    async fn lookup(&self, name: &str, id: &ResourceId) -> Result<HostRecord>;

    /// Delete a resource.
    async fn delete(&self, name: &str, id: &ResourceId) -> Result<()>;
}

#[async_trait]
impl<H: ResourceHost + ?Sized> ResourceHost for Arc<H> {
    async fn register(&self, request: RegisterRequest) -> Result<HostRecord> {
        (**self).register(request).await
    }

    async fn lookup(&self, name: &str, id: &ResourceId) -> Result<HostRecord> {
        (**self).lookup(name, id).await
    }

    async fn delete(&self, name: &str, id: &ResourceId) -> Result<()> {
        (**self).delete(name, id).await
    }
}
