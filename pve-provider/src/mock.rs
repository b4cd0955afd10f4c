//! In-memory orchestration host for testing and development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{ProviderError, Result};
use crate::host::{HostRecord, RegisterRequest, ResourceHost};
use crate::state::{ResourceId, Urn};
use crate::value::{PropertyMap, PropertyValue};

/// A call on the host interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    Register,
    Lookup,
    Delete,
}

/// Mock orchestration host.
///
/// Keeps records in memory without talking to a real engine or cluster.
/// Every registration request is recorded so tests can inspect exactly
/// what the adapter sent.
pub struct MockHost {
    stack: String,
    project: String,
    records: RwLock<HashMap<ResourceId, HostRecord>>,
    requests: RwLock<Vec<RegisterRequest>>,
    calls: RwLock<Vec<HostCall>>,
    // `None` as the call matches any call
    fail_next: RwLock<Option<(Option<HostCall>, String)>>,
    lookups: AtomicUsize,
    deletes: AtomicUsize,
}

fn poisoned<T>(_: T) -> ProviderError {
    ProviderError::Internal("Lock poisoned".to_string())
}

impl MockHost {
    /// Create a mock host for the `dev` stack of project `pve`.
    pub fn new() -> Self {
        Self::with_stack("dev", "pve")
    }

    pub fn with_stack(stack: impl Into<String>, project: impl Into<String>) -> Self {
        let stack = stack.into();
        let project = project.into();
        info!(stack = %stack, project = %project, "Creating mock orchestration host");
        Self {
            stack,
            project,
            records: RwLock::new(HashMap::new()),
            requests: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
            fail_next: RwLock::new(None),
            lookups: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Make the next host call fail with a transport error.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.arm_failure(None, message.into());
    }

    /// Make the next call of the given kind fail with a transport error.
    /// Calls of other kinds go through.
    pub fn fail_next_on(&self, call: HostCall, message: impl Into<String>) {
        self.arm_failure(Some(call), message.into());
    }

    fn arm_failure(&self, call: Option<HostCall>, message: String) {
        if let Ok(mut slot) = self.fail_next.write() {
            *slot = Some((call, message));
        }
    }

    /// Registration requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RegisterRequest> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn record_count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.records.read().map(|r| r.contains_key(id)).unwrap_or(false)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Change a stored property behind the adapter's back, as an operator
    /// editing the cluster directly would.
    pub fn set_property(&self, id: &ResourceId, path: &str, value: PropertyValue) -> Result<()> {
        let mut records = self.records.write().map_err(poisoned)?;

        let record = records
            .get_mut(id)
            .ok_or_else(|| ProviderError::IdentityNotFound(id.to_string()))?;

        let mut parts: Vec<&str> = path.split('.').collect();
        let leaf = parts.pop().unwrap_or_default();
        let mut target: &mut PropertyMap = &mut record.properties;
        for part in parts {
            target = match target.get_mut(part) {
                Some(PropertyValue::Object(nested)) => nested,
                _ => return Err(ProviderError::mismatch(path, "object", "missing")),
            };
        }
        target.insert(leaf.to_string(), value);
        Ok(())
    }

    /// Log the call and fail it if a matching failure is armed.
    fn enter(&self, call: HostCall) -> Result<()> {
        self.calls.write().map_err(poisoned)?.push(call);

        let mut slot = self.fail_next.write().map_err(poisoned)?;
        match slot.take() {
            Some((target, message)) if target.map_or(true, |t| t == call) => {
                debug!(?call, "Injected failure");
                Err(ProviderError::TransportFailure(message))
            }
            other => {
                *slot = other;
                Ok(())
            }
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceHost for MockHost {
    #[instrument(
        skip(self, request),
        fields(type_token = %request.type_token, name = %request.name)
    )]
    async fn register(&self, request: RegisterRequest) -> Result<HostRecord> {
        self.requests.write().map_err(poisoned)?.push(request.clone());
        self.enter(HostCall::Register)?;

        let mut records = self.records.write().map_err(poisoned)?;
        let now = Utc::now();

        if let Some(id) = &request.options.identity_for_update {
            let record = records
                .get_mut(id)
                .ok_or_else(|| ProviderError::IdentityNotFound(id.to_string()))?;

            record.properties = request.properties;
            record.updated_at = now;

            debug!(id = %id, "Mock resource updated");
            return Ok(record.clone());
        }

        let urn = Urn::new(&self.stack, &self.project, &request.type_token, &request.name);
        let replaces = request.options.replaces.as_ref();
        if records.values().any(|r| r.urn == urn && Some(&r.id) != replaces) {
            return Err(ProviderError::TransportFailure(format!(
                "resource {} already exists",
                urn
            )));
        }

        let record = HostRecord {
            id: ResourceId::new(Uuid::new_v4().to_string()),
            urn,
            properties: request.properties,
            created_at: now,
            updated_at: now,
        };
        records.insert(record.id.clone(), record.clone());

        info!(id = %record.id, urn = %record.urn, "Mock resource created");
        Ok(record)
    }

    #[instrument(skip(self), fields(name = %name, id = %id))]
    async fn lookup(&self, name: &str, id: &ResourceId) -> Result<HostRecord> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.enter(HostCall::Lookup)?;

        let records = self.records.read().map_err(poisoned)?;

        records
            .get(id)
            .filter(|r| r.urn.name == name)
            .cloned()
            .ok_or_else(|| ProviderError::IdentityNotFound(id.to_string()))
    }

    #[instrument(skip(self), fields(name = %name, id = %id))]
    async fn delete(&self, name: &str, id: &ResourceId) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.enter(HostCall::Delete)?;

        let mut records = self.records.write().map_err(poisoned)?;

        match records.get(id) {
            Some(record) if record.urn.name == name => {
                records.remove(id);
                info!("Mock resource deleted");
                Ok(())
            }
            _ => Err(ProviderError::IdentityNotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RegisterOptions;

    fn request(name: &str, identity: Option<ResourceId>) -> RegisterRequest {
        let mut properties = PropertyMap::new();
        properties.insert("name".into(), name.into());
        RegisterRequest {
            type_token: "pve:pool:Pool".into(),
            name: name.into(),
            properties,
            options: RegisterOptions {
                identity_for_update: identity,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_register_lookup_delete() {
        let host = MockHost::new();

        let record = host.register(request("ci", None)).await.unwrap();
        assert_eq!(record.urn.to_string(), "urn:pulumi:dev::pve::pve:pool:Pool::ci");

        let found = host.lookup("ci", &record.id).await.unwrap();
        assert_eq!(found, record);

        host.delete("ci", &record.id).await.unwrap();
        assert_eq!(host.record_count(), 0);
        assert!(matches!(
            host.lookup("ci", &record.id).await,
            Err(ProviderError::IdentityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let host = MockHost::new();
        let created = host.register(request("ci", None)).await.unwrap();
        let updated = host.register(request("ci", Some(created.id.clone()))).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(host.record_count(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_identity() {
        let host = MockHost::new();
        let err = host
            .register(request("ci", Some(ResourceId::new("missing"))))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::IdentityNotFound("missing".into()));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let host = MockHost::new();
        host.register(request("ci", None)).await.unwrap();
        assert!(matches!(
            host.register(request("ci", None)).await,
            Err(ProviderError::TransportFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_next() {
        let host = MockHost::new();
        host.fail_next("connection reset");
        assert_eq!(
            host.register(request("ci", None)).await.unwrap_err(),
            ProviderError::TransportFailure("connection reset".into())
        );
        assert_eq!(host.record_count(), 0);
        // Only the next call fails
        assert!(host.register(request("ci", None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_next_on_targets_one_call() {
        let host = MockHost::new();
        let record = host.register(request("ci", None)).await.unwrap();

        host.fail_next_on(HostCall::Register, "upstream timeout");
        host.lookup("ci", &record.id).await.unwrap();
        host.delete("ci", &record.id).await.unwrap();
        assert_eq!(
            host.register(request("ci", None)).await.unwrap_err(),
            ProviderError::TransportFailure("upstream timeout".into())
        );
        assert_eq!(
            host.calls(),
            vec![
                HostCall::Register,
                HostCall::Lookup,
                HostCall::Delete,
                HostCall::Register
            ]
        );
    }

    #[tokio::test]
    async fn test_replacement_may_reuse_name() {
        let host = MockHost::new();
        let old = host.register(request("ci", None)).await.unwrap();

        let mut replacement = request("ci", None);
        replacement.options.replaces = Some(old.id.clone());
        let new = host.register(replacement).await.unwrap();

        assert_ne!(new.id, old.id);
        assert_eq!(new.urn, old.urn);
        assert_eq!(host.record_count(), 2);
    }

    #[tokio::test]
    async fn test_set_property() {
        let host = MockHost::new();
        let record = host.register(request("ci", None)).await.unwrap();
        host.set_property(&record.id, "comment", "edited".into()).unwrap();

        let found = host.lookup("ci", &record.id).await.unwrap();
        assert_eq!(found.properties["comment"], PropertyValue::from("edited"));
    }
}
