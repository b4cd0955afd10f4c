//! The reconciliation adapter.
//!
//! Classifies what must happen to converge a resource and forwards the
//! decision to the host:
//!
//! | existing state | diff                      | action     |
//! |----------------|---------------------------|------------|
//! | none           | -                         | `Create`   |
//! | some           | any replace-forcing field | `Replace`  |
//! | some           | only mutable fields       | `Update`   |
//! | some           | empty                     | `NoChange` |
//!
//! The adapter keeps no state between passes. Existing state is only ever
//! borrowed; a new [`ResourceState`] is returned on success, so a failed
//! pass leaves the caller's persisted state untouched.

use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::diff::{diff, Action, DetailedDiff};
use crate::error::{ProviderError, Result};
use crate::host::{RegisterOptions, RegisterRequest, ResourceHost};
use crate::resources::{Resource, ResourceKind};
use crate::secret::seal_secrets;
use crate::state::{ResourceId, ResourceState};
use crate::value::PropertyMap;

/// Result of classifying a resource, before anything is sent to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub kind: ResourceKind,
    pub action: Action,
    /// Per-property changes against existing state (empty on create)
    pub diff: DetailedDiff,
    /// Properties that will be registered, secrets sealed
    pub properties: PropertyMap,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.action, self.kind)?;
        if self.action == Action::Create {
            for (key, value) in &self.properties {
                writeln!(f, "  + {}: {}", key, value)?;
            }
            Ok(())
        } else {
            write!(f, "{}", self.diff)
        }
    }
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub action: Action,
    pub diff: DetailedDiff,
    /// Freshly observed state
    pub state: ResourceState,
    /// Identity superseded by a replace
    pub replaced_id: Option<ResourceId>,
    /// Superseded identity the host failed to delete after its
    /// replacement was created. It still exists and should be destroyed.
    pub pending_delete: Option<ResourceId>,
}

/// Result of re-reading a resource from the host.
#[derive(Debug, Clone)]
pub struct Refresh {
    pub state: ResourceState,
    /// Differences between what the host reports and the remembered state
    pub drift: DetailedDiff,
}

impl Refresh {
    pub fn has_drifted(&self) -> bool {
        self.drift.has_changes()
    }
}

/// How a registration relates to existing state.
#[derive(Clone, Copy)]
enum Registration<'a> {
    Create,
    Update(&'a ResourceId),
    Replace(&'a ResourceId),
}

/// Reconciles desired resources against observed state through a host.
pub struct Reconciler<H> {
    host: H,
}

impl<H: ResourceHost> Reconciler<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Classify without contacting the host.
    pub fn plan(&self, desired: &Resource, existing: Option<&ResourceState>) -> Result<Plan> {
        let kind = desired.kind();
        let schema = kind.schema();

        let mut properties = desired.to_properties();
        schema.apply_defaults(&mut properties);
        schema.validate(&properties)?;
        seal_secrets(schema, &mut properties);

        let (action, diff) = match existing {
            None => (Action::Create, DetailedDiff::default()),
            Some(state) => {
                if state.kind() != kind {
                    return Err(ProviderError::mismatch(
                        "type",
                        kind.type_token(),
                        state.kind().type_token(),
                    ));
                }
                let changes = diff(schema, &properties, state.properties());
                (Action::from_diff(&changes), changes)
            }
        };

        Ok(Plan { kind, action, diff, properties })
    }

    /// Converge one resource.
    #[instrument(skip(self, desired, existing), fields(kind = %desired.kind(), name = %name))]
    pub async fn reconcile(
        &self,
        name: &str,
        desired: &Resource,
        existing: Option<&ResourceState>,
    ) -> Result<Outcome> {
        let plan = self.plan(desired, existing)?;
        debug!(action = %plan.action, changes = plan.diff.len(), "Planned");

        let mut replaced_id = None;
        let mut pending_delete = None;

        let state = match (plan.action, existing) {
            (Action::Create, _) => self.register(name, &plan, Registration::Create).await?,

            (Action::Update, Some(old)) => {
                let state = self
                    .register(old.name(), &plan, Registration::Update(old.id()))
                    .await?;
                if state.id() != old.id() {
                    return Err(ProviderError::Internal(format!(
                        "host changed identity of {} on update",
                        old.urn()
                    )));
                }
                state
            }

            (Action::Replace, Some(old)) => {
                let delete_first = plan.kind.schema().delete_before_replace;
                info!(old_id = %old.id(), delete_first, "Replacing resource");

                let state = if delete_first {
                    self.delete_replaced(old).await?;
                    self.register(name, &plan, Registration::Replace(old.id())).await?
                } else {
                    let state = self
                        .register(name, &plan, Registration::Replace(old.id()))
                        .await?;
                    if let Err(e) = self.delete_replaced(old).await {
                        warn!(old_id = %old.id(), error = %e, "Failed to delete replaced resource");
                        pending_delete = Some(old.id().clone());
                    }
                    state
                };

                replaced_id = Some(old.id().clone());
                state
            }

            (Action::NoChange, Some(old)) => self.read(plan.kind, old.name(), old.id()).await?,

            (action, None) => {
                return Err(ProviderError::Internal(format!(
                    "{} planned without existing state",
                    action
                )));
            }
        };

        info!(action = %plan.action, id = %state.id(), "Reconciled");

        Ok(Outcome {
            action: plan.action,
            diff: plan.diff,
            state,
            replaced_id,
            pending_delete,
        })
    }

    /// Converge one resource from an untyped property map.
    ///
    /// When an identity exists, fields absent from `properties` are taken
    /// from the observed state; otherwise they must be supplied.
    pub async fn reconcile_properties(
        &self,
        kind: ResourceKind,
        name: &str,
        mut properties: PropertyMap,
        existing: Option<&ResourceState>,
    ) -> Result<Outcome> {
        if let Some(state) = existing.filter(|s| s.kind() == kind) {
            kind.schema().fill_from_observed(&mut properties, state.properties());
        }

        let desired = Resource::from_properties(kind, &properties)?;
        self.reconcile(name, &desired, existing).await
    }

    /// Read the current state of a resource by name and identity.
    #[instrument(skip(self), fields(kind = %kind, name = %name, id = %id))]
    pub async fn read(
        &self,
        kind: ResourceKind,
        name: &str,
        id: &ResourceId,
    ) -> Result<ResourceState> {
        let record = self.host.lookup(name, id).await?;
        ResourceState::from_record(kind, record)
    }

    /// Re-read a resource from the host and report drift.
    #[instrument(skip(self, state), fields(urn = %state.urn()))]
    pub async fn refresh(&self, state: &ResourceState) -> Result<Refresh> {
        let current = self.read(state.kind(), state.name(), state.id()).await?;
        let drift = diff(state.kind().schema(), current.properties(), state.properties());

        if drift.has_changes() {
            warn!(changes = drift.len(), "Observed state drifted");
        }

        Ok(Refresh { state: current, drift })
    }

    /// Delete a resource.
    #[instrument(skip(self, state), fields(urn = %state.urn()))]
    pub async fn destroy(&self, state: &ResourceState) -> Result<()> {
        self.host.delete(state.name(), state.id()).await?;
        info!("Resource destroyed");
        Ok(())
    }

    /// Delete the instance a replace supersedes. An instance that is
    /// already gone counts as deleted, so an interrupted replace can be
    /// retried from the same state.
    async fn delete_replaced(&self, old: &ResourceState) -> Result<()> {
        match self.host.delete(old.name(), old.id()).await {
            Err(ProviderError::IdentityNotFound(id)) => {
                debug!(old_id = %id, "Replaced resource already deleted");
                Ok(())
            }
            other => other,
        }
    }

    async fn register(
        &self,
        name: &str,
        plan: &Plan,
        registration: Registration<'_>,
    ) -> Result<ResourceState> {
        let schema = plan.kind.schema();

        let mut options = RegisterOptions {
            secret_field_names: schema.secret_fields(),
            ..Default::default()
        };
        match registration {
            Registration::Create => {}
            Registration::Update(id) => options.identity_for_update = Some(id.clone()),
            Registration::Replace(id) => {
                options.replaces = Some(id.clone());
                options.delete_before_replace = schema.delete_before_replace;
            }
        }

        let request = RegisterRequest {
            type_token: schema.type_token.to_string(),
            name: name.to_string(),
            properties: plan.properties.clone(),
            options,
        };

        let record = self.host.register(request).await?;
        ResourceState::from_record(plan.kind, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHost;
    use crate::resources::{FileInputs, PoolInputs};
    use std::sync::Arc;

    fn reconciler() -> Reconciler<Arc<MockHost>> {
        Reconciler::new(Arc::new(MockHost::new()))
    }

    #[tokio::test]
    async fn test_plan_does_not_touch_host() {
        let r = reconciler();
        let file = FileInputs::new("snippets", "ceph-ha", "a.yaml", "x").into();
        let plan = r.plan(&file, None).unwrap();

        assert_eq!(plan.action, Action::Create);
        assert!(plan.diff.is_empty());
        assert!(r.host().requests().is_empty());
        assert!(plan.to_string().starts_with("create pve:storage:File"));
    }

    #[tokio::test]
    async fn test_kind_mismatch() {
        let r = reconciler();
        let pool = r.reconcile("ci", &PoolInputs::new("ci").into(), None).await.unwrap();

        let file: Resource = FileInputs::new("snippets", "ceph-ha", "a.yaml", "x").into();
        assert!(matches!(
            r.plan(&file, Some(&pool.state)),
            Err(ProviderError::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let r = reconciler();
        let first = r.reconcile("ci", &PoolInputs::new("ci").into(), None).await.unwrap();
        assert_eq!(first.action, Action::Create);

        let desired = PoolInputs::new("ci").with_comment("runners").into();
        let second = r.reconcile("ci", &desired, Some(&first.state)).await.unwrap();

        assert_eq!(second.action, Action::Update);
        assert_eq!(second.state.id(), first.state.id());
        assert_eq!(second.state.urn(), first.state.urn());
        assert_eq!(second.state.created_at(), first.state.created_at());
        let options = &r.host().requests()[1].options;
        assert_eq!(options.identity_for_update.as_ref(), Some(first.state.id()));
        assert!(options.replaces.is_none());
        assert!(!options.delete_before_replace);
    }

    #[tokio::test]
    async fn test_no_change_only_reads() {
        let r = reconciler();
        let first = r.reconcile("ci", &PoolInputs::new("ci").into(), None).await.unwrap();
        let second = r
            .reconcile("ci", &PoolInputs::new("ci").into(), Some(&first.state))
            .await
            .unwrap();

        assert_eq!(second.action, Action::NoChange);
        assert_eq!(r.host().requests().len(), 1);
        assert_eq!(r.host().lookup_count(), 1);
        assert_eq!(second.state.id(), first.state.id());
    }

    #[tokio::test]
    async fn test_read_by_identity() {
        let r = reconciler();
        let created = r.reconcile("ci", &PoolInputs::new("ci").into(), None).await.unwrap();

        let read = r.read(ResourceKind::Pool, "ci", created.state.id()).await.unwrap();
        assert_eq!(read, created.state);

        r.destroy(&created.state).await.unwrap();
        assert_eq!(
            r.read(ResourceKind::Pool, "ci", created.state.id()).await.unwrap_err(),
            ProviderError::IdentityNotFound(created.state.id().to_string())
        );
    }

    #[tokio::test]
    async fn test_read_checks_kind() {
        let r = reconciler();
        let created = r.reconcile("ci", &PoolInputs::new("ci").into(), None).await.unwrap();

        assert!(matches!(
            r.read(ResourceKind::Group, "ci", created.state.id()).await,
            Err(ProviderError::TypeMismatch { .. })
        ));
    }
}
