//! # pve Provider
//!
//! Resource reconciliation layer for the PVE infrastructure-as-code
//! provider.
//!
//! A declared desired state is compared with the last observed state to
//! decide whether a resource must be created, updated in place, replaced,
//! or left alone. The decision and the serialized properties are then
//! handed to an external orchestration host.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Reconciler                 │
//! │   (plan, reconcile, refresh, destroy)   │
//! └─────────────────────┬───────────────────┘
//!                       │ properties + secret marker
//!                       ▼
//! ┌─────────────────────────────────────────┐
//! │          ResourceHost Trait             │
//! │       (register, lookup, delete)        │
//! └─────────────────────┬───────────────────┘
//!                       │
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────────┐     ┌───────────────────┐
//! │ Orchestration     │     │     MockHost      │
//! │ engine (external) │     │    (in-memory)    │
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pve_provider::{FileInputs, MockHost, Reconciler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let reconciler = Reconciler::new(MockHost::new());
//!
//!     let file = FileInputs::new("snippets", "ceph-ha", "user-data.yaml", "#cloud-config");
//!     let outcome = reconciler.reconcile("user-data", &file.into(), None).await.unwrap();
//!     println!("{} -> {}", outcome.action, outcome.state.urn());
//! }
//! ```

pub mod adapter;
pub mod diff;
pub mod error;
pub mod host;
pub mod mock;
pub mod resources;
pub mod schema;
pub mod secret;
pub mod state;
pub mod value;

pub use adapter::{Outcome, Plan, Reconciler, Refresh};
pub use diff::{Action, DetailedDiff, DiffKind, PropertyDiff};
pub use error::{ProviderError, Result};
pub use host::{HostRecord, RegisterOptions, RegisterRequest, ResourceHost};
pub use mock::{HostCall, MockHost};
pub use resources::{
    AclInputs,
    AclType,
    FileInputs,
    FileSourceRaw,
    GroupInputs,
    HaInputs,
    HaState,
    PoolInputs,
    ProviderConfig,
    Resource,
    ResourceKind,
    ResourceModel,
    RoleInputs,
    DEFAULT_GROUP_COMMENT,
    DEFAULT_POOL_COMMENT,
};
pub use schema::{ChangeBehavior, FieldDefault, FieldSchema, FieldType, ResourceSchema};
pub use secret::{Sensitive, MASK};
pub use state::{ResourceId, ResourceState, Urn};
pub use value::{PropertyMap, PropertyValue};
