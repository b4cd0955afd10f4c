//! # pve Common
//!
//! Shared utilities for the PVE provider crates.
//!
//! ## Logging
//!
//! ```rust
//! use pve_common::try_init_logging;
//!
//! // Honours RUST_LOG when set, otherwise falls back to the given level
//! let _ = try_init_logging("info");
//! tracing::info!(resource = "pve:storage:File", "reconciling");
//! ```

pub mod logging;

pub use logging::{init_logging, init_logging_json, try_init_logging};
