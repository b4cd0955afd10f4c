//! Reconcile a local file as a datastore snippet against the in-memory host.
//!
//! ## Usage
//! ```bash
//! PVE_URL=https://pve:8006 PVE_USER=root@pam PVE_TOKEN=... \
//! PVE_SSH_USER=root PVE_SSH_PASS=... \
//!     cargo run --example reconcile_file -- user-data.yaml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pve_provider::{FileInputs, MockHost, ProviderConfig, Reconciler, Resource};

/// Reconcile a file resource against a mock orchestration host
#[derive(Parser, Debug)]
#[command(name = "reconcile_file")]
#[command(version)]
struct Args {
    /// File to upload
    file: PathBuf,

    /// Provider configuration file (YAML); PVE_* variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target datastore
    #[arg(long, default_value = "local")]
    datastore: String,

    /// Datastore content type
    #[arg(long, default_value = "snippets")]
    content_type: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.log_json {
        pve_common::init_logging_json(&args.log_level)?;
    } else {
        pve_common::init_logging(&args.log_level)?;
    }

    let config = match &args.config {
        Some(path) => ProviderConfig::load(path)?,
        None => ProviderConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;

    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .context("file path has no usable file name")?
        .to_string();
    let data = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let reconciler = Reconciler::new(MockHost::new());

    let provider = reconciler.reconcile("default", &config.into(), None).await?;
    info!(urn = %provider.state.urn(), "Provider registered");

    let file = FileInputs::new(&args.content_type, &args.datastore, &file_name, data);
    let remote_path = file.remote_path();
    let desired: Resource = file.into();

    print!("{}", reconciler.plan(&desired, None)?);
    let created = reconciler.reconcile(&file_name, &desired, None).await?;
    info!(urn = %created.state.urn(), id = %created.state.id(), %remote_path, "File registered");

    let again = reconciler.reconcile(&file_name, &desired, Some(&created.state)).await?;
    println!("second pass: {}", again.action);

    Ok(())
}
