//! Runs the bookstore workload benchmark and prints its results.
//!
//! The benchmark runs against an in-process [`InMemoryBookStore`]. See [`workload::config`] for
//! all settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use argh::FromArgs;
use bookstore_service::{InMemoryBookStore, SharedBookStore};
use workload::config::Settings;
use workload::{observability, report};

/// Concurrent workload benchmark for the bookstore
#[derive(Debug, FromArgs)]
pub struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    let settings =
        Settings::load(args.config.as_deref()).context("failed to load configuration")?;
    observability::init_tracing(&settings.logging);
    tracing::debug!(?settings);

    let store: SharedBookStore = Arc::new(InMemoryBookStore::new());
    let outcome = workload::run(&settings, store)
        .await
        .context("benchmark failed")?;

    report::print(&outcome);

    Ok(())
}
