//! Seed a bookstore, run workers concurrently against it, and aggregate their results.

use std::sync::Arc;
use std::time::Duration;

use bookstore_service::{ServiceError, SharedBookStore};
use futures::future;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error;
use tokio::task::JoinError;

use crate::config::{Catalog, Settings};
use crate::generator::CatalogGenerator;
use crate::metrics::InteractionMetrics;
use crate::worker::{Worker, WorkerError, WorkerResult};
use crate::workload::{self, ConfigError, WorkloadConfig};

/// Errors that end a benchmark run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The workload is invalid, no worker was started.
    #[error("invalid workload configuration")]
    Config(#[from] ConfigError),

    /// The seed catalog could not be loaded into the store.
    #[error("failed to seed the catalog")]
    Seed(#[source] ServiceError),

    /// A worker stopped before completing its runs.
    #[error("worker {worker} failed")]
    Worker {
        /// Index of the failed worker.
        worker: usize,
        /// Why the worker stopped.
        #[source]
        source: WorkerError,
    },

    /// A worker task panicked or was cancelled.
    #[error("worker {worker} did not complete")]
    Join {
        /// Index of the failed worker.
        worker: usize,
        /// The task failure.
        #[source]
        source: JoinError,
    },

    /// The catalog could not be removed after the run.
    #[error("failed to clean up the catalog")]
    Cleanup(#[source] ServiceError),
}

/// The aggregated figures of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Report {
    /// Number of workers that contributed.
    pub workers: usize,
    /// Sum over all workers of successful purchases per second.
    pub throughput: f64,
    /// Mean over all workers of successful purchases divided by the number of workers.
    ///
    /// This has no time unit and is kept as the historical definition of the figure.
    pub latency: f64,
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct Outcome {
    /// Results of all workers, ordered by worker index.
    pub results: Vec<WorkerResult>,
    /// Interaction metrics merged over all workers.
    pub interactions: InteractionMetrics,
    /// The aggregated figures.
    pub report: Report,
}

/// Computes throughput and latency from the results of all workers.
pub fn aggregate(results: &[WorkerResult]) -> Report {
    let workers = results.len();
    if workers == 0 {
        return Report::default();
    }

    let throughput = results.iter().map(WorkerResult::purchase_throughput).sum();
    let latency = results
        .iter()
        .map(|result| result.successful_purchases as f64 / workers as f64)
        .sum::<f64>()
        / workers as f64;

    Report {
        workers,
        throughput,
        latency,
    }
}

/// Loads a freshly generated catalog into the store.
///
/// Returns the number of books added.
pub async fn seed_catalog(
    store: &SharedBookStore,
    generator: &CatalogGenerator,
    catalog: &Catalog,
    rng: &mut SmallRng,
) -> Result<usize, ServiceError> {
    let books = generator.seed_catalog(
        catalog.size,
        catalog.initial_copies,
        catalog.string_length,
        rng,
    );
    let count = books.len();
    store.add_books(books).await?;
    Ok(count)
}

/// Runs `workers` workers concurrently and waits for all of them.
///
/// Every worker gets its own RNG, seeded from `seeds`. If any worker fails, the failure of the
/// lowest worker index is returned once all workers have finished, and the others are logged.
pub async fn run_workers(
    config: Arc<WorkloadConfig>,
    workers: usize,
    seeds: &mut SmallRng,
) -> Result<Vec<WorkerResult>, RunError> {
    let tasks: Vec<_> = (0..workers)
        .map(|id| {
            let worker = Worker::new(id, Arc::clone(&config), seeds.next_u64());
            tokio::spawn(worker.run())
        })
        .collect();

    let finished = future::join_all(tasks).await;

    let mut results = Vec::with_capacity(workers);
    let mut first_error = None;
    for (worker, task) in finished.into_iter().enumerate() {
        let error = match task {
            Ok(Ok(result)) => {
                results.push(result);
                continue;
            }
            Ok(Err(source)) => RunError::Worker { worker, source },
            Err(source) => RunError::Join { worker, source },
        };

        tracing::error!(error = &error as &dyn std::error::Error, "worker failed");
        if first_error.is_none() {
            first_error = Some(error);
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(results),
    }
}

/// Runs a complete benchmark against `store`.
///
/// The workload is validated before anything touches the store. The store is then seeded with the
/// configured catalog, all workers run to completion, and their results are aggregated. When
/// [`Settings::cleanup`] is set, all books are removed at the end.
pub async fn run(settings: &Settings, store: SharedBookStore) -> Result<Outcome, RunError> {
    if settings.workers == 0 {
        return Err(ConfigError::NoWorkers.into());
    }
    workload::check_string_length("string_length", settings.catalog.string_length)?;
    let config = WorkloadConfig::builder(Arc::clone(&store), settings.generator.clone())
        .params(settings.workload.clone())
        .build()?;

    let seed = settings.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, store = store.name(), "starting benchmark");
    let mut rng = SmallRng::seed_from_u64(seed);

    let seeded = seed_catalog(&store, &settings.generator, &settings.catalog, &mut rng)
        .await
        .map_err(RunError::Seed)?;
    tracing::info!(books = seeded, "seeded catalog");

    let bar = ProgressBar::new_spinner()
        .with_style(
            ProgressStyle::with_template("{spinner} {msg} {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        )
        .with_message(format!("Running {} workers:", settings.workers));
    bar.enable_steady_tick(Duration::from_millis(100));

    let results = run_workers(config, settings.workers, &mut rng).await;
    bar.finish_and_clear();

    if settings.cleanup {
        match store.remove_all_books().await {
            Ok(()) => tracing::info!("removed all books"),
            // A worker failure takes precedence over the cleanup failure.
            Err(error) if results.is_err() => {
                tracing::error!(
                    error = &error as &dyn std::error::Error,
                    "failed to clean up the catalog"
                );
            }
            Err(error) => return Err(RunError::Cleanup(error)),
        }
    }

    let results = results?;
    let report = aggregate(&results);
    tracing::info!(
        throughput = report.throughput,
        latency = report.latency,
        "benchmark finished"
    );

    let mut interactions = InteractionMetrics::default();
    for result in &results {
        interactions.merge(&result.interactions);
    }

    Ok(Outcome {
        results,
        interactions,
        report,
    })
}
