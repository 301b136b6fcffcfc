//! A concurrent workload benchmark for bookstore services.
//!
//! A run seeds the store with a generated catalog, then starts a fixed number of [`Worker`]s that
//! share one [`WorkloadConfig`]. Every worker repeatedly picks one of three interactions at
//! random, weighted by the configured percentages:
//!
//! - *new stock acquisition* adds generated books that are not stocked yet,
//! - *stock replenishment* adds copies to the least stocked books,
//! - *customer purchase* buys copies of a sample of the editor picks.
//!
//! Only the timed phase after a warm-up is measured. Once all workers completed, their
//! [`WorkerResult`]s are aggregated into purchase throughput and a latency figure, see
//! [`benchmark::aggregate`].
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod benchmark;
pub mod config;
pub mod generator;
pub mod metrics;
pub mod observability;
pub mod report;
pub mod worker;
pub mod workload;

pub use crate::benchmark::run;
pub use crate::generator::CatalogGenerator;
pub use crate::worker::{Worker, WorkerResult};
pub use crate::workload::{Interaction, WorkloadConfig, WorkloadParams};
