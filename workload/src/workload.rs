//! The immutable description of what every worker does.
//!
//! A [`WorkloadConfig`] is created once through [`WorkloadConfig::builder`], validated, and then
//! shared read-only between all workers of a run.

use std::fmt;
use std::sync::Arc;

use bookstore_service::SharedBookStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::{CatalogGenerator, MAX_STRING_LENGTH};

/// Errors detected while validating a workload before any worker starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A percentage is negative, not a number, or above 100.
    #[error("`{name}` must be between 0 and 100, got {value}")]
    InvalidPercentage {
        /// Name of the offending field.
        name: &'static str,
        /// The configured value.
        value: f64,
    },

    /// Rare and frequent stock interactions together exceed 100 percent.
    #[error("stock manager interactions add up to {total} percent, at most 100 allowed")]
    PercentagesExceedTotal {
        /// Sum of both stock manager percentages.
        total: f64,
    },

    /// A count that must be positive is zero.
    #[error("`{name}` must be positive")]
    ZeroCount {
        /// Name of the offending field.
        name: &'static str,
    },

    /// Titles and authors must be between 1 and 100 characters long.
    #[error("`{name}` must be between 1 and 100, got {value}")]
    InvalidStringLength {
        /// Name of the offending field.
        name: &'static str,
        /// The configured value.
        value: usize,
    },

    /// A run needs at least one worker.
    #[error("at least one worker is required")]
    NoWorkers,
}

/// The interaction mix and per-interaction sizes of a workload.
///
/// The share of customer purchases is whatever remains after the two stock manager percentages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadParams {
    /// Percentage of iterations running a new stock acquisition.
    pub percent_rare_interaction: f64,
    /// Percentage of iterations running a stock replenishment.
    pub percent_frequent_stock_interaction: f64,
    /// Iterations run before timing starts. Their outcome is discarded.
    pub warm_up_runs: usize,
    /// Iterations run in the timed phase.
    pub actual_runs: usize,
    /// Candidate books generated per new stock acquisition.
    pub num_books_to_add: usize,
    /// Books with the fewest copies picked per replenishment.
    pub num_books_with_least_copies: usize,
    /// Copies added to each picked book per replenishment.
    pub num_add_copies: u32,
    /// Editor picks fetched per purchase.
    pub num_editor_picks_to_get: usize,
    /// Distinct books bought per purchase.
    pub num_books_to_buy: usize,
    /// Copies bought of each book per purchase.
    pub num_copies_per_buy: u32,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            percent_rare_interaction: 10.0,
            percent_frequent_stock_interaction: 30.0,
            warm_up_runs: 100,
            actual_runs: 500,
            num_books_to_add: 5,
            num_books_with_least_copies: 5,
            num_add_copies: 10,
            num_editor_picks_to_get: 10,
            num_books_to_buy: 5,
            num_copies_per_buy: 1,
        }
    }
}

impl WorkloadParams {
    /// Checks the invariants required before a workload may run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percentage("percent_rare_interaction", self.percent_rare_interaction)?;
        check_percentage(
            "percent_frequent_stock_interaction",
            self.percent_frequent_stock_interaction,
        )?;

        let total = self.percent_rare_interaction + self.percent_frequent_stock_interaction;
        if total > 100.0 {
            return Err(ConfigError::PercentagesExceedTotal { total });
        }

        let counts = [
            ("num_books_to_add", self.num_books_to_add),
            (
                "num_books_with_least_copies",
                self.num_books_with_least_copies,
            ),
            ("num_add_copies", self.num_add_copies as usize),
            ("num_editor_picks_to_get", self.num_editor_picks_to_get),
            ("num_books_to_buy", self.num_books_to_buy),
            ("num_copies_per_buy", self.num_copies_per_buy as usize),
        ];
        for (name, count) in counts {
            if count == 0 {
                return Err(ConfigError::ZeroCount { name });
            }
        }

        Ok(())
    }

    /// Maps a uniform draw from `[0, 100)` to an interaction.
    ///
    /// Thresholds are closed below and open above: a draw equal to
    /// [`percent_rare_interaction`](Self::percent_rare_interaction) selects a replenishment.
    pub fn select_interaction(&self, draw: f64) -> Interaction {
        if draw < self.percent_rare_interaction {
            Interaction::NewStock
        } else if draw < self.percent_rare_interaction + self.percent_frequent_stock_interaction {
            Interaction::Replenish
        } else {
            Interaction::Purchase
        }
    }
}

fn check_percentage(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidPercentage { name, value })
    }
}

/// Checks that generated titles and authors of length `value` stay within bounds.
pub fn check_string_length(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if (1..=MAX_STRING_LENGTH).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidStringLength { name, value })
    }
}

/// One of the three interactions a worker runs per iteration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Interaction {
    /// Rare stock manager interaction: adds books that are not stocked yet.
    NewStock,
    /// Frequent stock manager interaction: adds copies to the least stocked books.
    Replenish,
    /// Frequent customer interaction: buys some of the editor picks.
    Purchase,
}

impl Interaction {
    /// All interactions, in report order.
    pub const ALL: [Interaction; 3] = [Self::NewStock, Self::Replenish, Self::Purchase];

    /// A short name for logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::NewStock => "new-stock",
            Self::Replenish => "replenish",
            Self::Purchase => "purchase",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A builder for creating a [`WorkloadConfig`].
#[derive(Debug)]
pub struct WorkloadBuilder {
    store: SharedBookStore,
    generator: CatalogGenerator,
    params: WorkloadParams,
}

impl WorkloadBuilder {
    /// Replaces all parameters at once, e.g. with values loaded from a config file.
    pub fn params(mut self, params: WorkloadParams) -> Self {
        self.params = params;
        self
    }

    /// The percentages of new stock and replenishment interactions.
    pub fn interaction_mix(mut self, percent_rare: f64, percent_frequent_stock: f64) -> Self {
        self.params.percent_rare_interaction = percent_rare;
        self.params.percent_frequent_stock_interaction = percent_frequent_stock;
        self
    }

    /// Number of warm-up and timed iterations per worker.
    pub fn runs(mut self, warm_up_runs: usize, actual_runs: usize) -> Self {
        self.params.warm_up_runs = warm_up_runs;
        self.params.actual_runs = actual_runs;
        self
    }

    /// Candidate books generated per new stock acquisition.
    pub fn books_to_add(mut self, num_books: usize) -> Self {
        self.params.num_books_to_add = num_books;
        self
    }

    /// Picks the `num_books` least stocked books per replenishment and adds `num_copies` to each.
    pub fn replenishment(mut self, num_books: usize, num_copies: u32) -> Self {
        self.params.num_books_with_least_copies = num_books;
        self.params.num_add_copies = num_copies;
        self
    }

    /// Fetches `editor_picks` picks per purchase and buys `num_copies` of `num_books` of them.
    pub fn purchase(mut self, editor_picks: usize, num_books: usize, num_copies: u32) -> Self {
        self.params.num_editor_picks_to_get = editor_picks;
        self.params.num_books_to_buy = num_books;
        self.params.num_copies_per_buy = num_copies;
        self
    }

    /// Validates the parameters and creates the shared workload.
    pub fn build(self) -> Result<Arc<WorkloadConfig>, ConfigError> {
        self.params.validate()?;
        check_string_length("max_string_length", self.generator.max_string_length)?;

        Ok(Arc::new(WorkloadConfig {
            store: self.store,
            generator: self.generator,
            params: self.params,
        }))
    }
}

/// Everything a worker needs to run: the parameters, the store and the data generator.
#[derive(Debug)]
pub struct WorkloadConfig {
    pub(crate) store: SharedBookStore,
    pub(crate) generator: CatalogGenerator,
    pub(crate) params: WorkloadParams,
}

impl WorkloadConfig {
    /// Constructs a new workload builder with default parameters.
    pub fn builder(store: SharedBookStore, generator: CatalogGenerator) -> WorkloadBuilder {
        WorkloadBuilder {
            store,
            generator,
            params: WorkloadParams::default(),
        }
    }

    /// The validated parameters of this workload.
    pub fn params(&self) -> &WorkloadParams {
        &self.params
    }

    /// The store all workers run against.
    pub fn store(&self) -> &SharedBookStore {
        &self.store
    }

    /// The generator used for new stock.
    pub fn generator(&self) -> &CatalogGenerator {
        &self.generator
    }
}
