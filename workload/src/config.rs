//! Configuration for the workload binary.
//!
//! Settings can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables (prefixed with `BW__`)
//! 2. YAML configuration file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! # Environment Variables
//!
//! Environment variables use `BW__` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `BW__WORKERS=4` sets the number of concurrent workers
//! - `BW__WORKLOAD__ACTUAL_RUNS=1000` sets the timed iterations per worker
//! - `BW__LOGGING__FORMAT=json` switches to JSON logs
//!
//! # YAML Configuration File
//!
//! The above configuration in YAML format would look like this:
//!
//! ```yaml
//! workers: 4
//!
//! workload:
//!   actual_runs: 1000
//!
//! logging:
//!   format: json
//! ```

use std::path::Path;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::generator::CatalogGenerator;
use crate::workload::WorkloadParams;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "BW__";

/// The catalog loaded into the store before any worker starts.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Catalog {
    /// Number of books in the seed catalog.
    ///
    /// Defaults to `5000`.
    pub size: usize,

    /// Copies every seed book starts with.
    ///
    /// Defaults to `50`.
    pub initial_copies: u32,

    /// Length of titles and authors of seed books, between 1 and 100.
    ///
    /// Defaults to `50`.
    pub string_length: usize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            size: 5000,
            initial_copies: 50,
            string_length: 50,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted. The format can be explicitly specified or
/// auto-detected based on whether output is to a TTY.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Pretty printing with colors.
    Pretty,

    /// Simplified plain text output.
    Simplified,

    /// Dump out JSON lines.
    Json,
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum level of emitted log messages.
    ///
    /// A `RUST_LOG` environment variable takes precedence over this setting.
    ///
    /// Defaults to `info`.
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Output format of log messages.
    ///
    /// Defaults to [`LogFormat::Auto`].
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Settings of a complete benchmark run.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Number of concurrent workers.
    ///
    /// Defaults to `10`.
    pub workers: usize,

    /// Master seed for all random decisions of a run.
    ///
    /// Each worker derives its own seed from this value. When unset, a random seed is chosen and
    /// logged, so a run can be repeated.
    pub seed: Option<u64>,

    /// Whether to remove all books from the store once the run completes.
    ///
    /// Defaults to `true`.
    pub cleanup: bool,

    /// The seed catalog.
    pub catalog: Catalog,

    /// Bounds for books generated during the run.
    pub generator: CatalogGenerator,

    /// Interaction mix and sizes.
    pub workload: WorkloadParams,

    /// Logging configuration.
    pub logging: Logging,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: 10,
            seed: None,
            cleanup: true,
            catalog: Catalog::default(),
            generator: CatalogGenerator::default(),
            workload: WorkloadParams::default(),
            logging: Logging::default(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, an optional YAML file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let settings = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        figment::Jail::expect_with(|_jail| {
            let settings = Settings::load(None).unwrap();
            assert_eq!(settings.workers, 10);
            assert_eq!(settings.seed, None);
            assert!(settings.cleanup);
            assert_eq!(settings.catalog, Catalog::default());
            assert_eq!(settings.workload, WorkloadParams::default());
            assert_eq!(settings.logging.level, LevelFilter::INFO);
            assert_eq!(settings.logging.format, LogFormat::Auto);

            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BW__WORKERS", "4");
            jail.set_env("BW__SEED", "1234");
            jail.set_env("BW__CLEANUP", "false");
            jail.set_env("BW__WORKLOAD__ACTUAL_RUNS", "1000");
            jail.set_env("BW__WORKLOAD__PERCENT_RARE_INTERACTION", "2.5");
            jail.set_env("BW__GENERATOR__MAX_ISBN", "5000");
            jail.set_env("BW__LOGGING__LEVEL", "debug");
            jail.set_env("BW__LOGGING__FORMAT", "json");

            let settings = Settings::load(None).unwrap();
            assert_eq!(settings.workers, 4);
            assert_eq!(settings.seed, Some(1234));
            assert!(!settings.cleanup);
            assert_eq!(settings.workload.actual_runs, 1000);
            assert_eq!(settings.workload.percent_rare_interaction, 2.5);
            assert_eq!(settings.workload.warm_up_runs, 100);
            assert_eq!(settings.generator.max_isbn, 5000);
            assert_eq!(settings.logging.level, LevelFilter::DEBUG);
            assert_eq!(settings.logging.format, LogFormat::Json);

            Ok(())
        });
    }

    #[test]
    fn configurable_via_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
                workers: 2
                catalog:
                  size: 100
                  initial_copies: 7
                workload:
                  percent_rare_interaction: 0.0
                  percent_frequent_stock_interaction: 0.0
                  num_books_to_buy: 3
                "#,
            )
            .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.set_env("BW__WORKERS", "3");

            let settings = Settings::load(Some(tempfile.path())).unwrap();
            assert_eq!(settings.workers, 3);
            assert_eq!(settings.catalog.size, 100);
            assert_eq!(settings.catalog.initial_copies, 7);
            assert_eq!(settings.catalog.string_length, 50);
            assert_eq!(settings.workload.percent_rare_interaction, 0.0);
            assert_eq!(settings.workload.num_books_to_buy, 3);
            assert_eq!(settings.workload.num_copies_per_buy, 1);

            Ok(())
        });
    }
}
