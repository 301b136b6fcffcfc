//! Logging for tests.

use tracing_subscriber::EnvFilter;

/// Workspace crates whose events are captured at every level.
const CRATE_NAMES: &[&str] = &["workload", "bookstore_service", "bookstore_types"];

/// Routes events from the workspace crates to the test runner's output.
///
/// Other crates only log errors. A `RUST_LOG` variable replaces these defaults entirely. Calling
/// this more than once is harmless.
///
/// # Example
///
/// ```
/// bookstore_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<_> = std::iter::once("error".to_owned())
            .chain(CRATE_NAMES.iter().map(|name| format!("{name}=trace")))
            .collect();
        EnvFilter::new(directives.join(","))
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .without_time()
        .compact()
        .try_init()
        .ok();
}
