//! Print the results of a benchmark run.

use std::time::Duration;

use sketches_ddsketch::DDSketch;
use yansi::Paint;

use crate::benchmark::Outcome;
use crate::metrics::InteractionStats;
use crate::workload::Interaction;

/// Prints per-interaction metrics, per-worker results and the aggregated figures to stdout.
pub fn print(outcome: &Outcome) {
    for interaction in Interaction::ALL {
        println!();
        println!(
            "{} {}",
            "## Interaction".bold(),
            interaction.name().bold().blue()
        );
        print_interaction(outcome.interactions.get(interaction));
    }

    println!();
    println!("{}", "## Workers".bold());
    for result in &outcome.results {
        println!(
            "  #{}: {}/{} successful, {}/{} purchases in {:.2?}",
            result.worker,
            result.successful_iterations.bold(),
            result.total_iterations,
            result.successful_purchases.bold(),
            result.attempted_purchases,
            result.elapsed,
        );
    }

    let report = &outcome.report;
    println!();
    println!(
        "{} ({} workers)",
        "## TOTALS".bold(),
        report.workers.bold()
    );
    println!("  throughput: {:.4} purchases/s", report.throughput.bold());
    println!("  latency: {:.4}", report.latency.bold());
}

fn print_interaction(stats: &InteractionStats) {
    print!(
        "{} ({} ok",
        "RUNS:".bold().green(),
        stats.successes().bold()
    );
    if stats.failures > 0 {
        print!(
            ", {}",
            format!("{} FAILURES", stats.failures).bold().red()
        );
    }
    println!(")");

    if stats.successes() > 0 {
        print_percentiles(&stats.timing);
    }
}

fn print_percentiles(sketch: &DDSketch) {
    let quantile = |q| {
        let seconds = sketch.quantile(q).ok().flatten().unwrap_or_default();
        Duration::from_secs_f64(seconds.max(0.0))
    };

    let ops = sketch.count();
    let avg = Duration::from_secs_f64(sketch.sum().unwrap_or_default() / ops as f64);
    let p50 = quantile(0.5);
    let p90 = quantile(0.9);
    let p99 = quantile(0.99);
    println!(
        "  avg: {:.2?}; p50: {p50:.2?}; p90: {p90:.2?}; p99: {p99:.2?}",
        avg.bold()
    );
}
