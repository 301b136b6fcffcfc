//! Per-interaction timing and failure metrics.

use std::fmt;
use std::time::Duration;

use sketches_ddsketch::DDSketch;

use crate::workload::Interaction;

/// Timings of successful runs and the number of failed runs of one interaction.
#[derive(Default)]
pub struct InteractionStats {
    /// Wall-clock duration of every successful run, in seconds.
    pub timing: DDSketch,
    /// Runs rejected by the store.
    pub failures: u64,
}

impl InteractionStats {
    /// Number of successful runs.
    pub fn successes(&self) -> usize {
        self.timing.count()
    }

    fn merge(&mut self, other: &Self) {
        if let Err(error) = self.timing.merge(&other.timing) {
            tracing::error!(?error, "failed to merge interaction timings");
        }
        self.failures += other.failures;
    }
}

impl fmt::Debug for InteractionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionStats")
            .field("successes", &self.successes())
            .field("failures", &self.failures)
            .finish()
    }
}

/// [`InteractionStats`] for each [`Interaction`].
#[derive(Debug, Default)]
pub struct InteractionMetrics {
    new_stock: InteractionStats,
    replenish: InteractionStats,
    purchase: InteractionStats,
}

impl InteractionMetrics {
    /// Returns the stats of a single interaction.
    pub fn get(&self, interaction: Interaction) -> &InteractionStats {
        match interaction {
            Interaction::NewStock => &self.new_stock,
            Interaction::Replenish => &self.replenish,
            Interaction::Purchase => &self.purchase,
        }
    }

    fn get_mut(&mut self, interaction: Interaction) -> &mut InteractionStats {
        match interaction {
            Interaction::NewStock => &mut self.new_stock,
            Interaction::Replenish => &mut self.replenish,
            Interaction::Purchase => &mut self.purchase,
        }
    }

    /// Records a successful run that took `elapsed`.
    pub fn record_success(&mut self, interaction: Interaction, elapsed: Duration) {
        self.get_mut(interaction)
            .timing
            .add(elapsed.as_secs_f64());
    }

    /// Records a run the store rejected.
    pub fn record_failure(&mut self, interaction: Interaction) {
        self.get_mut(interaction).failures += 1;
    }

    /// Adds all stats of `other` to these.
    pub fn merge(&mut self, other: &Self) {
        for interaction in Interaction::ALL {
            self.get_mut(interaction).merge(other.get(interaction));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_per_interaction() {
        let mut a = InteractionMetrics::default();
        a.record_success(Interaction::Purchase, Duration::from_millis(2));
        a.record_failure(Interaction::Replenish);

        let mut b = InteractionMetrics::default();
        b.record_success(Interaction::Purchase, Duration::from_millis(4));
        b.record_success(Interaction::NewStock, Duration::from_millis(1));
        b.record_failure(Interaction::Replenish);

        a.merge(&b);
        assert_eq!(a.get(Interaction::Purchase).successes(), 2);
        assert_eq!(a.get(Interaction::NewStock).successes(), 1);
        assert_eq!(a.get(Interaction::Replenish).successes(), 0);
        assert_eq!(a.get(Interaction::Replenish).failures, 2);

        let sum = a.get(Interaction::Purchase).timing.sum().unwrap();
        assert!((sum - 0.006).abs() < 1e-9);
    }
}
