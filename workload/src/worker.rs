//! A single benchmark worker.
//!
//! A [`Worker`] runs a warm-up phase followed by a timed phase against the shared
//! [`WorkloadConfig`]. Each iteration draws from the worker's private RNG to pick one
//! [`Interaction`] and runs it. Interactions the store rejects count as failed iterations, any
//! other error ends the worker with a [`WorkerError`].
//!
//! Counters are owned by the running worker and handed out once, as a [`WorkerResult`], when the
//! timed phase ends.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bookstore_service::ServiceError;
use bookstore_types::{BookCopy, Isbn, StockBook};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::metrics::InteractionMetrics;
use crate::workload::{Interaction, WorkloadConfig};

/// An error that ended a worker before it completed its runs.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The store failed in a way that is not a rejection of a single request.
    #[error("{interaction} interaction failed")]
    Service {
        /// The interaction that was running.
        interaction: Interaction,
        /// The underlying store error.
        #[source]
        source: ServiceError,
    },
}

/// The outcome of one worker's timed phase.
#[derive(Debug, Default)]
pub struct WorkerResult {
    /// Index of the worker within its run.
    pub worker: usize,
    /// Timed iterations that completed without an error.
    pub successful_iterations: usize,
    /// Wall-clock duration of the timed phase.
    pub elapsed: Duration,
    /// Timed iterations requested by the workload.
    pub total_iterations: usize,
    /// Purchases that succeeded in the timed phase.
    pub successful_purchases: usize,
    /// Purchases attempted in the timed phase.
    pub attempted_purchases: usize,
    /// Per-interaction timings and failures of the timed phase.
    pub interactions: InteractionMetrics,
}

impl WorkerResult {
    /// Duration of the timed phase in nanoseconds.
    pub fn elapsed_nanos(&self) -> u128 {
        self.elapsed.as_nanos()
    }

    /// Successful purchases per second of the timed phase.
    ///
    /// Returns `0` if the timed phase took no measurable time.
    pub fn purchase_throughput(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.successful_purchases as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Counters of a single phase.
#[derive(Default)]
struct Counters {
    successful: usize,
    successful_purchases: usize,
    attempted_purchases: usize,
    interactions: InteractionMetrics,
}

/// Runs the interactions of a workload, see the [module docs](self).
#[derive(Debug)]
pub struct Worker {
    id: usize,
    config: Arc<WorkloadConfig>,
    rng: SmallRng,
}

impl Worker {
    /// Creates worker `id` with an RNG seeded from `seed`.
    pub fn new(id: usize, config: Arc<WorkloadConfig>, seed: u64) -> Self {
        Self {
            id,
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Runs the warm-up and timed phases and returns the result of the timed phase.
    pub async fn run(mut self) -> Result<WorkerResult, WorkerError> {
        let params = self.config.params.clone();

        tracing::debug!(worker = self.id, runs = params.warm_up_runs, "warming up");
        // Warm-up counters are dropped, the timed phase starts from zero.
        let mut warm_up = Counters::default();
        self.run_iterations(params.warm_up_runs, &mut warm_up).await?;

        let mut counters = Counters::default();
        let start = Instant::now();
        self.run_iterations(params.actual_runs, &mut counters).await?;
        let elapsed = start.elapsed();

        tracing::debug!(
            worker = self.id,
            successful = counters.successful,
            total = params.actual_runs,
            purchases = counters.successful_purchases,
            ?elapsed,
            "worker finished"
        );

        Ok(WorkerResult {
            worker: self.id,
            successful_iterations: counters.successful,
            elapsed,
            total_iterations: params.actual_runs,
            successful_purchases: counters.successful_purchases,
            attempted_purchases: counters.attempted_purchases,
            interactions: counters.interactions,
        })
    }

    async fn run_iterations(
        &mut self,
        runs: usize,
        counters: &mut Counters,
    ) -> Result<(), WorkerError> {
        for _ in 0..runs {
            let draw = self.rng.random_range(0.0..100.0);
            let interaction = self.config.params.select_interaction(draw);

            if interaction == Interaction::Purchase {
                counters.attempted_purchases += 1;
            }

            let start = Instant::now();
            match self.run_interaction(interaction).await {
                Ok(()) => {
                    counters.successful += 1;
                    if interaction == Interaction::Purchase {
                        counters.successful_purchases += 1;
                    }
                    counters
                        .interactions
                        .record_success(interaction, start.elapsed());
                }
                Err(error) if error.is_rejection() => {
                    tracing::trace!(worker = self.id, %interaction, %error, "interaction rejected");
                    counters.interactions.record_failure(interaction);
                }
                Err(source) => {
                    tracing::warn!(
                        worker = self.id,
                        %interaction,
                        error = &source as &dyn std::error::Error,
                        "worker aborted"
                    );
                    return Err(WorkerError::Service {
                        interaction,
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    async fn run_interaction(&mut self, interaction: Interaction) -> Result<(), ServiceError> {
        match interaction {
            Interaction::NewStock => self.acquire_new_stock().await,
            Interaction::Replenish => self.replenish_stock().await,
            Interaction::Purchase => self.buy_editor_picks().await,
        }
    }

    /// Adds generated books whose ISBNs are not stocked yet.
    async fn acquire_new_stock(&mut self) -> Result<(), ServiceError> {
        let store = &self.config.store;

        let stocked = store.get_books().await?;
        let candidates = self
            .config
            .generator
            .next_stock_books(self.config.params.num_books_to_add, &mut self.rng);

        let new_books = unstocked_books(candidates, &stocked);
        store.add_books(new_books).await
    }

    /// Adds copies to the books with the fewest copies in stock.
    async fn replenish_stock(&self) -> Result<(), ServiceError> {
        let params = &self.config.params;
        let store = &self.config.store;

        let stocked = store.get_books().await?;
        let copies = least_stocked(stocked, params.num_books_with_least_copies)
            .into_iter()
            .map(|book| BookCopy::new(book.isbn, params.num_add_copies))
            .collect();

        store.add_copies(copies).await
    }

    /// Buys copies of a sample of the editor picks.
    async fn buy_editor_picks(&mut self) -> Result<(), ServiceError> {
        let params = &self.config.params;
        let store = &self.config.store;

        let picks = store
            .get_editor_picks(params.num_editor_picks_to_get)
            .await?;
        let isbns: BTreeSet<Isbn> = picks.into_iter().map(|book| book.isbn).collect();

        let copies = self
            .config
            .generator
            .sample_isbns(&isbns, params.num_books_to_buy, &mut self.rng)
            .into_iter()
            .map(|isbn| BookCopy::new(isbn, params.num_copies_per_buy))
            .collect();

        store.buy_books(copies).await
    }
}

/// Returns the candidates whose ISBN is neither stocked nor used by an earlier candidate.
pub fn unstocked_books(candidates: Vec<StockBook>, stocked: &[StockBook]) -> Vec<StockBook> {
    let mut taken: BTreeSet<Isbn> = stocked.iter().map(|book| book.isbn).collect();
    candidates
        .into_iter()
        .filter(|book| taken.insert(book.isbn))
        .collect()
}

/// Returns the `count` books with the fewest copies, keeping listing order among equal counts.
pub fn least_stocked(mut books: Vec<StockBook>, count: usize) -> Vec<StockBook> {
    // `sort_by_key` is stable.
    books.sort_by_key(|book| book.num_copies);
    books.truncate(count);
    books
}

#[cfg(test)]
mod tests {
    use bookstore_service::{BookStore, InMemoryBookStore};
    use bookstore_test::faulty::FaultyBookStore;

    use super::*;
    use crate::generator::CatalogGenerator;

    fn book(isbn: u32, num_copies: u32) -> StockBook {
        StockBook {
            isbn: Isbn(isbn),
            title: "title".into(),
            author: "author".into(),
            price: 1.0,
            num_copies,
            num_sale_misses: 0,
            num_times_rated: 0,
            total_rating: 0,
            editor_pick: true,
        }
    }

    fn isbns(books: &[StockBook]) -> Vec<u32> {
        books.iter().map(|b| b.isbn.0).collect()
    }

    #[test]
    fn least_stocked_is_stable() {
        let books = vec![book(1, 5), book(2, 1), book(3, 5), book(4, 0), book(5, 1)];

        assert_eq!(isbns(&least_stocked(books.clone(), 3)), vec![4, 2, 5]);
        assert_eq!(isbns(&least_stocked(books.clone(), 4)), vec![4, 2, 5, 1]);
        assert_eq!(isbns(&least_stocked(books.clone(), 10)), vec![4, 2, 5, 1, 3]);
        assert!(least_stocked(books, 0).is_empty());
    }

    #[test]
    fn unstocked_books_is_a_set_difference() {
        let stocked = vec![book(1, 1), book(2, 1)];
        let candidates = vec![book(2, 3), book(3, 3), book(1, 3), book(4, 3), book(3, 7)];

        let new_books = unstocked_books(candidates, &stocked);
        assert_eq!(isbns(&new_books), vec![3, 4]);
        assert_eq!(new_books[0].num_copies, 3);

        assert!(unstocked_books(vec![book(1, 1)], &stocked).is_empty());
        assert_eq!(isbns(&unstocked_books(vec![book(9, 1)], &[])), vec![9]);
    }

    async fn seeded_store(books: Vec<StockBook>) -> InMemoryBookStore {
        let store = InMemoryBookStore::new();
        store.add_books(books).await.unwrap();
        store
    }

    #[tokio::test]
    async fn replenish_raises_least_stocked() {
        let store = seeded_store(vec![book(1, 5), book(2, 1), book(3, 9)]).await;
        let config = WorkloadConfig::builder(Arc::new(store.clone()), CatalogGenerator::default())
            .replenishment(1, 4)
            .build()
            .unwrap();

        let worker = Worker::new(0, config, 0);
        worker.replenish_stock().await.unwrap();

        assert_eq!(store.get_stored(Isbn(1)).unwrap().num_copies, 5);
        assert_eq!(store.get_stored(Isbn(2)).unwrap().num_copies, 5);
        assert_eq!(store.get_stored(Isbn(3)).unwrap().num_copies, 9);
    }

    #[tokio::test]
    async fn new_stock_only_adds_unknown_isbns() {
        bookstore_test::tracing::init();

        // Every ISBN the generator can produce is already stocked.
        let generator = CatalogGenerator {
            max_isbn: 3,
            ..Default::default()
        };
        let store = seeded_store(vec![book(1, 1), book(2, 1), book(3, 1)]).await;
        let config = WorkloadConfig::builder(Arc::new(store.clone()), generator)
            .books_to_add(10)
            .build()
            .unwrap();

        let mut worker = Worker::new(0, config, 0);
        worker.acquire_new_stock().await.unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_stored(Isbn(1)).unwrap().title, "title");
    }

    #[tokio::test]
    async fn new_stock_grows_catalog() {
        let generator = CatalogGenerator {
            max_isbn: 20,
            ..Default::default()
        };
        let store = seeded_store(vec![book(1, 1)]).await;
        let config = WorkloadConfig::builder(Arc::new(store.clone()), generator)
            .books_to_add(50)
            .build()
            .unwrap();

        let mut worker = Worker::new(0, config, 11);
        worker.acquire_new_stock().await.unwrap();
        assert!(store.len() > 1);
        assert!(store.len() <= 20);
    }

    #[tokio::test]
    async fn purchase_buys_sampled_picks() {
        let store = seeded_store(vec![book(1, 10), book(2, 10), book(3, 10)]).await;
        let config = WorkloadConfig::builder(Arc::new(store.clone()), CatalogGenerator::default())
            .purchase(10, 2, 3)
            .build()
            .unwrap();

        let mut worker = Worker::new(0, config, 5);
        worker.buy_editor_picks().await.unwrap();

        let remaining: Vec<_> = (1..=3)
            .map(|isbn| store.get_stored(Isbn(isbn)).unwrap().num_copies)
            .collect();
        assert_eq!(remaining.iter().filter(|&&n| n == 7).count(), 2);
        assert_eq!(remaining.iter().filter(|&&n| n == 10).count(), 1);
    }

    #[tokio::test]
    async fn purchase_only_workload() {
        let store = Arc::new(FaultyBookStore::new(
            seeded_store(vec![book(1, 1000), book(2, 1000)]).await,
        ));
        let config = WorkloadConfig::builder(store.clone(), CatalogGenerator::default())
            .interaction_mix(0.0, 0.0)
            .runs(5, 40)
            .purchase(2, 1, 1)
            .build()
            .unwrap();

        let result = Worker::new(3, config, 1).run().await.unwrap();

        assert_eq!(result.worker, 3);
        assert_eq!(result.total_iterations, 40);
        assert_eq!(result.successful_iterations, 40);
        assert_eq!(result.attempted_purchases, 40);
        assert_eq!(result.successful_purchases, 40);
        assert_eq!(result.interactions.get(Interaction::Purchase).successes(), 40);
        assert_eq!(result.interactions.get(Interaction::NewStock).successes(), 0);
        assert_eq!(result.interactions.get(Interaction::Replenish).successes(), 0);

        let calls = store.call_counts();
        assert_eq!(calls.get_books, 0);
        assert_eq!(calls.add_books, 0);
        assert_eq!(calls.add_copies, 0);
        assert_eq!(calls.buy_books, 45);
    }

    #[tokio::test]
    async fn rejected_purchases_are_counted_not_fatal() {
        let store = Arc::new(FaultyBookStore::new(
            seeded_store(vec![book(1, 10)]).await,
        ));
        store.reject_purchases(true);
        let config = WorkloadConfig::builder(store, CatalogGenerator::default())
            .interaction_mix(0.0, 0.0)
            .runs(0, 10)
            .build()
            .unwrap();

        let result = Worker::new(0, config, 1).run().await.unwrap();
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.attempted_purchases, 10);
        assert_eq!(result.successful_purchases, 0);
        assert_eq!(result.interactions.get(Interaction::Purchase).failures, 10);
    }

    #[tokio::test]
    async fn unavailable_store_aborts_worker() {
        let store = Arc::new(FaultyBookStore::new(InMemoryBookStore::new()));
        store.break_after(0);
        let config = WorkloadConfig::builder(store, CatalogGenerator::default())
            .interaction_mix(0.0, 100.0)
            .runs(0, 10)
            .build()
            .unwrap();

        let err = Worker::new(0, config, 1).run().await.unwrap_err();
        let WorkerError::Service {
            interaction,
            source,
        } = err;
        assert_eq!(interaction, Interaction::Replenish);
        assert!(!source.is_rejection());
    }

    #[tokio::test]
    async fn warm_up_is_not_counted() {
        let store = Arc::new(FaultyBookStore::new(
            seeded_store(vec![book(1, 1000)]).await,
        ));
        let config = WorkloadConfig::builder(store.clone(), CatalogGenerator::default())
            .interaction_mix(0.0, 0.0)
            .runs(25, 0)
            .build()
            .unwrap();

        let result = Worker::new(0, config, 1).run().await.unwrap();
        assert_eq!(store.call_counts().buy_books, 25);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.attempted_purchases, 0);
        assert_eq!(result.successful_purchases, 0);
        assert_eq!(result.interactions.get(Interaction::Purchase).successes(), 0);
    }

    #[test]
    fn throughput_of_empty_phase_is_zero() {
        let result = WorkerResult {
            successful_purchases: 10,
            ..Default::default()
        };
        assert_eq!(result.purchase_throughput(), 0.0);

        let result = WorkerResult {
            successful_purchases: 10,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(result.purchase_throughput(), 5.0);
        assert_eq!(result.elapsed_nanos(), 2_000_000_000);
    }
}
