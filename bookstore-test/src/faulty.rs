//! A [`BookStore`] wrapper that injects failures and counts calls.
//!
//! ```
//! use bookstore_service::InMemoryBookStore;
//! use bookstore_test::faulty::FaultyBookStore;
//!
//! let store = FaultyBookStore::new(InMemoryBookStore::new());
//! store.reject_purchases(true);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bookstore_service::{BookStore, Result, ServiceError};
use bookstore_types::{Book, BookCopy, Isbn, StockBook};

/// Number of calls made to each [`BookStore`] operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    /// Calls to [`BookStore::get_books`].
    pub get_books: usize,
    /// Calls to [`BookStore::add_books`].
    pub add_books: usize,
    /// Calls to [`BookStore::add_copies`].
    pub add_copies: usize,
    /// Calls to [`BookStore::buy_books`].
    pub buy_books: usize,
    /// Calls to [`BookStore::get_editor_picks`].
    pub get_editor_picks: usize,
}

/// Wraps a store and fails selected calls on demand.
#[derive(Debug)]
pub struct FaultyBookStore<S> {
    inner: S,
    reject_purchases: AtomicBool,
    fail_cleanup: AtomicBool,
    /// Every call fails as unavailable once this many calls were made.
    break_after: AtomicUsize,

    calls: AtomicUsize,
    get_books: AtomicUsize,
    add_books: AtomicUsize,
    add_copies: AtomicUsize,
    buy_books: AtomicUsize,
    get_editor_picks: AtomicUsize,
}

impl<S> FaultyBookStore<S> {
    /// Wraps `inner` without injecting any failures.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reject_purchases: AtomicBool::new(false),
            fail_cleanup: AtomicBool::new(false),
            break_after: AtomicUsize::new(usize::MAX),
            calls: AtomicUsize::new(0),
            get_books: AtomicUsize::new(0),
            add_books: AtomicUsize::new(0),
            add_copies: AtomicUsize::new(0),
            buy_books: AtomicUsize::new(0),
            get_editor_picks: AtomicUsize::new(0),
        }
    }

    /// Rejects every purchase with [`ServiceError::NotEnoughCopies`] while enabled.
    pub fn reject_purchases(&self, reject: bool) {
        self.reject_purchases.store(reject, Ordering::Relaxed);
    }

    /// Fails [`BookStore::remove_all_books`] as unavailable while enabled.
    pub fn fail_cleanup(&self, fail: bool) {
        self.fail_cleanup.store(fail, Ordering::Relaxed);
    }

    /// Lets `calls` more calls through, then fails every call as unavailable.
    pub fn break_after(&self, calls: usize) {
        let made = self.calls.load(Ordering::Relaxed);
        self.break_after
            .store(made.saturating_add(calls), Ordering::Relaxed);
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns how often each operation has been called so far.
    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            get_books: self.get_books.load(Ordering::Relaxed),
            add_books: self.add_books.load(Ordering::Relaxed),
            add_copies: self.add_copies.load(Ordering::Relaxed),
            buy_books: self.buy_books.load(Ordering::Relaxed),
            get_editor_picks: self.get_editor_picks.load(Ordering::Relaxed),
        }
    }

    fn record(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::Relaxed);
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if call >= self.break_after.load(Ordering::Relaxed) {
            return Err(ServiceError::Unavailable {
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: BookStore> BookStore for FaultyBookStore<S> {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn get_books(&self) -> Result<Vec<StockBook>> {
        self.record(&self.get_books)?;
        self.inner.get_books().await
    }

    async fn add_books(&self, books: Vec<StockBook>) -> Result<()> {
        self.record(&self.add_books)?;
        self.inner.add_books(books).await
    }

    async fn add_copies(&self, copies: Vec<BookCopy>) -> Result<()> {
        self.record(&self.add_copies)?;
        self.inner.add_copies(copies).await
    }

    async fn buy_books(&self, copies: Vec<BookCopy>) -> Result<()> {
        self.record(&self.buy_books)?;
        if self.reject_purchases.load(Ordering::Relaxed) {
            let isbn = copies.first().map_or(Isbn(0), |copy| copy.isbn);
            return Err(ServiceError::NotEnoughCopies {
                isbn,
                requested: copies.first().map_or(0, |copy| copy.num_copies),
                available: 0,
            });
        }
        self.inner.buy_books(copies).await
    }

    async fn get_editor_picks(&self, num_books: usize) -> Result<Vec<Book>> {
        self.record(&self.get_editor_picks)?;
        self.inner.get_editor_picks(num_books).await
    }

    async fn remove_all_books(&self) -> Result<()> {
        if self.fail_cleanup.load(Ordering::Relaxed) {
            return Err(ServiceError::Unavailable {
                reason: "injected cleanup failure".into(),
            });
        }
        self.inner.remove_all_books().await
    }
}
