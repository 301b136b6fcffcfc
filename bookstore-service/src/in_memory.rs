//! In-memory bookstore.
//!
//! This provides a [`BookStore`] backed by a `BTreeMap`, which lets the benchmark run without a
//! remote service and gives tests a store they can inspect directly. The store is [`Clone`], so a
//! test can keep a handle while the workload owns a shared copy.
//!
//! Every batch operation validates the complete batch before touching the stock, so a failed call
//! never leaves partial changes behind. The one exception is the sales-miss counter, which is
//! bumped for every book a failed purchase was short of.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bookstore_types::{Book, BookCopy, Isbn, StockBook};
use rand::seq::IteratorRandom;

use crate::error::{Result, ServiceError};
use crate::store::BookStore;

type Stock = BTreeMap<Isbn, StockBook>;

/// A [`BookStore`] that keeps all books in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookStore {
    stock: Arc<Mutex<Stock>>,
}

impl InMemoryBookStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the stocked book, if present.
    pub fn get_stored(&self, isbn: Isbn) -> Option<StockBook> {
        self.stock.lock().unwrap().get(&isbn).cloned()
    }

    /// Returns the number of stocked books.
    pub fn len(&self) -> usize {
        self.stock.lock().unwrap().len()
    }

    /// Returns `true` if no books are stocked.
    pub fn is_empty(&self) -> bool {
        self.stock.lock().unwrap().is_empty()
    }

    fn insert_books(&self, books: Vec<StockBook>) -> Result<()> {
        let mut stock = self.stock.lock().unwrap();

        let mut seen = HashSet::with_capacity(books.len());
        for book in &books {
            validate_book(book)?;
            if stock.contains_key(&book.isbn) || !seen.insert(book.isbn) {
                return Err(ServiceError::DuplicateIsbn(book.isbn));
            }
        }

        for book in books {
            stock.insert(book.isbn, book);
        }
        Ok(())
    }

    fn increase_copies(&self, copies: Vec<BookCopy>) -> Result<()> {
        let mut stock = self.stock.lock().unwrap();

        let requested = sum_by_isbn(&stock, &copies)?;
        for (isbn, num_copies) in requested {
            if let Some(book) = stock.get_mut(&isbn) {
                book.num_copies = book.num_copies.saturating_add(num_copies);
            }
        }
        Ok(())
    }

    fn buy(&self, copies: Vec<BookCopy>) -> Result<()> {
        let mut stock = self.stock.lock().unwrap();

        let requested = sum_by_isbn(&stock, &copies)?;

        let mut shortage = None;
        for (&isbn, &num_copies) in &requested {
            let Some(book) = stock.get_mut(&isbn) else {
                continue;
            };
            if book.num_copies < num_copies {
                book.num_sale_misses += 1;
                if shortage.is_none() {
                    shortage = Some(ServiceError::NotEnoughCopies {
                        isbn,
                        requested: num_copies,
                        available: book.num_copies,
                    });
                }
            }
        }
        if let Some(error) = shortage {
            tracing::trace!(%error, "rejecting purchase");
            return Err(error);
        }

        for (isbn, num_copies) in requested {
            if let Some(book) = stock.get_mut(&isbn) {
                book.num_copies -= num_copies;
            }
        }
        Ok(())
    }

    fn editor_picks(&self, num_books: usize) -> Vec<Book> {
        let stock = self.stock.lock().unwrap();
        stock
            .values()
            .filter(|book| book.editor_pick)
            .choose_multiple(&mut rand::rng(), num_books)
            .into_iter()
            .map(StockBook::to_book)
            .collect()
    }
}

fn validate_book(book: &StockBook) -> Result<()> {
    if !book.isbn.is_valid() {
        return Err(ServiceError::InvalidIsbn(book.isbn));
    }
    let reason = if book.title.is_empty() {
        "empty title"
    } else if book.author.is_empty() {
        "empty author"
    } else if !book.price.is_finite() || book.price < 0.0 {
        "negative price"
    } else {
        return Ok(());
    };
    Err(ServiceError::InvalidBook {
        isbn: book.isbn,
        reason,
    })
}

/// Validates a copy batch against the stock and merges entries for the same ISBN.
fn sum_by_isbn(stock: &Stock, copies: &[BookCopy]) -> Result<HashMap<Isbn, u32>> {
    let mut requested = HashMap::with_capacity(copies.len());
    for copy in copies {
        if !copy.isbn.is_valid() {
            return Err(ServiceError::InvalidIsbn(copy.isbn));
        }
        if copy.num_copies == 0 {
            return Err(ServiceError::InvalidCopies(copy.isbn));
        }
        if !stock.contains_key(&copy.isbn) {
            return Err(ServiceError::UnknownIsbn(copy.isbn));
        }
        let total: &mut u32 = requested.entry(copy.isbn).or_default();
        *total = total.saturating_add(copy.num_copies);
    }
    Ok(requested)
}

#[async_trait::async_trait]
impl BookStore for InMemoryBookStore {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn get_books(&self) -> Result<Vec<StockBook>> {
        Ok(self.stock.lock().unwrap().values().cloned().collect())
    }

    async fn add_books(&self, books: Vec<StockBook>) -> Result<()> {
        self.insert_books(books)
    }

    async fn add_copies(&self, copies: Vec<BookCopy>) -> Result<()> {
        self.increase_copies(copies)
    }

    async fn buy_books(&self, copies: Vec<BookCopy>) -> Result<()> {
        self.buy(copies)
    }

    async fn get_editor_picks(&self, num_books: usize) -> Result<Vec<Book>> {
        Ok(self.editor_picks(num_books))
    }

    async fn remove_all_books(&self) -> Result<()> {
        self.stock.lock().unwrap().clear();
        Ok(())
    }
}
