//! The [`BookStore`] trait.

use std::fmt::Debug;
use std::sync::Arc;

use bookstore_types::{Book, BookCopy, StockBook};

use crate::error::Result;

/// A bookstore handle shared between concurrent workers.
pub type SharedBookStore = Arc<dyn BookStore>;

/// The operations the workload engine performs against a bookstore.
///
/// Implementations must tolerate concurrent calls from many tasks. The engine does not lock
/// around any of these methods.
#[async_trait::async_trait]
pub trait BookStore: Debug + Send + Sync + 'static {
    /// The store name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Lists the full stock in a stable order.
    async fn get_books(&self) -> Result<Vec<StockBook>>;

    /// Adds new books to the stock.
    ///
    /// Fails without changes if any book is invalid or its ISBN is already stocked.
    async fn add_books(&self, books: Vec<StockBook>) -> Result<()>;

    /// Increases the number of copies of stocked books.
    async fn add_copies(&self, copies: Vec<BookCopy>) -> Result<()>;

    /// Buys copies of stocked books.
    ///
    /// Fails without changes if any requested quantity is not available.
    async fn buy_books(&self, copies: Vec<BookCopy>) -> Result<()>;

    /// Returns up to `num_books` books currently flagged as editor picks.
    async fn get_editor_picks(&self, num_books: usize) -> Result<Vec<Book>>;

    /// Removes every book from the stock.
    async fn remove_all_books(&self) -> Result<()>;
}
