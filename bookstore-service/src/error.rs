//! Errors returned by [`BookStore`](crate::BookStore) implementations.

use bookstore_types::Isbn;
use thiserror::Error;

/// Result type for bookstore operations.
pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Errors that can occur when calling the bookstore.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The identifier is not a valid ISBN.
    #[error("invalid isbn {0}")]
    InvalidIsbn(Isbn),

    /// A book with this identifier is already stocked, or appears twice in one batch.
    #[error("duplicate isbn {0}")]
    DuplicateIsbn(Isbn),

    /// No book with this identifier is stocked.
    #[error("isbn {0} is not available")]
    UnknownIsbn(Isbn),

    /// The book has empty descriptive fields or a negative price.
    #[error("invalid book {isbn}: {reason}")]
    InvalidBook {
        /// The offending book.
        isbn: Isbn,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A copy count in the request is not positive.
    #[error("invalid number of copies for isbn {0}")]
    InvalidCopies(Isbn),

    /// A purchase asked for more copies than are in stock.
    #[error("not enough copies of isbn {isbn}: requested {requested}, available {available}")]
    NotEnoughCopies {
        /// The book that is short.
        isbn: Isbn,
        /// Number of copies requested in the batch.
        requested: u32,
        /// Number of copies in stock.
        available: u32,
    },

    /// The store cannot be reached through this client anymore.
    #[error("bookstore unavailable: {reason}")]
    Unavailable {
        /// Why the store is unavailable.
        reason: String,
    },
}

impl ServiceError {
    /// Returns `true` if the store rejected this single request.
    ///
    /// Rejections leave the client usable. Any other error means that subsequent calls through
    /// the same client are expected to fail as well.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }
}
