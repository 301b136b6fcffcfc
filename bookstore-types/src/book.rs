//! Books, copies and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a book in the catalog.
///
/// Valid identifiers are strictly positive. The zero value can be constructed but is rejected by
/// every store operation.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Isbn(pub u32);

impl Isbn {
    /// Returns `true` if this identifier may be stored in a catalog.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Isbn {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A book as it is kept in stock, including inventory and rating counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockBook {
    /// Catalog identifier.
    pub isbn: Isbn,
    /// Title, never empty for a valid book.
    pub title: String,
    /// Author, never empty for a valid book.
    pub author: String,
    /// Unit price.
    pub price: f32,
    /// Copies currently available for purchase.
    pub num_copies: u32,
    /// How often a purchase failed because not enough copies were in stock.
    pub num_sale_misses: u64,
    /// How often the book has been rated.
    pub num_times_rated: u64,
    /// Sum of all ratings.
    pub total_rating: u64,
    /// Whether the book is currently featured as an editor pick.
    pub editor_pick: bool,
}

impl StockBook {
    /// Returns `true` if the book satisfies the invariants required to be stocked.
    pub fn is_valid(&self) -> bool {
        self.isbn.is_valid()
            && !self.title.is_empty()
            && !self.author.is_empty()
            && self.price.is_finite()
            && self.price >= 0.0
    }

    /// Returns the customer-facing view of this book.
    pub fn to_book(&self) -> Book {
        Book {
            isbn: self.isbn,
            title: self.title.clone(),
            author: self.author.clone(),
            price: self.price,
        }
    }
}

/// The customer-facing view of a book, without inventory details.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Catalog identifier.
    pub isbn: Isbn,
    /// Title of the book.
    pub title: String,
    /// Author of the book.
    pub author: String,
    /// Unit price.
    pub price: f32,
}

/// A number of copies of a single book, used for replenishment and purchases.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct BookCopy {
    /// The book the copies refer to.
    pub isbn: Isbn,
    /// Number of copies.
    pub num_copies: u32,
}

impl BookCopy {
    /// Creates a new batch entry for `num_copies` copies of `isbn`.
    pub fn new(isbn: Isbn, num_copies: u32) -> Self {
        Self { isbn, num_copies }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(isbn: u32) -> StockBook {
        StockBook {
            isbn: Isbn(isbn),
            title: "title".into(),
            author: "author".into(),
            price: 10.0,
            num_copies: 5,
            num_sale_misses: 0,
            num_times_rated: 0,
            total_rating: 0,
            editor_pick: true,
        }
    }

    #[test]
    fn zero_isbn_is_invalid() {
        assert!(!Isbn(0).is_valid());
        assert!(Isbn(1).is_valid());
        assert!(!book(0).is_valid());
    }

    #[test]
    fn validation_rejects_bad_fields() {
        assert!(book(1).is_valid());

        let mut missing_title = book(1);
        missing_title.title.clear();
        assert!(!missing_title.is_valid());

        let mut negative_price = book(1);
        negative_price.price = -1.0;
        assert!(!negative_price.is_valid());

        let mut nan_price = book(1);
        nan_price.price = f32::NAN;
        assert!(!nan_price.is_valid());
    }

    #[test]
    fn isbn_serializes_transparently() {
        let json = serde_json::to_string(&BookCopy::new(Isbn(42), 3)).unwrap();
        assert_eq!(json, r#"{"isbn":42,"num_copies":3}"#);
    }

    #[test]
    fn customer_view_drops_inventory() {
        let view = book(7).to_book();
        assert_eq!(view.isbn, Isbn(7));
        assert_eq!(view.title, "title");
        assert_eq!(view.price, 10.0);
    }
}
