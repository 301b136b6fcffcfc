//! Randomized test data for the bookstore.
//!
//! [`CatalogGenerator`] never owns a random source. Every operation takes the caller's RNG, so
//! concurrent workers can share one generator while each keeps its own private randomness.

use std::collections::{BTreeMap, BTreeSet};

use bookstore_types::{Isbn, StockBook};
use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

/// Longest title or author a generated book may have.
pub const MAX_STRING_LENGTH: usize = 100;

/// Upper bound for ISBNs of the seed catalog.
const MAX_SEED_ISBN: u32 = i32::MAX as u32;

/// Bounds for randomly generated books.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogGenerator {
    /// Largest ISBN handed out for new stock. ISBNs are drawn from `1..=max_isbn`.
    pub max_isbn: u32,
    /// Longest title or author. Lengths are drawn from `1..=max_string_length`.
    ///
    /// Must not exceed [`MAX_STRING_LENGTH`].
    pub max_string_length: usize,
    /// Prices are drawn from `0..max_price`.
    pub max_price: u32,
    /// Copy, sales-miss and rating counters are drawn from `0..max_count`.
    pub max_count: u32,
}

impl Default for CatalogGenerator {
    fn default() -> Self {
        Self {
            max_isbn: 1000,
            max_string_length: 100,
            max_price: 100,
            max_count: 200,
        }
    }
}

impl CatalogGenerator {
    /// Returns `count` ISBNs drawn uniformly from `isbns`, without replacement.
    ///
    /// If `count` is at least the size of the input, a copy of the full set is returned. The input
    /// is never modified.
    pub fn sample_isbns<R: Rng>(
        &self,
        isbns: &BTreeSet<Isbn>,
        count: usize,
        rng: &mut R,
    ) -> BTreeSet<Isbn> {
        if count >= isbns.len() {
            return isbns.clone();
        }

        isbns
            .iter()
            .copied()
            .choose_multiple(rng, count)
            .into_iter()
            .collect()
    }

    /// Generates `count` random books.
    ///
    /// ISBNs are drawn independently, so the result may contain duplicates and may collide with
    /// books that are already stocked.
    pub fn next_stock_books<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<StockBook> {
        (0..count)
            .map(|_| {
                let isbn = Isbn(rng.random_range(1..=self.max_isbn.max(1)));
                let title_len = rng.random_range(1..=self.max_string_length.max(1));
                let author_len = rng.random_range(1..=self.max_string_length.max(1));
                let num_copies = self.random_count(rng);
                self.random_book(isbn, title_len, author_len, num_copies, rng)
            })
            .collect()
    }

    /// Generates the initial catalog loaded before a benchmark starts.
    ///
    /// Unlike [`next_stock_books`](Self::next_stock_books), ISBNs are distinct and drawn from
    /// the full positive `i32` range. Every book starts with `initial_copies` copies and a title
    /// and author of exactly `string_length` characters.
    pub fn seed_catalog<R: Rng>(
        &self,
        count: usize,
        initial_copies: u32,
        string_length: usize,
        rng: &mut R,
    ) -> Vec<StockBook> {
        let string_length = string_length.max(1);
        let count = count.min(MAX_SEED_ISBN as usize);

        let mut books = BTreeMap::new();
        while books.len() < count {
            let isbn = Isbn(rng.random_range(1..=MAX_SEED_ISBN));
            if books.contains_key(&isbn) {
                continue;
            }
            let book = self.random_book(isbn, string_length, string_length, initial_copies, rng);
            books.insert(isbn, book);
        }

        books.into_values().collect()
    }

    fn random_book<R: Rng>(
        &self,
        isbn: Isbn,
        title_len: usize,
        author_len: usize,
        num_copies: u32,
        rng: &mut R,
    ) -> StockBook {
        StockBook {
            isbn,
            title: random_string(title_len, rng),
            author: random_string(author_len, rng),
            price: rng.random_range(0..self.max_price.max(1)) as f32,
            num_copies,
            num_sale_misses: self.random_count(rng).into(),
            num_times_rated: self.random_count(rng).into(),
            total_rating: self.random_count(rng).into(),
            editor_pick: rng.random_bool(0.5),
        }
    }

    fn random_count<R: Rng>(&self, rng: &mut R) -> u32 {
        rng.random_range(0..self.max_count.max(1))
    }
}

fn random_string<R: Rng>(len: usize, rng: &mut R) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}
