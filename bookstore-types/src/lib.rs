//! Shared domain types for the bookstore catalog.
//!
//! These types describe the catalog as seen by both sides of the benchmark: the service that stores
//! books and the workload engine that drives it. They are plain values, serializable with
//! [`serde`], and carry no behavior beyond simple validation helpers.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod book;

pub use book::{Book, BookCopy, Isbn, StockBook};
