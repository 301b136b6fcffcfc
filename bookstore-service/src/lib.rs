//! The bookstore service capability consumed by the workload engine.
//!
//! The engine never talks to a concrete store. It only depends on the [`BookStore`] trait, which
//! models the stock-manager and customer operations as batch calls that either succeed or fail
//! as a whole. [`InMemoryBookStore`] is the reference implementation used for local benchmark runs
//! and tests.
//!
//! Errors are split into *rejections*, where the store refused a single request, and fatal
//! conditions where the client handle itself can no longer be used. See [`ServiceError`].
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod in_memory;
pub mod store;

pub use error::{Result, ServiceError};
pub use in_memory::InMemoryBookStore;
pub use store::{BookStore, SharedBookStore};
