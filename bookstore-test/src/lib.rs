//! Test utilities for the bookstore workload and its stores.
//!
//! This crate provides utilities to facilitate testing of the workload engine. See the modules for
//! all available utilities.

pub mod faulty;
pub mod tracing;
