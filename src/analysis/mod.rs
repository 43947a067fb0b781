//! Aggregation of category files into yearly count tables.

pub mod aggregator;

pub use aggregator::*;
