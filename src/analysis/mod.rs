//! Statistics over fetched issues.

pub mod aggregator;

pub use aggregator::*;
