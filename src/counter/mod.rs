//! Visit counting
//!
//! Turns one page load into the site unique-visitor, site page-view and
//! page page-view updates against the shared counter store.

pub mod aggregator;
pub mod keys;
pub mod models;

pub use aggregator::CounterAggregator;
pub use keys::KeyNamer;
pub use models::{CounterSnapshot, Visit};
