//! fincast: scenario modeling and anomaly detection for personal budgets.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. [`cache`] memoizes scenario
//! results and [`analyzer`] is the in-process entry point.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cache;
pub mod analyzer;

pub use analyzer::{Analyzer, BatchResult};
pub use cache::{CacheConfig, CacheStats, ResultCache};
pub use domain::error::FincastError;
