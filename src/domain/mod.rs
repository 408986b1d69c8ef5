//! Core domain types and pure logic.

pub mod category;
pub mod profile;
pub mod ingest;
pub mod metrics;
pub mod anomaly;
pub mod fingerprint;
pub mod scenario;
pub mod summary;
pub mod roi;
pub mod config_validation;
pub mod error;
