//! Type definitions for the fraud scoring service

pub mod raw;
pub mod result;
pub mod transaction;

pub use raw::RawFeatures;
pub use result::{ScoringDetails, ScoringResult};
pub use transaction::{Location, Transaction};
