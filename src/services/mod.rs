//! Services - matching logic and the dispatch loop
//!
//! This module contains the core business logic services:
//! - `matcher` - Nearest-unit selection over a roster snapshot
//! - `scoring` - Pluggable scoring strategies (distance is the default)
//! - `dispatcher` - Resident loop from incident request to decision line

pub mod dispatcher;
pub mod matcher;
pub mod scoring;

// Re-export commonly used types
pub use dispatcher::Dispatcher;
pub use matcher::Matcher;
pub use scoring::{policy_by_name, DistancePolicy, ScoringPolicy};
