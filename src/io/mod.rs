//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `ingest` - Line-oriented incident wire format parsing
//! - `roster` - Roster provider port and the config-backed static roster
//! - `report` - Decision output, one line per incident
//! - `prometheus` - Prometheus metrics HTTP endpoint

pub mod ingest;
pub mod prometheus;
pub mod report;
pub mod roster;

// Re-export commonly used types
pub use ingest::{parse_line, IngestError};
pub use report::{DecisionWriter, NO_MATCH_LINE};
pub use roster::{RosterError, RosterProvider, StaticRoster};
