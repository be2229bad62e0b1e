//! Domain models - core dispatch types and geometry
//!
//! This module contains the canonical data types used throughout the system:
//! - `GeoPoint` - validated position with great-circle distance
//! - `Incident` - a reported incident (position plus severity)
//! - `Unit` - a response unit on the roster
//! - `UnitMatch` - the selected unit with its winning score
//! - `IncidentRequest` - an accepted incident on its way to the dispatcher

pub mod geo;
pub mod types;

// Re-export commonly used types at module level
pub use geo::{GeoError, GeoPoint, EARTH_RADIUS_KM};
pub use types::{Incident, IncidentRequest, Severity, Unit, UnitId, UnitMatch};
