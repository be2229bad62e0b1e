//! Shared types for incident dispatch

use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::geo::GeoPoint;

/// Newtype wrapper for unit identifiers to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[repr(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Severity value outside the accepted scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("severity {0} outside range 1..=10")]
pub struct SeverityError(pub i64);

/// Incident severity on the 1..=10 scale used by upstream callers
///
/// Callers map their criticality labels to this scale before handing the
/// incident over; this service only checks the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    #[inline]
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Severity {
    type Error = SeverityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(SeverityError(value))
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reported incident awaiting unit assignment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incident {
    pub position: GeoPoint,
    pub severity: Severity,
}

/// A response unit available for assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub position: GeoPoint,
}

/// The selected unit together with the distance and score that won
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitMatch {
    pub unit_id: UnitId,
    pub distance_km: f64,
    pub score: f64,
}

/// An accepted incident queued for dispatch
///
/// The request id exists only for log correlation across the pipeline.
#[derive(Debug, Clone)]
pub struct IncidentRequest {
    pub request_id: Uuid,
    pub incident: Incident,
    pub received_at: Instant,
}

impl IncidentRequest {
    pub fn new(incident: Incident) -> Self {
        Self { request_id: Uuid::now_v7(), incident, received_at: Instant::now() }
    }
}
