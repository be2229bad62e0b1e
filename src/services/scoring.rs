//! Pluggable scoring strategies for unit selection
//!
//! Scores are lower-is-better. The shipped policy scores on raw distance;
//! policies receive the full incident so a severity-aware strategy can
//! adjust the base distance without an interface change.

use crate::domain::types::{Incident, Unit};

/// Scoring strategy applied to every candidate unit
///
/// `distance_km` is the precomputed great-circle distance between the
/// incident and the unit. Implementations return the adjusted score.
/// Non-finite scores mark the candidate as unusable and the matcher
/// skips it.
pub trait ScoringPolicy: Send + Sync {
    fn score(&self, incident: &Incident, unit: &Unit, distance_km: f64) -> f64;
}

/// Default policy: the score is the base distance itself
#[derive(Debug, Clone, Copy, Default)]
pub struct DistancePolicy;

impl ScoringPolicy for DistancePolicy {
    fn score(&self, _incident: &Incident, _unit: &Unit, distance_km: f64) -> f64 {
        distance_km
    }
}

impl<F> ScoringPolicy for F
where
    F: Fn(&Incident, &Unit, f64) -> f64 + Send + Sync,
{
    fn score(&self, incident: &Incident, unit: &Unit, distance_km: f64) -> f64 {
        self(incident, unit, distance_km)
    }
}

/// Resolve a configured policy name
///
/// "distance" is the only shipping policy; severity-weighted strategies
/// plug in here once their formula is settled.
pub fn policy_by_name(name: &str) -> Option<Box<dyn ScoringPolicy>> {
    match name {
        "distance" => Some(Box::new(DistancePolicy)),
        _ => None,
    }
}
