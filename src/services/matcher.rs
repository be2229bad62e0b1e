//! Nearest-unit selection over a roster snapshot
//!
//! A single linear scan scores every unit and keeps the strict minimum, so
//! among equal scores the first-encountered unit wins and the result is
//! deterministic for a given roster order. Selection reads its inputs and
//! allocates the result; a shared `Matcher` is safe to call from concurrent
//! tasks.

use crate::domain::types::{Incident, Unit, UnitMatch};
use crate::services::scoring::{DistancePolicy, ScoringPolicy};
use smallvec::SmallVec;
use tracing::debug;

/// Inline capacity for ranked results; typical rosters avoid a heap allocation
const RANK_INLINE_UNITS: usize = 8;

/// Scores a roster against one incident and picks the winner
pub struct Matcher {
    policy: Box<dyn ScoringPolicy>,
}

impl Matcher {
    pub fn new() -> Self {
        Self { policy: Box::new(DistancePolicy) }
    }

    /// Create a matcher with a custom scoring policy
    pub fn with_policy(policy: Box<dyn ScoringPolicy>) -> Self {
        Self { policy }
    }

    /// Pick the lowest-scoring unit for the incident
    ///
    /// Returns `None` when the roster is empty or every candidate scored
    /// non-finite.
    pub fn select(&self, incident: &Incident, units: &[Unit]) -> Option<UnitMatch> {
        let mut best: Option<(&Unit, f64, f64)> = None;

        for unit in units {
            let distance_km = incident.position.distance_km(&unit.position);
            let score = self.policy.score(incident, unit, distance_km);
            if !score.is_finite() {
                debug!(unit = %unit.id, "non_finite_score_skipped");
                continue;
            }
            match best {
                Some((_, _, best_score)) if score >= best_score => {}
                _ => best = Some((unit, distance_km, score)),
            }
        }

        best.map(|(unit, distance_km, score)| UnitMatch {
            unit_id: unit.id.clone(),
            distance_km,
            score,
        })
    }

    /// Score every unit and return them sorted ascending by score
    ///
    /// Ties keep roster order (stable sort). Non-finite scores are dropped.
    pub fn rank(
        &self,
        incident: &Incident,
        units: &[Unit],
    ) -> SmallVec<[UnitMatch; RANK_INLINE_UNITS]> {
        let mut ranked: SmallVec<[UnitMatch; RANK_INLINE_UNITS]> = units
            .iter()
            .filter_map(|unit| {
                let distance_km = incident.position.distance_km(&unit.position);
                let score = self.policy.score(incident, unit, distance_km);
                score.is_finite().then(|| UnitMatch {
                    unit_id: unit.id.clone(),
                    distance_km,
                    score,
                })
            })
            .collect();
        ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
        ranked
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}
