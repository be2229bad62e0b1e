//! Roster acquisition - the port between the matcher and the unit store
//!
//! The matcher only ever sees a snapshot taken through [`RosterProvider`],
//! so the live store can be swapped without touching selection logic. The
//! shipping implementation serves a fixed roster loaded from configuration;
//! production would back this port with the shared resource cache.

use crate::domain::geo::{GeoError, GeoPoint};
use crate::domain::types::{Unit, UnitId};
use crate::infra::config::Config;
use async_trait::async_trait;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::info;

/// Roster could not be loaded or snapshotted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RosterError {
    #[error("roster unit at index {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate unit id {0:?} in roster")]
    DuplicateId(String),
    #[error("unit {id:?}: {source}")]
    Coordinate { id: String, source: GeoError },
    #[error("roster store unavailable: {0}")]
    Unavailable(String),
}

/// Source of roster snapshots
///
/// A snapshot is a consistent view of the unit pool for one match call;
/// the store must not hand out a partially updated roster.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<Unit>, RosterError>;
}

/// Fixed roster validated once at load time
#[derive(Debug)]
pub struct StaticRoster {
    units: Vec<Unit>,
}

impl StaticRoster {
    /// Build the roster from configuration
    ///
    /// Validates every entry up front: ids must be non-empty and unique,
    /// coordinates must be in range. An invalid roster is a startup error.
    pub fn from_config(config: &Config) -> Result<Self, RosterError> {
        let mut units = Vec::with_capacity(config.units().len());
        let mut seen: FxHashSet<&str> = FxHashSet::default();

        for (index, entry) in config.units().iter().enumerate() {
            if entry.id.is_empty() {
                return Err(RosterError::EmptyId(index));
            }
            if !seen.insert(&entry.id) {
                return Err(RosterError::DuplicateId(entry.id.clone()));
            }
            let position = GeoPoint::new(entry.latitude, entry.longitude)
                .map_err(|source| RosterError::Coordinate { id: entry.id.clone(), source })?;
            units.push(Unit { id: UnitId::from(entry.id.clone()), position });
        }

        info!(units = %units.len(), "roster_loaded");
        Ok(Self { units })
    }

    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    /// Direct view for one-shot tools that do not need the async port
    pub fn units(&self) -> &[Unit] {
        &self.units
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn snapshot(&self) -> Result<Vec<Unit>, RosterError> {
        Ok(self.units.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::UnitConfig;

    fn entry(id: &str, latitude: f64, longitude: f64) -> UnitConfig {
        UnitConfig { id: id.to_string(), latitude, longitude }
    }

    #[tokio::test]
    async fn test_default_config_roster() {
        let roster = StaticRoster::from_config(&Config::default()).unwrap();
        let units = roster.snapshot().await.unwrap();

        let ids: Vec<&str> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["Unit_Alpha", "Unit_Bravo", "Unit_Charlie", "Unit_Delta"]);
    }

    #[tokio::test]
    async fn test_snapshots_are_independent() {
        let roster = StaticRoster::from_config(&Config::default()).unwrap();

        let mut first = roster.snapshot().await.unwrap();
        first.clear();
        let second = roster.snapshot().await.unwrap();
        assert_eq!(second.len(), 4);
    }

    #[test]
    fn test_empty_roster_is_valid() {
        let config = Config::default().with_units(vec![]);
        let roster = StaticRoster::from_config(&config).unwrap();
        assert!(roster.units().is_empty());
    }

    #[test]
    fn test_empty_id_rejected() {
        let config = Config::default()
            .with_units(vec![entry("Unit_Alpha", 40.715, -74.008), entry("", 40.725, -74.000)]);
        assert_eq!(StaticRoster::from_config(&config).unwrap_err(), RosterError::EmptyId(1));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let config = Config::default().with_units(vec![
            entry("Unit_Alpha", 40.715, -74.008),
            entry("Unit_Alpha", 40.725, -74.000),
        ]);
        assert_eq!(
            StaticRoster::from_config(&config).unwrap_err(),
            RosterError::DuplicateId("Unit_Alpha".to_string())
        );
    }

    #[test]
    fn test_out_of_range_coordinate_rejected() {
        let config = Config::default().with_units(vec![entry("Unit_Alpha", 95.0, -74.008)]);
        assert_eq!(
            StaticRoster::from_config(&config).unwrap_err(),
            RosterError::Coordinate {
                id: "Unit_Alpha".to_string(),
                source: GeoError::LatitudeOutOfRange(95.0),
            }
        );
    }
}
