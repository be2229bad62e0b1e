//! Incident ingest - parses the line-oriented incident wire format
//!
//! One incident per line, three whitespace-separated fields:
//! `latitude longitude severity`. The upstream caller maps its criticality
//! labels onto the 1..=10 severity scale before writing the line.

use crate::domain::geo::{GeoError, GeoPoint};
use crate::domain::types::{Incident, Severity, SeverityError};
use thiserror::Error;

/// A line that could not be turned into an [`Incident`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("expected 3 fields (lat lon severity), got {0}")]
    FieldCount(usize),
    #[error("unparsable {field} field {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error(transparent)]
    Coordinate(#[from] GeoError),
    #[error(transparent)]
    Severity(#[from] SeverityError),
}

/// Parse one incident line
///
/// Leading/trailing whitespace is tolerated; field count, numeric syntax,
/// coordinate ranges and the severity scale are not.
pub fn parse_line(line: &str) -> Result<Incident, IngestError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(IngestError::FieldCount(fields.len()));
    }

    let latitude: f64 = fields[0]
        .parse()
        .map_err(|_| IngestError::InvalidNumber { field: "latitude", value: fields[0].into() })?;
    let longitude: f64 = fields[1]
        .parse()
        .map_err(|_| IngestError::InvalidNumber { field: "longitude", value: fields[1].into() })?;
    let severity: i64 = fields[2]
        .parse()
        .map_err(|_| IngestError::InvalidNumber { field: "severity", value: fields[2].into() })?;

    let position = GeoPoint::new(latitude, longitude)?;
    let severity = Severity::try_from(severity)?;

    Ok(Incident { position, severity })
}
