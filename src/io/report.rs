//! Decision reporting - one line per incident on the output channel
//!
//! The calling process reads exactly one line per well-formed incident:
//! the winning unit id, or the literal `None` when nothing matched. Each
//! line is flushed immediately so a pipe reader sees decisions promptly.

use crate::domain::types::UnitMatch;
use std::io::{self, Write};
use tracing::debug;

/// Wire rendering of the no-match sentinel
pub const NO_MATCH_LINE: &str = "None";

/// Writes match decisions as single lines
pub struct DecisionWriter<W: Write> {
    out: W,
}

impl<W: Write> DecisionWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write one decision line and flush
    pub fn write_decision(&mut self, decision: Option<&UnitMatch>) -> io::Result<()> {
        match decision {
            Some(m) => writeln!(self.out, "{}", m.unit_id)?,
            None => writeln!(self.out, "{}", NO_MATCH_LINE)?,
        }
        self.out.flush()?;
        debug!("decision_written");
        Ok(())
    }
}
