//! Gleditsch & Ward independent states and microstates.

use chrono::NaiveDate;
use irdata_core::{
  Error as CoreError,
  dataset::Dataset,
  date::SentinelPolicy,
  keys::OccurrenceCounter,
  row::Row,
  state::{Ccode, CodingSystem, MembershipInterval, State, StateSystem},
};
use tracing::info;

use crate::{
  error::{AtRow, Result},
  text::{Delimited, TextEncoding},
};

pub const SENTINELS: SentinelPolicy = SentinelPolicy::NONE;

const DATASET: Dataset = Dataset::KsgStates;

/// Field names of the headerless `iisystem.dat` layout.
pub const FIELDS: [&str; 5] = ["idnum", "idabb", "country_name", "start_date", "end_date"];

/// The dialect both KSG files use.
pub fn dialect() -> Delimited { Delimited::tsv(&FIELDS).encoding(TextEncoding::Latin1) }

/// Parse a `dd:mm:yyyy` date.
pub fn parse_date(field: &str, raw: &str) -> irdata_core::Result<NaiveDate> {
  let raw = raw.trim();
  let bad = || CoreError::malformed(field, raw, "expected dd:mm:yyyy");
  let mut parts = raw.split(':').map(str::trim);
  let (Some(d), Some(m), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
    return Err(bad());
  };
  match (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>()) {
    (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).ok_or_else(bad),
    _ => Err(bad()),
  }
}

/// Load the main state list and the microstate list in one pass.
///
/// Interval numbers continue per code across both files.
pub fn load(states: &[Row], microstates: &[Row]) -> Result<StateSystem> {
  let mut out = StateSystem::default();
  let mut intervals = OccurrenceCounter::new();

  for (rows, microstate) in [(states, false), (microstates, true)] {
    for row in rows {
      let code: Ccode = row.id("idnum", &SENTINELS).at(DATASET, row)?;
      let interval = intervals.next(code);
      if interval == 1 {
        out.states.push(State {
          system: CodingSystem::Ksg,
          code,
          abbrev: row.require("idabb").at(DATASET, row)?.trim().to_owned(),
          name: row.require("country_name").at(DATASET, row)?.trim().to_owned(),
          microstate,
        });
      }
      let start = parse_date("start_date", row.require("start_date").at(DATASET, row)?).at(DATASET, row)?;
      let end = parse_date("end_date", row.require("end_date").at(DATASET, row)?).at(DATASET, row)?;
      out
        .memberships
        .push(MembershipInterval::new(CodingSystem::Ksg, code, interval, start, end).at(DATASET, row)?);
    }
  }

  info!(
    states = out.states.len(),
    microstates = out.states.iter().filter(|s| s.microstate).count(),
    intervals = out.memberships.len(),
    "decoded KSG state list"
  );
  Ok(out)
}
