//! COW state system membership and major powers.

use chrono::NaiveDate;
use irdata_core::{
  dataset::Dataset,
  date::SentinelPolicy,
  keys::OccurrenceCounter,
  row::Row,
  state::{Ccode, CodingSystem, MajorPower, MembershipInterval, State, StateSystem},
};
use tracing::info;

use crate::error::{AtRow, Result};

/// The COW state lists carry complete dates and no sentinels.
pub const SENTINELS: SentinelPolicy = SentinelPolicy::NONE;

const DATASET: Dataset = Dataset::CowStates;
const START: [&str; 3] = ["st_year", "st_month", "st_day"];
const END: [&str; 3] = ["end_year", "end_month", "end_day"];

fn span(row: &Row, ongoing: NaiveDate) -> irdata_core::Result<(NaiveDate, NaiveDate)> {
  Ok((row.date(START, &SENTINELS, ongoing)?, row.date(END, &SENTINELS, ongoing)?))
}

fn code(row: &Row) -> irdata_core::Result<Ccode> { row.id("ccode", &SENTINELS) }

/// Load `states2008.1.csv` and `majors2008.1.csv`.
///
/// One state per code, one membership interval per row. Intervals and major
/// power spells are numbered per code in file order.
pub fn load(states: &[Row], majors: &[Row], ongoing: NaiveDate) -> Result<StateSystem> {
  let mut out = StateSystem::default();

  let mut intervals = OccurrenceCounter::new();
  for row in states {
    let code = code(row).at(DATASET, row)?;
    let interval = intervals.next(code);
    if interval == 1 {
      out.states.push(State {
        system: CodingSystem::Cow,
        code,
        abbrev: row.require("state_abb").at(DATASET, row)?.trim().to_owned(),
        name: row.require("state_nme").at(DATASET, row)?.trim().to_owned(),
        microstate: false,
      });
    }
    let (start, end) = span(row, ongoing).at(DATASET, row)?;
    out
      .memberships
      .push(MembershipInterval::new(CodingSystem::Cow, code, interval, start, end).at(DATASET, row)?);
  }

  let mut spells = OccurrenceCounter::new();
  for row in majors {
    let code = code(row).at(DATASET, row)?;
    let (start, end) = span(row, ongoing).at(DATASET, row)?;
    out.majors.push(MajorPower::new(code, spells.next(code), start, end).at(DATASET, row)?);
  }

  info!(
    states = out.states.len(),
    intervals = out.memberships.len(),
    majors = out.majors.len(),
    "decoded COW state list"
  );
  Ok(out)
}

#[cfg(test)]
mod tests {
  use irdata_core::date::COW_ONGOING;

  use super::*;
  use crate::{error::Error, text::Delimited};

  const STATES: &str = "\
StateAbb,CCode,StateNme,StYear,StMonth,StDay,EndYear,EndMonth,EndDay,Version
USA,2,United States of America,1816,1,1,2008,6,30,2008.1
GMY,255,Germany,1816,1,1,1945,5,8,2008.1
GMY,255,Germany,1990,10,3,2008,6,30,2008.1
GFR,260,German Federal Republic,1955,5,5,1990,10,2,2008.1
";

  const MAJORS: &str = "\
StateAbb,CCode,StYear,StMonth,StDay,EndYear,EndMonth,EndDay,Version
GMY,255,1816,1,1,1918,11,11,2008.1
GMY,255,1925,1,1,1945,5,7,2008.1
GMY,255,1991,1,1,2008,6,30,2008.1
";

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  fn rows(text: &str) -> Vec<Row> { Delimited::csv().rows("test", text.as_bytes()).unwrap() }

  #[test]
  fn intervals_numbered_per_code() {
    let system = load(&rows(STATES), &rows(MAJORS), COW_ONGOING).unwrap();
    assert_eq!(system.states.len(), 3);
    assert_eq!(system.states[1].name, "Germany");
    assert_eq!(system.states[1].abbrev, "GMY");

    let germany: Vec<_> = system.memberships.iter().filter(|m| m.code == 255).collect();
    assert_eq!(germany.len(), 2);
    assert_eq!(germany[1].interval, 2);
    assert_eq!((germany[1].start, germany[1].end), (d(1990, 10, 3), d(2008, 6, 30)));

    assert_eq!(system.majors.iter().map(|m| m.interval).collect::<Vec<_>>(), [1, 2, 3]);
  }

  #[test]
  fn bad_row_reports_its_line() {
    let text = "CCode,StateAbb,StateNme,StYear,StMonth,StDay,EndYear,EndMonth,EndDay\n\
                2,USA,United States,1816,1,1,2008,6,30\n\
                20,CAN,Canada,1920,1,10,1919,1,1\n";
    let err = load(&rows(text), &[], COW_ONGOING).unwrap_err();
    match &err {
      Error::Row { dataset, line, source } => {
        assert_eq!(*dataset, Dataset::CowStates);
        assert_eq!(*line, 3);
        assert!(source.is_invariant_violation());
      }
      other => panic!("unexpected error: {other}"),
    }
  }
}
