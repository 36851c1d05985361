//! COW Direct Contiguity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  date::{DateRange, last_day_of_month},
  record::{Cell, Record},
  state::{Ccode, Spell, check_span},
};

/// A directed contiguity relationship between the lower- and higher-coded
/// state of a dyad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contiguity {
  pub state_l:  Ccode,
  pub state_h:  Ccode,
  pub start:    NaiveDate,
  pub end:      NaiveDate,
  pub conttype: i64,
  pub notes:    Option<String>,
  /// The spell still held when the dataset was published.
  pub ongoing:  bool,
}

impl Contiguity {
  pub fn new(
    state_l: Ccode,
    state_h: Ccode,
    start: NaiveDate,
    end: NaiveDate,
    conttype: i64,
    notes: Option<String>,
  ) -> Result<Self> {
    check_span(|| format!("contiguity {state_l}-{state_h}"), start, end)?;
    Ok(Self { state_l, state_h, start, end, conttype, notes, ongoing: false })
  }

  /// Flag the spell as ongoing when it runs to the dataset's `vintage`.
  pub fn at_vintage(mut self, vintage: NaiveDate) -> Self {
    self.ongoing = self.end >= vintage;
    self
  }
}

impl Spell for Contiguity {
  fn start(&self) -> NaiveDate { self.start }

  fn end(&self) -> NaiveDate { self.end }
}

/// Parse a `YYYYMM` month stamp into its first and last day.
pub fn month_stamp(field: &str, raw: &str) -> Result<(NaiveDate, NaiveDate)> {
  let raw = raw.trim();
  let bad = |reason: &str| Error::malformed(field, raw, reason);
  if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
    return Err(bad("expected YYYYMM"));
  }
  let year: i32 = raw[..4].parse().map_err(|_| bad("bad year"))?;
  let month: u32 = raw[4..].parse().map_err(|_| bad("bad month"))?;
  let range = DateRange::normalize(Some(year), Some(month), None)?;
  match (range.min, last_day_of_month(year, month)) {
    (Some(first), Some(last)) => Ok((first, last)),
    _ => Err(bad("month out of range")),
  }
}

impl Record for Contiguity {
  const COLUMNS: &'static [&'static str] =
    &["statelno", "statehno", "start_date", "end_date", "conttype", "notes", "ongoing"];
  const TABLE: &'static str = "contdir";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.state_l.into(),
      self.state_h.into(),
      self.start.into(),
      self.end.into(),
      self.conttype.into(),
      self.notes.clone().into(),
      self.ongoing.into(),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  #[test]
  fn month_stamps() {
    assert_eq!(month_stamp("begin", "181601").unwrap(), (d(1816, 1, 1), d(1816, 1, 31)));
    assert_eq!(month_stamp("end", "200412").unwrap().1, d(2004, 12, 31));
    assert_eq!(month_stamp("end", "199602").unwrap().1, d(1996, 2, 29));
    assert!(month_stamp("end", "199613").is_err());
    assert!(month_stamp("end", "1996").is_err());
  }

  #[test]
  fn spells_reaching_the_vintage_are_ongoing() {
    let vintage = d(2006, 12, 31);
    let open = Contiguity::new(2, 20, d(1920, 1, 1), vintage, 1, None).unwrap().at_vintage(vintage);
    assert!(open.ongoing);
    let closed = Contiguity::new(2, 200, d(1816, 1, 1), d(1899, 12, 31), 4, None).unwrap().at_vintage(vintage);
    assert!(!closed.ongoing);
  }

  #[test]
  fn reversed_contiguity_rejected() {
    assert!(Contiguity::new(2, 20, d(1900, 1, 1), d(1899, 1, 1), 1, None).is_err());
  }
}
