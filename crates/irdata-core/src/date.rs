//! Partial, uncertain and open-ended dates.
//!
//! Historical records often give only a year, or a year and a month. A
//! [`DateRange`] keeps such a date as the inclusive pair of the earliest and
//! latest calendar dates it could denote. Raw integer fields go through a
//! per-dataset [`SentinelPolicy`] first, which separates "missing" from
//! "ongoing" before any date is built.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Calendar helpers ────────────────────────────────────────────────────────

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
  match NaiveDate::from_ymd_opt(year, month, day) {
    Some(d) => d,
    None => panic!("invalid calendar date"),
  }
}

pub fn is_leap_year(year: i32) -> bool {
  (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 { if is_leap_year(year) { 366 } else { 365 } }

/// Last calendar day of `month` in `year`, or `None` for an invalid month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
  if !(1..=12).contains(&month) {
    return None;
  }
  let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

// ─── Dataset vintages ────────────────────────────────────────────────────────

/// Last day covered by COW State System Membership v2008.1.
pub const COW_ONGOING: NaiveDate = ymd(2008, 6, 30);
/// Last day covered by the Gleditsch & Ward state list v4.
pub const KSG_ONGOING: NaiveDate = ymd(2008, 11, 1);
/// Date substituted for "still in progress" in COW War Data v4.
pub const WAR4_ONGOING: NaiveDate = ymd(2007, 12, 31);
/// Last day covered by COW Direct Contiguity v3.1.
pub const CONTDIR_ONGOING: NaiveDate = ymd(2006, 12, 31);

/// The "ongoing" date of every dataset, i.e. the day its vintage closes.
///
/// An ongoing date is distinct from a missing one: it means the fact still
/// held when the dataset was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vintage {
  pub cow:     NaiveDate,
  pub ksg:     NaiveDate,
  pub war4:    NaiveDate,
  pub contdir: NaiveDate,
}

impl Default for Vintage {
  fn default() -> Self {
    Self {
      cow:     COW_ONGOING,
      ksg:     KSG_ONGOING,
      war4:    WAR4_ONGOING,
      contdir: CONTDIR_ONGOING,
    }
  }
}

impl Vintage {
  /// Last day covered by both state lists.
  pub fn horizon(&self) -> NaiveDate { self.cow.min(self.ksg) }
}

// ─── Sentinels ───────────────────────────────────────────────────────────────

/// A raw integer field after sentinel substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coded<T> {
  Value(T),
  /// Unknown or not applicable.
  Missing,
  /// Still in progress as of the dataset vintage.
  Ongoing,
}

impl<T> Coded<T> {
  /// The value, treating both `Missing` and `Ongoing` as absent.
  pub fn value(self) -> Option<T> {
    match self {
      Self::Value(v) => Some(v),
      Self::Missing | Self::Ongoing => None,
    }
  }

  pub fn is_missing(&self) -> bool { matches!(self, Self::Missing) }

  pub fn is_ongoing(&self) -> bool { matches!(self, Self::Ongoing) }
}

/// How one dataset encodes "missing" and "ongoing" in integer fields.
///
/// Declared once per dataset; loaders never compare against magic numbers
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelPolicy {
  pub missing: &'static [i64],
  pub ongoing: Option<i64>,
}

impl SentinelPolicy {
  /// Every integer is a value; only empty fields are missing.
  pub const NONE: Self = Self { missing: &[], ongoing: None };

  pub fn classify(&self, value: i64) -> Coded<i64> {
    if self.ongoing == Some(value) {
      Coded::Ongoing
    } else if self.missing.contains(&value) {
      Coded::Missing
    } else {
      Coded::Value(value)
    }
  }

  /// Parse a raw field. Empty text is missing; non-integer text is malformed.
  pub fn parse(&self, field: &str, raw: &str) -> Result<Coded<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
      return Ok(Coded::Missing);
    }
    let value: i64 = raw
      .parse()
      .map_err(|e: std::num::ParseIntError| Error::malformed(field, raw, e.to_string()))?;
    Ok(self.classify(value))
  }
}

// ─── DateRange ───────────────────────────────────────────────────────────────

/// An inclusive `[min, max]` bound on an imprecisely known date.
///
/// Either both bounds are present and `min <= max`, or both are `None`
/// (nothing is known).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
  pub min: Option<NaiveDate>,
  pub max: Option<NaiveDate>,
}

impl DateRange {
  pub const UNKNOWN: Self = Self { min: None, max: None };

  pub fn exact(date: NaiveDate) -> Self { Self { min: Some(date), max: Some(date) } }

  /// Build the range denoted by a partial date.
  ///
  /// - no year: unknown
  /// - year only: Jan 1 to Dec 31
  /// - year and month: first to last day of the month
  /// - year, month and day: that day
  ///
  /// Components after the first absent one are ignored. An out-of-range month
  /// or day is malformed.
  pub fn normalize(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Result<Self> {
    let Some(year) = year else {
      return Ok(Self::UNKNOWN);
    };
    let Some(month) = month else {
      return Ok(Self { min: Some(ymd_checked(year, 1, 1)?), max: Some(ymd_checked(year, 12, 31)?) });
    };
    let first = ymd_checked(year, month, 1)?;
    let Some(day) = day else {
      let last = last_day_of_month(year, month)
        .ok_or_else(|| Error::malformed("date", format!("{year}-{month}"), "month out of range"))?;
      return Ok(Self { min: Some(first), max: Some(last) });
    };
    Ok(Self::exact(ymd_checked(year, month, day)?))
  }

  /// Build a range from sentinel-decoded components. Any `Ongoing` component
  /// makes the whole date the dataset's `ongoing` date.
  pub fn from_coded(
    year: Coded<i64>,
    month: Coded<i64>,
    day: Coded<i64>,
    ongoing: NaiveDate,
  ) -> Result<Self> {
    if year.is_ongoing() || month.is_ongoing() || day.is_ongoing() {
      return Ok(Self::exact(ongoing));
    }
    let year = year.value().map(|y| narrow::<i32>("year", y)).transpose()?;
    let month = month.value().map(|m| narrow::<u32>("month", m)).transpose()?;
    let day = day.value().map(|d| narrow::<u32>("day", d)).transpose()?;
    Self::normalize(year, month, day)
  }

  pub fn is_unknown(&self) -> bool { self.min.is_none() }

  pub fn is_exact(&self) -> bool { self.min.is_some() && self.min == self.max }

  /// The exact date, if the range has collapsed to one day.
  pub fn as_exact(&self) -> Option<NaiveDate> { if self.is_exact() { self.min } else { None } }

  /// Compare two uncertain dates conservatively.
  ///
  /// Returns an ordering only when it holds for every pair of dates the two
  /// ranges could denote. Overlapping ranges and unknown dates yield `None`.
  pub fn compare(&self, other: &Self) -> Option<Ordering> {
    let (a_min, a_max) = (self.min?, self.max?);
    let (b_min, b_max) = (other.min?, other.max?);
    if a_max < b_min {
      Some(Ordering::Less)
    } else if a_min > b_max {
      Some(Ordering::Greater)
    } else if self.is_exact() && other.is_exact() {
      Some(Ordering::Equal)
    } else {
      None
    }
  }

  /// True when every date in `self` lies before every date in `other`.
  pub fn definitely_before(&self, other: &Self) -> bool {
    self.compare(other) == Some(Ordering::Less)
  }
}

fn ymd_checked(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
    Error::malformed("date", format!("{year}-{month}-{day}"), "not a calendar date")
  })
}

fn narrow<T: TryFrom<i64>>(field: &str, value: i64) -> Result<T> {
  T::try_from(value).map_err(|_| Error::malformed(field, value.to_string(), "out of range"))
}

/// Jan 1 and Dec 31 of `year`.
pub(crate) fn year_bounds(year: i32) -> (NaiveDate, NaiveDate) {
  // Years outside chrono's range never reach the projector; clamp anyway.
  let first = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
  let last = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);
  (first, last)
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  #[test]
  fn year_only_spans_whole_year() {
    let r = DateRange::normalize(Some(1990), None, None).unwrap();
    assert_eq!(r.min, Some(d(1990, 1, 1)));
    assert_eq!(r.max, Some(d(1990, 12, 31)));
  }

  #[test]
  fn year_month_spans_month_non_leap() {
    let r = DateRange::normalize(Some(1990), Some(2), None).unwrap();
    assert_eq!(r.min, Some(d(1990, 2, 1)));
    assert_eq!(r.max, Some(d(1990, 2, 28)));
  }

  #[test]
  fn year_month_spans_month_leap() {
    let r = DateRange::normalize(Some(2000), Some(2), None).unwrap();
    assert_eq!(r.max, Some(d(2000, 2, 29)));
    let r = DateRange::normalize(Some(1900), Some(2), None).unwrap();
    assert_eq!(r.max, Some(d(1900, 2, 28)));
  }

  #[test]
  fn december_ends_on_31st() {
    let r = DateRange::normalize(Some(1816), Some(12), None).unwrap();
    assert_eq!(r.max, Some(d(1816, 12, 31)));
  }

  #[test]
  fn missing_year_is_unknown() {
    let r = DateRange::normalize(None, Some(3), Some(4)).unwrap();
    assert!(r.is_unknown());
    assert_eq!(r.max, None);
  }

  #[test]
  fn day_without_month_is_ignored() {
    let r = DateRange::normalize(Some(1990), None, Some(12)).unwrap();
    assert_eq!(r, DateRange::normalize(Some(1990), None, None).unwrap());
  }

  #[test]
  fn invalid_components_are_malformed() {
    assert!(matches!(DateRange::normalize(Some(1990), Some(13), None), Err(Error::Malformed { .. })));
    assert!(matches!(DateRange::normalize(Some(1990), Some(2), Some(30)), Err(Error::Malformed { .. })));
    assert!(matches!(DateRange::normalize(Some(1990), Some(0), Some(1)), Err(Error::Malformed { .. })));
  }

  #[test]
  fn ongoing_component_uses_vintage_date() {
    let r = DateRange::from_coded(Coded::Ongoing, Coded::Ongoing, Coded::Ongoing, WAR4_ONGOING)
      .unwrap();
    assert_eq!(r.as_exact(), Some(WAR4_ONGOING));

    let r = DateRange::from_coded(Coded::Value(1991), Coded::Missing, Coded::Missing, WAR4_ONGOING)
      .unwrap();
    assert_eq!(r.min, Some(d(1991, 1, 1)));
  }

  #[test]
  fn sentinel_policy_separates_missing_and_ongoing() {
    const WAR: SentinelPolicy = SentinelPolicy { missing: &[-9, -8], ongoing: Some(-7) };
    assert_eq!(WAR.parse("end_year1", "-7").unwrap(), Coded::Ongoing);
    assert_eq!(WAR.parse("end_year1", "-8").unwrap(), Coded::Missing);
    assert_eq!(WAR.parse("end_year1", " -9 ").unwrap(), Coded::Missing);
    assert_eq!(WAR.parse("end_year1", "").unwrap(), Coded::Missing);
    assert_eq!(WAR.parse("end_year1", "1866").unwrap(), Coded::Value(1866));
    assert!(matches!(WAR.parse("end_year1", "18x6"), Err(Error::Malformed { .. })));

    // Without an ongoing sentinel, -7 is an ordinary value.
    assert_eq!(SentinelPolicy::NONE.parse("x", "-7").unwrap(), Coded::Value(-7));
  }

  #[test]
  fn conservative_comparison() {
    let y1990 = DateRange::normalize(Some(1990), None, None).unwrap();
    let feb1990 = DateRange::normalize(Some(1990), Some(2), None).unwrap();
    let y1991 = DateRange::normalize(Some(1991), None, None).unwrap();
    let exact = DateRange::exact(d(1990, 2, 10));

    assert_eq!(y1990.compare(&y1991), Some(Ordering::Less));
    assert_eq!(y1991.compare(&feb1990), Some(Ordering::Greater));
    assert_eq!(y1990.compare(&feb1990), None);
    assert_eq!(feb1990.compare(&exact), None);
    assert_eq!(exact.compare(&exact), Some(Ordering::Equal));
    assert_eq!(DateRange::UNKNOWN.compare(&exact), None);
    assert!(!exact.definitely_before(&feb1990));
  }

  #[test]
  fn horizon_is_the_earlier_state_list() {
    let v = Vintage::default();
    assert_eq!(v.horizon(), COW_ONGOING);
    let later_cow = Vintage { cow: ymd(2011, 12, 31), ..v };
    assert_eq!(later_cow.horizon(), KSG_ONGOING);
  }

  #[test]
  fn last_day_of_month_rejects_bad_month() {
    assert_eq!(last_day_of_month(1990, 13), None);
    assert_eq!(last_day_of_month(1990, 0), None);
    assert_eq!(last_day_of_month(1996, 2), Some(d(1996, 2, 29)));
  }

  proptest! {
    #[test]
    fn normalized_min_never_exceeds_max(
      year in 1700i32..2100,
      month in proptest::option::of(1u32..=12),
      day in proptest::option::of(1u32..=28),
    ) {
      let r = DateRange::normalize(Some(year), month, day).unwrap();
      prop_assert!(r.min.unwrap() <= r.max.unwrap());
    }

    #[test]
    fn exact_dates_round_trip(year in 1700i32..2100, month in 1u32..=12, day in 1u32..=31) {
      if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
        let r = DateRange::normalize(Some(year), Some(month), Some(day)).unwrap();
        prop_assert_eq!(r.min, Some(date));
        prop_assert_eq!(r.max, Some(date));
      }
    }
  }
}
