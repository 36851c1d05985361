//! Expansion of date spans into calendar-year observations.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  date::{days_in_year, year_bounds},
  link::{CrossSystemLink, YearLink},
  record::{Cell, Record},
  state::{Ccode, CodingSystem, MembershipInterval, check_span},
};

/// How a span covers one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearCoverage {
  pub year:       i32,
  pub start_year: bool,
  pub end_year:   bool,
  pub mid_year:   bool,
  pub frac_year:  f64,
}

/// One coverage record per calendar year from `start.year()` to `end.year()`
/// inclusive.
///
/// The mid-year test always uses June 30, leap year or not. The fraction
/// counts covered days inclusively and divides by 365 or 366.
pub fn years(start: NaiveDate, end: NaiveDate) -> Result<Vec<YearCoverage>> {
  check_span(|| format!("span {start}..{end}"), start, end)?;
  Ok((start.year()..=end.year()).map(|year| coverage(year, start, end)).collect())
}

fn coverage(year: i32, start: NaiveDate, end: NaiveDate) -> YearCoverage {
  let (jan1, dec31) = year_bounds(year);
  let mid = NaiveDate::from_ymd_opt(year, 6, 30).unwrap_or(jan1);
  let covered = (end.min(dec31) - start.max(jan1)).num_days() + 1;
  YearCoverage {
    year,
    start_year: start <= jan1,
    end_year: end >= dec31,
    mid_year: start <= mid && mid <= end,
    frac_year: covered as f64 / f64::from(days_in_year(year)),
  }
}

/// Project one link onto the calendar years it touches.
pub fn project_link(link: &CrossSystemLink) -> Result<Vec<YearLink>> {
  link.validate()?;
  Ok(
    years(link.start, link.end)?
      .into_iter()
      .map(|c| YearLink {
        cow:        link.cow,
        ksg:        link.ksg,
        year:       c.year,
        start_year: c.start_year,
        end_year:   c.end_year,
        mid_year:   c.mid_year,
        frac_year:  c.frac_year,
      })
      .collect(),
  )
}

pub fn project_links(links: &[CrossSystemLink]) -> Result<Vec<YearLink>> {
  let mut out = Vec::new();
  for link in links {
    out.extend(project_link(link)?);
  }
  Ok(out)
}

// ─── System years ────────────────────────────────────────────────────────────

/// A state counted as a system member in a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemYear {
  pub system: CodingSystem,
  pub code:   Ccode,
  pub year:   i32,
}

impl Record for SystemYear {
  const COLUMNS: &'static [&'static str] = &["system", "code", "year"];
  const TABLE: &'static str = "system_years";

  fn cells(&self) -> Vec<Cell> { vec![self.system.to_string().into(), self.code.into(), self.year.into()] }
}

/// Every `(system, code, year)` any membership interval touches, sorted and
/// without duplicates.
pub fn system_years(memberships: &[MembershipInterval]) -> Vec<SystemYear> {
  let mut out: Vec<SystemYear> = memberships
    .iter()
    .flat_map(|m| {
      (m.start.year()..=m.end.year()).map(move |year| SystemYear { system: m.system, code: m.code, year })
    })
    .collect();
  out.sort_unstable();
  out.dedup();
  out
}
