//! COW/KSG linkage records.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  record::{Cell, Record},
  state::{Ccode, CodingSystem, Spell, check_span},
};

// ─── CrossSystemLink ─────────────────────────────────────────────────────────

/// A sub-interval during which a COW code and a KSG code denote the same
/// state.
///
/// One side may be `None` when the other system has no counterpart for the
/// span; never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CrossSystemLink {
  pub cow:   Option<Ccode>,
  pub ksg:   Option<Ccode>,
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl CrossSystemLink {
  pub fn new(cow: Option<Ccode>, ksg: Option<Ccode>, start: NaiveDate, end: NaiveDate) -> Result<Self> {
    let link = Self { cow, ksg, start, end };
    link.validate()?;
    Ok(link)
  }

  /// A link with only `system`'s code populated.
  pub fn one_sided(system: CodingSystem, code: Ccode, start: NaiveDate, end: NaiveDate) -> Result<Self> {
    match system {
      CodingSystem::Cow => Self::new(Some(code), None, start, end),
      CodingSystem::Ksg => Self::new(None, Some(code), start, end),
    }
  }

  /// Check the link invariants. Records read back from a store pass through
  /// here before they reach the projector.
  pub fn validate(&self) -> Result<()> {
    if self.cow.is_none() && self.ksg.is_none() {
      return Err(Error::EmptyLink { start: self.start, end: self.end });
    }
    check_span(|| format!("link {self}"), self.start, self.end)
  }

  pub fn code(&self, system: CodingSystem) -> Option<Ccode> {
    match system {
      CodingSystem::Cow => self.cow,
      CodingSystem::Ksg => self.ksg,
    }
  }

  pub fn is_one_sided(&self) -> bool { self.cow.is_none() || self.ksg.is_none() }
}

impl Spell for CrossSystemLink {
  fn start(&self) -> NaiveDate { self.start }

  fn end(&self) -> NaiveDate { self.end }
}

impl std::fmt::Display for CrossSystemLink {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let code = |c: Option<Ccode>| c.map_or_else(|| "-".to_owned(), |c| c.to_string());
    write!(f, "cow {} / ksg {} {}..{}", code(self.cow), code(self.ksg), self.start, self.end)
  }
}

// ─── YearLink ────────────────────────────────────────────────────────────────

/// One calendar year of a [`CrossSystemLink`]. Always derived, never loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearLink {
  pub cow:        Option<Ccode>,
  pub ksg:        Option<Ccode>,
  pub year:       i32,
  /// The link covers Jan 1.
  pub start_year: bool,
  /// The link covers Dec 31.
  pub end_year:   bool,
  /// The link covers Jun 30.
  pub mid_year:   bool,
  /// Share of the year's days covered, in `(0, 1]`.
  pub frac_year:  f64,
}

impl Record for CrossSystemLink {
  const COLUMNS: &'static [&'static str] = &["cow_ccode", "ksg_ccode", "start_date", "end_date"];
  const TABLE: &'static str = "ksg_to_cow";

  fn cells(&self) -> Vec<Cell> {
    vec![self.cow.into(), self.ksg.into(), self.start.into(), self.end.into()]
  }
}

impl Record for YearLink {
  const COLUMNS: &'static [&'static str] =
    &["cow_ccode", "ksg_ccode", "year", "start_year", "end_year", "mid_year", "frac_year"];
  const TABLE: &'static str = "ksg_to_cow_year";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.cow.into(),
      self.ksg.into(),
      self.year.into(),
      self.start_year.into(),
      self.end_year.into(),
      self.mid_year.into(),
      self.frac_year.into(),
    ]
  }
}

// ─── LinkFilter ──────────────────────────────────────────────────────────────

/// Selects links by code and, optionally, by overlap with a date span.
///
/// A link matches when its COW code is in `cow` or its KSG code is in `ksg`
/// (any code if both lists are empty) and, if `during` is set, it overlaps
/// that span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFilter {
  #[serde(default)]
  pub cow:    Vec<Ccode>,
  #[serde(default)]
  pub ksg:    Vec<Ccode>,
  #[serde(default)]
  pub during: Option<(NaiveDate, NaiveDate)>,
}

impl LinkFilter {
  /// Matches every link.
  pub fn all() -> Self { Self::default() }

  pub fn cow(codes: impl IntoIterator<Item = Ccode>) -> Self {
    Self { cow: codes.into_iter().collect(), ..Self::default() }
  }

  pub fn ksg(codes: impl IntoIterator<Item = Ccode>) -> Self {
    Self { ksg: codes.into_iter().collect(), ..Self::default() }
  }

  pub fn or_cow(mut self, codes: impl IntoIterator<Item = Ccode>) -> Self {
    self.cow.extend(codes);
    self
  }

  pub fn during(mut self, start: NaiveDate, end: NaiveDate) -> Self {
    self.during = Some((start, end));
    self
  }

  /// Code half of the filter.
  pub fn matches_codes(&self, cow: Option<Ccode>, ksg: Option<Ccode>) -> bool {
    (self.cow.is_empty() && self.ksg.is_empty())
      || cow.is_some_and(|c| self.cow.contains(&c))
      || ksg.is_some_and(|c| self.ksg.contains(&c))
  }

  pub fn matches(&self, link: &CrossSystemLink) -> bool {
    self.matches_codes(link.cow, link.ksg)
      && self.during.is_none_or(|(start, end)| link.start <= end && link.end >= start)
  }

  /// Year-link form: the span is widened to whole calendar years.
  pub fn matches_year(&self, year: &YearLink) -> bool {
    self.matches_codes(year.cow, year.ksg)
      && self.during.is_none_or(|(start, end)| start.year() <= year.year && year.year <= end.year())
  }
}
