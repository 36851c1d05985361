//! States and their membership spells in the international system.
//!
//! COW and KSG each keep their own list of states and entry/exit dates. The
//! two lists share one numeric code space but disagree on dates and, for a
//! handful of states, on the codes themselves.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Error, Result,
  record::{Cell, Record},
};

/// Numeric country code.
pub type Ccode = i32;

/// The country-coding system a record belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CodingSystem {
  /// Correlates of War.
  Cow,
  /// Gleditsch & Ward.
  Ksg,
}

impl CodingSystem {
  pub fn other(self) -> Self {
    match self {
      Self::Cow => Self::Ksg,
      Self::Ksg => Self::Cow,
    }
  }
}

/// Anything that holds over an inclusive date span.
pub trait Spell {
  fn start(&self) -> NaiveDate;
  fn end(&self) -> NaiveDate;

  /// Inclusive overlap: touching boundaries count.
  fn overlaps<S: Spell + ?Sized>(&self, other: &S) -> bool {
    self.start() <= other.end() && self.end() >= other.start()
  }
}

pub(crate) fn check_span(what: impl FnOnce() -> String, start: NaiveDate, end: NaiveDate) -> Result<()> {
  if end < start {
    return Err(Error::InvalidInterval { what: what(), start, end });
  }
  Ok(())
}

// ─── State ───────────────────────────────────────────────────────────────────

/// A state as coded by one system. One per code per system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
  pub system:     CodingSystem,
  pub code:       Ccode,
  pub abbrev:     String,
  pub name:       String,
  /// KSG keeps microstates in a separate list; always `false` for COW.
  pub microstate: bool,
}

// ─── MembershipInterval ──────────────────────────────────────────────────────

/// One contiguous spell of system membership under one coding system.
///
/// `interval` is 1-based and follows source-file order per code. A state that
/// leaves and re-enters the system gets a new interval; intervals are never
/// merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipInterval {
  pub system:   CodingSystem,
  pub code:     Ccode,
  pub interval: u32,
  pub start:    NaiveDate,
  pub end:      NaiveDate,
}

impl MembershipInterval {
  pub fn new(
    system: CodingSystem,
    code: Ccode,
    interval: u32,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Self> {
    check_span(|| format!("{system} membership {code}/{interval}"), start, end)?;
    Ok(Self { system, code, interval, start, end })
  }
}

impl Spell for MembershipInterval {
  fn start(&self) -> NaiveDate { self.start }

  fn end(&self) -> NaiveDate { self.end }
}

// ─── MajorPower ──────────────────────────────────────────────────────────────

/// A spell of COW major-power status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorPower {
  pub code:     Ccode,
  /// nth time this state was a major power.
  pub interval: u32,
  pub start:    NaiveDate,
  pub end:      NaiveDate,
}

impl MajorPower {
  pub fn new(code: Ccode, interval: u32, start: NaiveDate, end: NaiveDate) -> Result<Self> {
    check_span(|| format!("major power {code}/{interval}"), start, end)?;
    Ok(Self { code, interval, start, end })
  }
}

impl Spell for MajorPower {
  fn start(&self) -> NaiveDate { self.start }

  fn end(&self) -> NaiveDate { self.end }
}

/// Everything one coding system's state list produces.
#[derive(Debug, Clone, Default)]
pub struct StateSystem {
  pub states:      Vec<State>,
  pub memberships: Vec<MembershipInterval>,
  /// Only populated for COW.
  pub majors:      Vec<MajorPower>,
}

// ─── Records ─────────────────────────────────────────────────────────────────

impl Record for State {
  const COLUMNS: &'static [&'static str] = &["system", "code", "abbrev", "name", "microstate"];
  const TABLE: &'static str = "states";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.system.to_string().into(),
      self.code.into(),
      self.abbrev.as_str().into(),
      self.name.as_str().into(),
      self.microstate.into(),
    ]
  }
}

impl Record for MembershipInterval {
  const COLUMNS: &'static [&'static str] = &["system", "code", "interval", "start_date", "end_date"];
  const TABLE: &'static str = "memberships";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.system.to_string().into(),
      self.code.into(),
      self.interval.into(),
      self.start.into(),
      self.end.into(),
    ]
  }
}

impl Record for MajorPower {
  const COLUMNS: &'static [&'static str] = &["ccode", "interval", "start_date", "end_date"];
  const TABLE: &'static str = "cow_majors";

  fn cells(&self) -> Vec<Cell> {
    vec![self.code.into(), self.interval.into(), self.start.into(), self.end.into()]
  }
}
