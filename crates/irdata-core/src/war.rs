//! COW War Data v4: inter-, intra- and non-state wars.
//!
//! All three war lists share one set of tables. A war has two sides, a set of
//! belligerents, and one participation per belligerent appearance, each with
//! up to two dated spells.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  date::DateRange,
  keys::{BelligerentKey, ParticipationKey, ParticipationKeys, Side, SideKey},
  record::{Cell, Record, range_cells},
  state::Ccode,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct War {
  pub war_num:    u32,
  pub name:       String,
  pub war_type:   i64,
  /// Internationalised intra-state war. Unknown for inter-state wars.
  pub intnl:      Option<bool>,
  /// Only recorded for non-state wars.
  pub bat_deaths: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarSide {
  pub key:       SideKey,
  /// Non-state wars record deaths per side rather than per participant.
  pub bat_death: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Belligerent {
  pub key:   BelligerentKey,
  pub name:  String,
  pub ccode: Option<Ccode>,
}

impl Belligerent {
  pub fn new(ccode: Option<Ccode>, name: &str) -> Self {
    Self { key: BelligerentKey::new(ccode, name), name: name.trim().to_owned(), ccode }
  }
}

/// One appearance of a belligerent on one side of a war.
///
/// Members of the same side can have different outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
  pub key:          ParticipationKey,
  pub belligerent:  BelligerentKey,
  pub side:         Side,
  pub where_fought: Option<i64>,
  /// Winner/loser code from this participant's point of view.
  pub outcome:      Option<i64>,
  pub bat_death:    Option<i64>,
  pub initiator:    bool,
}

impl Participation {
  pub fn war_num(&self) -> u32 { self.key.conflict }
}

/// A dated spell of one participation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationSpell {
  pub participation: ParticipationKey,
  pub spell:         u32,
  pub start:         DateRange,
  pub end:           DateRange,
  /// The end was recorded as still in progress.
  pub ongoing:       bool,
}

impl ParticipationSpell {
  /// Rejects spells whose end definitely precedes the start. Uncertain bounds
  /// that overlap are accepted.
  pub fn new(
    participation: ParticipationKey,
    spell: u32,
    start: DateRange,
    end: DateRange,
    ongoing: bool,
  ) -> Result<Self> {
    check_ranges(|| format!("participation {participation} spell {spell}"), &start, &end)?;
    Ok(Self { participation, spell, start, end, ongoing })
  }
}

/// Reject an uncertain span only when its end is certainly before its start.
pub(crate) fn check_ranges(what: impl FnOnce() -> String, start: &DateRange, end: &DateRange) -> Result<()> {
  if end.definitely_before(start) {
    if let (Some(s), Some(e)) = (start.min, end.max) {
      return Err(Error::InvalidInterval { what: what(), start: s, end: e });
    }
  }
  Ok(())
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// Everything one load pass over the v4 war lists produces.
#[derive(Debug, Default)]
pub struct WarBatch {
  pub wars:           Vec<War>,
  pub sides:          Vec<WarSide>,
  pub belligerents:   Vec<Belligerent>,
  pub participations: Vec<Participation>,
  pub spells:         Vec<ParticipationSpell>,
  keys:               ParticipationKeys,
  seen_wars:          HashSet<u32>,
  seen_belligerents:  HashSet<BelligerentKey>,
}

impl WarBatch {
  pub fn new() -> Self { Self::default() }

  /// Add a war on first sight together with its two sides. Returns `false`
  /// if the war was already present.
  pub fn add_war(&mut self, war: War, side_deaths: [Option<i64>; 2]) -> bool {
    if !self.seen_wars.insert(war.war_num) {
      return false;
    }
    for (key, bat_death) in SideKey::both(war.war_num).into_iter().zip(side_deaths) {
      self.sides.push(WarSide { key, bat_death });
    }
    self.wars.push(war);
    true
  }

  pub fn has_war(&self, war_num: u32) -> bool { self.seen_wars.contains(&war_num) }

  /// Add a belligerent on first sight and return its key.
  pub fn add_belligerent(&mut self, belligerent: Belligerent) -> BelligerentKey {
    let key = belligerent.key.clone();
    if self.seen_belligerents.insert(key.clone()) {
      self.belligerents.push(belligerent);
    }
    key
  }

  /// The next participation key for `belligerent` in `war_num`.
  pub fn next_participation(&mut self, war_num: u32, belligerent: &BelligerentKey) -> ParticipationKey {
    self.keys.next(war_num, belligerent.as_str())
  }

  pub fn is_empty(&self) -> bool { self.wars.is_empty() }
}

// ─── Records ─────────────────────────────────────────────────────────────────

impl Record for War {
  const COLUMNS: &'static [&'static str] = &["war_num", "war_name", "war_type", "intnl", "bat_deaths"];
  const TABLE: &'static str = "war4";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.war_num.into(),
      self.name.as_str().into(),
      self.war_type.into(),
      self.intnl.into(),
      self.bat_deaths.into(),
    ]
  }
}

impl Record for WarSide {
  const COLUMNS: &'static [&'static str] = &["war_num", "side", "bat_death"];
  const TABLE: &'static str = "war4_sides";

  fn cells(&self) -> Vec<Cell> {
    vec![self.key.war_num.into(), self.key.side.to_string().into(), self.bat_death.into()]
  }
}

impl Record for Belligerent {
  const COLUMNS: &'static [&'static str] = &["belligerent", "belligerent_name", "ccode"];
  const TABLE: &'static str = "war4_belligerents";

  fn cells(&self) -> Vec<Cell> {
    vec![self.key.as_str().into(), self.name.as_str().into(), self.ccode.into()]
  }
}

impl Record for Participation {
  const COLUMNS: &'static [&'static str] = &[
    "war_num",
    "belligerent",
    "occurrence",
    "side",
    "where_fought",
    "outcome",
    "bat_death",
    "initiator",
  ];
  const TABLE: &'static str = "war4_partic";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.key.conflict.into(),
      self.belligerent.as_str().into(),
      self.key.occurrence.into(),
      self.side.to_string().into(),
      self.where_fought.into(),
      self.outcome.into(),
      self.bat_death.into(),
      self.initiator.into(),
    ]
  }
}

impl Record for ParticipationSpell {
  const COLUMNS: &'static [&'static str] = &[
    "war_num",
    "belligerent",
    "occurrence",
    "partic_num",
    "start_date_min",
    "start_date_max",
    "end_date_min",
    "end_date_max",
    "ongoing",
  ];
  const TABLE: &'static str = "war4_partic_dates";

  fn cells(&self) -> Vec<Cell> {
    let [start_min, start_max] = range_cells(&self.start);
    let [end_min, end_max] = range_cells(&self.end);
    vec![
      self.participation.conflict.into(),
      self.participation.actor.as_str().into(),
      self.participation.occurrence.into(),
      self.spell.into(),
      start_min,
      start_max,
      end_min,
      end_max,
      self.ongoing.into(),
    ]
  }
}
