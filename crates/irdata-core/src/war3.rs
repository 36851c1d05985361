//! COW War Data v3: wars, war spells, participants and participant spells.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  date::DateRange,
  record::{Cell, Record, range_cells},
  state::Ccode,
  war::check_ranges,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct War3 {
  pub war_no:    u32,
  /// Absent from the inter-state file, where it is always 1.
  pub war_type:  i64,
  pub name:      String,
  pub deaths:    Option<i64>,
  pub edition:   Option<i64>,
  /// Intra- and extra-state wars only.
  pub winner:    Option<i64>,
  /// Non-state or insurgent participant, if any.
  pub non_state: Option<String>,
  /// Major state of an intra-state war.
  pub state_num: Option<Ccode>,
}

/// A dated spell of a war or of one participant's involvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct War3Spell {
  pub spell_no: u32,
  pub begin:    DateRange,
  pub end:      DateRange,
}

impl War3Spell {
  pub fn new(spell_no: u32, begin: DateRange, end: DateRange) -> Result<Self> {
    check_ranges(|| format!("war v3 spell {spell_no}"), &begin, &end)?;
    Ok(Self { spell_no, begin, end })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct War3Dates {
  pub war_no: u32,
  pub spell:  War3Spell,
}

/// One participation of a state in a v3 war. `partic_no` counts repeated
/// `(war_no, state_num)` pairs in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct War3Participant {
  pub war_no:    u32,
  pub state_num: Ccode,
  pub partic_no: u32,
  pub deaths:    Option<i64>,
  pub outcome:   Option<i64>,
  pub initiate:  Option<bool>,
  pub sys_stat:  Option<i64>,
  pub int_side:  Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct War3ParticipantDates {
  pub war_no:    u32,
  pub state_num: Ccode,
  pub partic_no: u32,
  pub spell:     War3Spell,
}

#[derive(Debug, Clone, Default)]
pub struct War3Batch {
  pub wars:              Vec<War3>,
  pub war_dates:         Vec<War3Dates>,
  pub participants:      Vec<War3Participant>,
  pub participant_dates: Vec<War3ParticipantDates>,
}

impl War3Batch {
  pub fn is_empty(&self) -> bool { self.wars.is_empty() && self.participants.is_empty() }
}

// ─── Records ─────────────────────────────────────────────────────────────────

fn spell_cells(spell: &War3Spell) -> [Cell; 5] {
  let [beg_min, beg_max] = range_cells(&spell.begin);
  let [end_min, end_max] = range_cells(&spell.end);
  [spell.spell_no.into(), beg_min, beg_max, end_min, end_max]
}

impl Record for War3 {
  const COLUMNS: &'static [&'static str] =
    &["war_no", "war_type", "war_name", "deaths", "edition", "winner", "non_state", "state_num"];
  const TABLE: &'static str = "war3";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.war_no.into(),
      self.war_type.into(),
      self.name.as_str().into(),
      self.deaths.into(),
      self.edition.into(),
      self.winner.into(),
      self.non_state.clone().into(),
      self.state_num.into(),
    ]
  }
}

impl Record for War3Dates {
  const COLUMNS: &'static [&'static str] =
    &["war_no", "spell_no", "date_beg_min", "date_beg_max", "date_end_min", "date_end_max"];
  const TABLE: &'static str = "war3_dates";

  fn cells(&self) -> Vec<Cell> {
    let mut cells = vec![self.war_no.into()];
    cells.extend(spell_cells(&self.spell));
    cells
  }
}

impl Record for War3Participant {
  const COLUMNS: &'static [&'static str] = &[
    "war_no",
    "state_num",
    "partic_no",
    "deaths",
    "outcome",
    "initiate",
    "sys_stat",
    "int_side",
  ];
  const TABLE: &'static str = "war3_partic";

  fn cells(&self) -> Vec<Cell> {
    vec![
      self.war_no.into(),
      self.state_num.into(),
      self.partic_no.into(),
      self.deaths.into(),
      self.outcome.into(),
      self.initiate.into(),
      self.sys_stat.into(),
      self.int_side.into(),
    ]
  }
}

impl Record for War3ParticipantDates {
  const COLUMNS: &'static [&'static str] = &[
    "war_no",
    "state_num",
    "partic_no",
    "spell_no",
    "date_beg_min",
    "date_beg_max",
    "date_end_min",
    "date_end_max",
  ];
  const TABLE: &'static str = "war3_partic_dates";

  fn cells(&self) -> Vec<Cell> {
    let mut cells = vec![self.war_no.into(), self.state_num.into(), self.partic_no.into()];
    cells.extend(spell_cells(&self.spell));
    cells
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn columns_match_cells() {
    let spell = War3Spell::new(
      1,
      DateRange::normalize(Some(1846), Some(5), Some(12)).unwrap(),
      DateRange::normalize(Some(1848), Some(2), None).unwrap(),
    )
    .unwrap();
    let dates = War3ParticipantDates { war_no: 7, state_num: 2, partic_no: 1, spell };
    assert_eq!(dates.cells().len(), War3ParticipantDates::COLUMNS.len());
    let dates = War3Dates { war_no: 7, spell };
    assert_eq!(dates.cells().len(), War3Dates::COLUMNS.len());
  }

  #[test]
  fn reversed_spell_rejected() {
    let err = War3Spell::new(
      1,
      DateRange::normalize(Some(1850), None, None).unwrap(),
      DateRange::normalize(Some(1849), None, None).unwrap(),
    )
    .unwrap_err();
    assert!(err.is_invariant_violation());
  }
}
