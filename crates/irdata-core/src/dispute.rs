//! Militarized Interstate Disputes (MID v3.10).

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  date::DateRange,
  record::{Cell, Record, range_cells},
  state::Ccode,
  war::check_ranges,
};

/// A dispute from the MIDA file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
  pub disp_num: u32,
  pub start:    DateRange,
  pub end:      DateRange,
  pub outcome:  Option<i64>,
  pub settle:   Option<i64>,
  pub fatality: Option<i64>,
  pub hi_act:   Option<i64>,
  pub host_lev: Option<i64>,
  pub num_a:    Option<i64>,
  pub num_b:    Option<i64>,
}

impl Dispute {
  pub fn check(&self) -> Result<()> {
    check_ranges(|| format!("dispute {}", self.disp_num), &self.start, &self.end)
  }
}

/// A MIDA `link` column: another dispute, or a war when suffixed with `W`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DisputeLink {
  Dispute { from: u32, to: u32 },
  War { disp_num: u32, war_num: u32 },
}

/// One spell of a state's participation in a dispute (MIDB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeParticipant {
  pub disp_num:  u32,
  pub ccode:     Ccode,
  /// Counts repeated `(disp_num, ccode)` pairs in file order.
  pub spell_num: u32,
  pub start:     DateRange,
  pub end:       DateRange,
  pub side_a:    Option<bool>,
  pub rev_state: Option<bool>,
  pub fatality:  Option<i64>,
  pub hi_act:    Option<i64>,
  pub host_lev:  Option<i64>,
  pub orig:      Option<bool>,
}

impl DisputeParticipant {
  pub fn check(&self) -> Result<()> {
    check_ranges(
      || format!("dispute {} participant {} spell {}", self.disp_num, self.ccode, self.spell_num),
      &self.start,
      &self.end,
    )
  }
}

#[derive(Debug, Clone, Default)]
pub struct DisputeBatch {
  pub disputes:     Vec<Dispute>,
  pub links:        Vec<DisputeLink>,
  pub participants: Vec<DisputeParticipant>,
}

impl DisputeBatch {
  pub fn mid_links(&self) -> impl Iterator<Item = MidLink> + '_ {
    self.links.iter().filter_map(|l| match *l {
      DisputeLink::Dispute { from, to } => Some(MidLink { from, to }),
      DisputeLink::War { .. } => None,
    })
  }

  pub fn war_links(&self) -> impl Iterator<Item = MidWarLink> + '_ {
    self.links.iter().filter_map(|l| match *l {
      DisputeLink::War { disp_num, war_num } => Some(MidWarLink { disp_num, war_num }),
      DisputeLink::Dispute { .. } => None,
    })
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Row of `mid_link_mid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidLink {
  pub from: u32,
  pub to:   u32,
}

/// Row of `mid_link_war`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidWarLink {
  pub disp_num: u32,
  pub war_num:  u32,
}

impl Record for MidLink {
  const COLUMNS: &'static [&'static str] = &["disp_num_1", "disp_num_2"];
  const TABLE: &'static str = "mid_link_mid";

  fn cells(&self) -> Vec<Cell> { vec![self.from.into(), self.to.into()] }
}

impl Record for MidWarLink {
  const COLUMNS: &'static [&'static str] = &["disp_num", "war_num"];
  const TABLE: &'static str = "mid_link_war";

  fn cells(&self) -> Vec<Cell> { vec![self.disp_num.into(), self.war_num.into()] }
}

impl Record for Dispute {
  const COLUMNS: &'static [&'static str] = &[
    "disp_num",
    "st_date_min",
    "st_date_max",
    "end_date_min",
    "end_date_max",
    "outcome",
    "settle",
    "fatality",
    "hi_act",
    "host_lev",
    "num_a",
    "num_b",
  ];
  const TABLE: &'static str = "mida";

  fn cells(&self) -> Vec<Cell> {
    let [st_min, st_max] = range_cells(&self.start);
    let [end_min, end_max] = range_cells(&self.end);
    vec![
      self.disp_num.into(),
      st_min,
      st_max,
      end_min,
      end_max,
      self.outcome.into(),
      self.settle.into(),
      self.fatality.into(),
      self.hi_act.into(),
      self.host_lev.into(),
      self.num_a.into(),
      self.num_b.into(),
    ]
  }
}

impl Record for DisputeParticipant {
  const COLUMNS: &'static [&'static str] = &[
    "disp_num",
    "ccode",
    "spell_num",
    "st_date_min",
    "st_date_max",
    "end_date_min",
    "end_date_max",
    "side_a",
    "rev_state",
    "fatality",
    "hi_act",
    "host_lev",
    "orig",
  ];
  const TABLE: &'static str = "midb";

  fn cells(&self) -> Vec<Cell> {
    let [st_min, st_max] = range_cells(&self.start);
    let [end_min, end_max] = range_cells(&self.end);
    vec![
      self.disp_num.into(),
      self.ccode.into(),
      self.spell_num.into(),
      st_min,
      st_max,
      end_min,
      end_max,
      self.side_a.into(),
      self.rev_state.into(),
      self.fatality.into(),
      self.hi_act.into(),
      self.host_lev.into(),
      self.orig.into(),
    ]
  }
}
