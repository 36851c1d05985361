//! COW War Data v4: inter-, intra- and non-state war lists.
//!
//! The three lists are loaded into one [`WarBatch`] in that order, so a
//! belligerent that appears in more than one list is stored once.

use chrono::NaiveDate;
use irdata_core::{
  dataset::Dataset,
  date::{DateRange, SentinelPolicy},
  factor::{self, Factor},
  keys::Side,
  row::Row,
  state::Ccode,
  war::{Belligerent, Participation, ParticipationSpell, War, WarBatch},
};
use tracing::info;

use crate::error::{AtRow, Result};

pub const SENTINELS: SentinelPolicy = SentinelPolicy { missing: &[-9, -8], ongoing: Some(-7) };

const DATASET: Dataset = Dataset::War4;

/// Placeholder for an empty side slot.
const NO_SIDE: &str = "-8";

/// The factor tables this dataset's codes are checked against.
struct Factors {
  war_types:    Factor<i64>,
  outcomes:     Factor<i64>,
  where_fought: Factor<i64>,
}

impl Factors {
  fn new() -> Self {
    Self {
      war_types:    factor::war_types(),
      outcomes:     factor::war4_outcomes(),
      where_fought: factor::war4_where_fought(),
    }
  }
}

/// One dated spell as decoded from a row.
#[derive(Debug, Clone, Copy)]
struct Dated {
  n:       u32,
  start:   DateRange,
  end:     DateRange,
  ongoing: bool,
}

/// One belligerent's appearance on a row.
struct Appearance<'r> {
  side:      Side,
  ccode:     Option<Ccode>,
  name:      &'r str,
  outcome:   Option<i64>,
  bat_death: Option<i64>,
  initiator: bool,
}

/// The spell with suffix `suffix` (`"1"`, `"2"`, or `""` for the non-state
/// list). `None` when its start year is missing.
fn spell(row: &Row, suffix: &str, n: u32, ongoing: NaiveDate) -> irdata_core::Result<Option<Dated>> {
  let start = [format!("start_year{suffix}"), format!("start_month{suffix}"), format!("start_day{suffix}")];
  let end = [format!("end_year{suffix}"), format!("end_month{suffix}"), format!("end_day{suffix}")];
  if row.int(&start[0], &SENTINELS)?.is_missing() {
    return Ok(None);
  }
  let mut is_ongoing = false;
  for field in &end {
    is_ongoing |= row.int(field, &SENTINELS)?.is_ongoing();
  }
  Ok(Some(Dated {
    n,
    start: row.date_range([start[0].as_str(), start[1].as_str(), start[2].as_str()], &SENTINELS, ongoing)?,
    end: row.date_range([end[0].as_str(), end[1].as_str(), end[2].as_str()], &SENTINELS, ongoing)?,
    ongoing: is_ongoing,
  }))
}

/// Every numbered spell present on the row.
fn spells(row: &Row, ongoing: NaiveDate) -> irdata_core::Result<Vec<Dated>> {
  let mut out = Vec::new();
  let mut n = 1;
  while row.has(&format!("start_year{n}")) {
    if let Some(s) = spell(row, &n.to_string(), n, ongoing)? {
      out.push(s);
    }
    n += 1;
  }
  Ok(out)
}

/// Outcomes on the intra- and non-state lists are coded for side A: a side A
/// win (1) is a side B loss (2), and the reverse.
fn outcome_for(side: Side, outcome: Option<i64>) -> Option<i64> {
  match (side, outcome) {
    (Side::B, Some(1)) => Some(2),
    (Side::B, Some(2)) => Some(1),
    (_, o) => o,
  }
}

fn where_fought(row: &Row, factors: &Factors) -> irdata_core::Result<Option<i64>> {
  Ok(factors.where_fought.check("where_fought", row.opt("where_fought", &SENTINELS)?))
}

fn war(row: &Row, factors: &Factors, intnl: Option<bool>, bat_deaths: Option<i64>) -> irdata_core::Result<War> {
  let war_type = row.value("war_type", &SENTINELS)?;
  factors.war_types.check("war_type", Some(war_type));
  Ok(War {
    war_num: row.id("war_num", &SENTINELS)?,
    name: row.text("war_name")?.unwrap_or_default(),
    war_type,
    intnl,
    bat_deaths,
  })
}

fn appear(
  batch: &mut WarBatch,
  war_num: u32,
  where_fought: Option<i64>,
  who: Appearance<'_>,
  dated: &[Dated],
) -> irdata_core::Result<()> {
  let belligerent = batch.add_belligerent(Belligerent::new(who.ccode, who.name));
  let key = batch.next_participation(war_num, &belligerent);
  for d in dated {
    batch.spells.push(ParticipationSpell::new(key.clone(), d.n, d.start, d.end, d.ongoing)?);
  }
  batch.participations.push(Participation {
    key,
    belligerent,
    side: who.side,
    where_fought,
    outcome: who.outcome,
    bat_death: who.bat_death,
    initiator: who.initiator,
  });
  Ok(())
}

// ─── Inter-state ─────────────────────────────────────────────────────────────

fn inter_row(batch: &mut WarBatch, row: &Row, factors: &Factors, ongoing: NaiveDate) -> irdata_core::Result<()> {
  let w = war(row, factors, None, None)?;
  let war_num = w.war_num;
  batch.add_war(w, [None, None]);

  let side_code = row.value("side", &SENTINELS)?;
  let side = Side::from_code(side_code)
    .ok_or_else(|| irdata_core::Error::malformed("side", side_code.to_string(), "expected 1 or 2"))?;
  let name = row.require("state_name")?;
  let who = Appearance {
    side,
    ccode: row.ccode("ccode", &SENTINELS)?,
    name,
    outcome: factors.outcomes.check("outcome", row.opt("outcome", &SENTINELS)?),
    bat_death: row.count("bat_death", &SENTINELS)?,
    initiator: row.opt("initiator", &SENTINELS)? == Some(1),
  };
  let where_fought = where_fought(row, factors)?;
  appear(batch, war_num, where_fought, who, &spells(row, ongoing)?)
}

// ─── Intra-state ─────────────────────────────────────────────────────────────

fn intra_row(batch: &mut WarBatch, row: &Row, factors: &Factors, ongoing: NaiveDate) -> irdata_core::Result<()> {
  let intnl = Some(row.require("intnl")?.trim() == "1");
  let w = war(row, factors, intnl, None)?;
  let war_num = w.war_num;
  batch.add_war(w, [None, None]);

  let outcome = factors.outcomes.check("outcome", row.opt("outcome", &SENTINELS)?);
  let initiator = row.require("initiator")?.trim();
  let where_fought = where_fought(row, factors)?;
  let dated = spells(row, ongoing)?;

  for side in [Side::A, Side::B] {
    let name = row.require(&format!("side_{side}"))?.trim();
    if name == NO_SIDE || name.is_empty() {
      continue;
    }
    let who = Appearance {
      side,
      ccode: row.ccode(&format!("ccode_{side}"), &SENTINELS)?,
      name,
      outcome: outcome_for(side, outcome),
      bat_death: row.count(&format!("side_{side}deaths"), &SENTINELS)?,
      initiator: initiator == name,
    };
    appear(batch, war_num, where_fought, who, &dated)?;
  }
  Ok(())
}

// ─── Non-state ───────────────────────────────────────────────────────────────

/// Numbered belligerent slots per side.
const NONSTATE_SLOTS: [(Side, u32); 2] = [(Side::A, 2), (Side::B, 5)];

fn nonstate_row(batch: &mut WarBatch, row: &Row, factors: &Factors, ongoing: NaiveDate) -> irdata_core::Result<()> {
  let w = war(row, factors, None, row.count("total_combat_deaths", &SENTINELS)?)?;
  let war_num = w.war_num;
  let side_deaths = [row.count("side_adeaths", &SENTINELS)?, row.count("side_bdeaths", &SENTINELS)?];
  batch.add_war(w, side_deaths);

  let outcome = factors.outcomes.check("outcome", row.opt("outcome", &SENTINELS)?);
  let initiator = row.require("initiator")?.trim().to_ascii_lowercase();
  let where_fought = where_fought(row, factors)?;
  let dated: Vec<_> = if row.has("start_year") {
    spell(row, "", 1, ongoing)?.into_iter().collect()
  } else {
    Vec::new()
  };

  for (side, slots) in NONSTATE_SLOTS {
    for i in 1..=slots {
      let field = format!("side_{side}{i}");
      let Some(name) = row.get(&field).map(str::trim) else {
        continue;
      };
      if name == NO_SIDE || name.is_empty() {
        continue;
      }
      let who = Appearance {
        side,
        ccode: None,
        name,
        outcome: outcome_for(side, outcome),
        bat_death: None,
        initiator: initiator == side.as_ref(),
      };
      appear(batch, war_num, where_fought, who, &dated)?;
    }
  }
  Ok(())
}

// ─── Load ────────────────────────────────────────────────────────────────────

/// Load the three v4 war lists. Any of them may be empty.
pub fn load(inter: &[Row], intra: &[Row], nonstate: &[Row], ongoing: NaiveDate) -> Result<WarBatch> {
  let factors = Factors::new();
  let mut batch = WarBatch::new();

  type Loader = fn(&mut WarBatch, &Row, &Factors, NaiveDate) -> irdata_core::Result<()>;
  let lists: [(&str, &[Row], Loader); 3] =
    [("inter-state", inter, inter_row), ("intra-state", intra, intra_row), ("non-state", nonstate, nonstate_row)];

  for (list, rows, load_row) in lists {
    let before = batch.wars.len();
    for row in rows {
      load_row(&mut batch, row, &factors, ongoing).at(DATASET, row)?;
    }
    info!(list, wars = batch.wars.len() - before, rows = rows.len(), "decoded war list");
  }

  info!(
    wars = batch.wars.len(),
    belligerents = batch.belligerents.len(),
    participations = batch.participations.len(),
    spells = batch.spells.len(),
    "decoded COW war data v4"
  );
  Ok(batch)
}

#[cfg(test)]
mod tests {
  use irdata_core::{date::WAR4_ONGOING, keys::SideKey};

  use super::*;
  use crate::text::Delimited;

  const INTER: &str = "\
WarNum,WarName,WarType,ccode,StateName,Side,StartMonth1,StartDay1,StartYear1,EndMonth1,EndDay1,EndYear1,StartMonth2,StartDay2,StartYear2,EndMonth2,EndDay2,EndYear2,WhereFought,Initiator,Outcome,BatDeath,Version
139,World War I,1,200,United Kingdom,1,8,4,1914,11,11,1918,-8,-8,-8,-8,-8,-8,1,2,1,\"908,371\",4
139,World War I,1,255,Germany,2,8,1,1914,11,11,1918,-8,-8,-8,-8,-8,-8,1,1,2,\"1,773,700\",4
139,World War I,1,365,Russia,1,8,1,1914,-9,-9,1917,-8,-8,-8,-8,-8,-8,1,2,8,\"1,700,000\",4
211,Iraq War,1,2,United States of America,1,3,20,2003,-7,-7,-7,-8,-8,-8,-8,-8,-8,7,1,7,-9,4
108,War of Italian Unification,1,325,Italy,1,4,29,1859,7,12,1859,3,1,1860,3,1,1860,1,1,1,2000,4
108,War of Italian Unification,1,325,Italy,1,-9,-9,1861,-9,-9,1861,-8,-8,-8,-8,-8,-8,1,2,1,100,4
";

  const INTRA: &str = "\
WarNum,WarName,WarType,CcodeA,SideA,CcodeB,SideB,Intnl,StartMonth1,StartDay1,StartYear1,EndMonth1,EndDay1,EndYear1,WhereFought,Initiator,Outcome,SideADeaths,SideBDeaths,Version
500,First Caucasus,4,365,Russia,-8,Chechens,0,1,1,1818,12,31,1825,2,Chechens,1,\"2,000\",\"1,500\",4.1
501,Sample,5,-8,Rebels,-8,-8,1,6,1,1830,-7,-7,-7,2,Rebels,2,-9,-9,4.1
";

  const NONSTATE: &str = "\
WarNum,WarName,WarType,SideA1,SideA2,SideB1,SideB2,SideB3,SideB4,SideB5,StartYear,StartMonth,StartDay,EndYear,EndMonth,EndDay,WhereFought,Initiator,Outcome,SideADeaths,SideBDeaths,TotalCombatDeaths,Version
1500,Tribal War,8,Zulu,-8,Ndwandwe,Qwabe,-8,-8,-8,1817,-9,-9,1819,-9,-9,4,B,1,\"1,000\",\"2,000\",\"3,000\",4
";

  fn rows(text: &str) -> Vec<Row> { Delimited::csv().rows("test", text.as_bytes()).unwrap() }

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  fn load_all() -> WarBatch { load(&rows(INTER), &rows(INTRA), &rows(NONSTATE), WAR4_ONGOING).unwrap() }

  #[test]
  fn one_war_per_number_with_two_sides() {
    let batch = load_all();
    let nums: Vec<_> = batch.wars.iter().map(|w| w.war_num).collect();
    assert_eq!(nums, [139, 211, 108, 500, 501, 1500]);
    assert_eq!(batch.sides.len(), 12);
    let nonstate_b = batch.sides.iter().find(|s| s.key == SideKey::new(1500, Side::B)).unwrap();
    assert_eq!(nonstate_b.bat_death, Some(2000));
    assert_eq!(batch.wars[5].bat_deaths, Some(3000));
    assert_eq!(batch.wars[3].intnl, Some(false));
  }

  #[test]
  fn inter_state_participations() {
    let batch = load_all();
    let germany = batch.participations.iter().find(|p| p.belligerent.as_str() == "255 Germany").unwrap();
    assert_eq!(germany.side, Side::B);
    assert!(germany.initiator);
    assert_eq!(germany.bat_death, Some(1_773_700));
    assert_eq!(germany.outcome, Some(2));

    let germany_spells: Vec<_> = batch.spells.iter().filter(|s| s.participation == germany.key).collect();
    assert_eq!(germany_spells.len(), 1);
    assert_eq!(germany_spells[0].start.as_exact(), Some(d(1914, 8, 1)));
  }

  #[test]
  fn partial_and_ongoing_end_dates() {
    let batch = load_all();
    let russia = batch.spells.iter().find(|s| s.participation.actor == "365 Russia").unwrap();
    assert_eq!((russia.end.min, russia.end.max), (Some(d(1917, 1, 1)), Some(d(1917, 12, 31))));
    assert!(!russia.ongoing);

    let usa = batch.spells.iter().find(|s| s.participation.actor == "2 United States of America").unwrap();
    assert!(usa.ongoing);
    assert_eq!(usa.end.as_exact(), Some(WAR4_ONGOING));
  }

  #[test]
  fn repeat_appearance_gets_next_occurrence() {
    let batch = load_all();
    let italy: Vec<_> = batch.participations.iter().filter(|p| p.belligerent.as_str() == "325 Italy").collect();
    assert_eq!(italy.iter().map(|p| p.key.occurrence).collect::<Vec<_>>(), [1, 2]);
    assert_eq!(batch.belligerents.iter().filter(|b| b.key.as_str() == "325 Italy").count(), 1);

    let first: Vec<_> = batch.spells.iter().filter(|s| s.participation == italy[0].key).collect();
    assert_eq!(first.iter().map(|s| s.spell).collect::<Vec<_>>(), [1, 2]);
    let second: Vec<_> = batch.spells.iter().filter(|s| s.participation == italy[1].key).collect();
    assert_eq!(second.len(), 1);
  }

  #[test]
  fn intra_state_sides_and_outcomes() {
    let batch = load_all();
    let war500: Vec<_> = batch.participations.iter().filter(|p| p.war_num() == 500).collect();
    assert_eq!(war500.len(), 2);
    assert_eq!(war500[0].belligerent.as_str(), "365 Russia");
    assert_eq!(war500[0].outcome, Some(1));
    assert!(!war500[0].initiator);
    assert_eq!(war500[1].belligerent.as_str(), "None Chechens");
    assert_eq!(war500[1].outcome, Some(2));
    assert!(war500[1].initiator);
    assert_eq!(war500[1].bat_death, Some(1500));

    // Empty side B slot is skipped.
    let war501: Vec<_> = batch.participations.iter().filter(|p| p.war_num() == 501).collect();
    assert_eq!(war501.len(), 1);
    assert_eq!(war501[0].outcome, Some(2));
  }

  #[test]
  fn non_state_belligerents_keyed_by_name() {
    let batch = load_all();
    let war1500: Vec<_> = batch.participations.iter().filter(|p| p.war_num() == 1500).collect();
    assert_eq!(
      war1500.iter().map(|p| p.belligerent.as_str()).collect::<Vec<_>>(),
      ["None Zulu", "None Ndwandwe", "None Qwabe"]
    );
    assert!(!war1500[0].initiator);
    assert!(war1500[1].initiator && war1500[2].initiator);
    assert_eq!(war1500[1].outcome, Some(2));
    assert!(batch.belligerents.iter().filter(|b| b.name == "Zulu").all(|b| b.ccode.is_none()));
  }

  #[test]
  fn unknown_side_code_is_rejected() {
    let text = INTER.replace("139,World War I,1,200,United Kingdom,1,", "139,World War I,1,200,United Kingdom,3,");
    let err = load(&rows(&text), &[], &[], WAR4_ONGOING).unwrap_err();
    assert!(matches!(err, crate::error::Error::Row { line: 2, .. }));
  }
}
