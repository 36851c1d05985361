//! COW War Data v3: war lists and inter-state war participants.

use chrono::NaiveDate;
use irdata_core::{
  dataset::Dataset,
  date::SentinelPolicy,
  factor,
  keys::OccurrenceCounter,
  row::Row,
  state::Ccode,
  war3::{War3, War3Batch, War3Dates, War3Participant, War3ParticipantDates, War3Spell},
};
use tracing::info;

use crate::error::{AtRow, Result};

pub const SENTINELS: SentinelPolicy = SentinelPolicy { missing: &[-999, -888], ongoing: None };

const DATASET: Dataset = Dataset::War3;

/// The inter-state list has no `war_type` column; every war on it is type 1.
const INTER_STATE: i64 = 1;

/// An integer column that not every v3 file carries.
fn optional(row: &Row, field: &str) -> irdata_core::Result<Option<i64>> {
  if row.has(field) { row.opt(field, &SENTINELS) } else { Ok(None) }
}

/// Spell 1, and spell 2 when its begin year is present.
fn spells(row: &Row) -> irdata_core::Result<Vec<War3Spell>> {
  let mut out = Vec::with_capacity(2);
  for n in 1..=2u32 {
    let begin = [format!("yr_beg{n}"), format!("mon_beg{n}"), format!("day_beg{n}")];
    let end = [format!("yr_end{n}"), format!("mon_end{n}"), format!("day_end{n}")];
    if n > 1 && optional(row, &begin[0])?.is_none() {
      break;
    }
    // v3 has no ongoing code, so the ongoing date is never used.
    let begin = row.date_range([begin[0].as_str(), begin[1].as_str(), begin[2].as_str()], &SENTINELS, NaiveDate::MAX)?;
    let end = row.date_range([end[0].as_str(), end[1].as_str(), end[2].as_str()], &SENTINELS, NaiveDate::MAX)?;
    out.push(War3Spell::new(n, begin, end)?);
  }
  Ok(out)
}

fn war_row(batch: &mut War3Batch, row: &Row) -> irdata_core::Result<()> {
  let war_no: u32 = row.id("war_no", &SENTINELS)?;
  let war_type = optional(row, "war_type")?.unwrap_or(INTER_STATE);
  for spell in spells(row)? {
    batch.war_dates.push(War3Dates { war_no, spell });
  }
  batch.wars.push(War3 {
    war_no,
    war_type,
    name: row.text("war_name")?.unwrap_or_default(),
    deaths: if row.has("deaths") { row.count("deaths", &SENTINELS)? } else { None },
    edition: optional(row, "edition")?,
    winner: optional(row, "winner")?,
    non_state: if row.has("non_state") { row.text("non_state")? } else { None },
    state_num: if row.has("state_num") { row.ccode("state_num", &SENTINELS)? } else { None },
  });
  Ok(())
}

fn participant_row(
  batch: &mut War3Batch,
  row: &Row,
  partic: &mut OccurrenceCounter<(u32, Ccode)>,
) -> irdata_core::Result<()> {
  let war_no: u32 = row.id("war_no", &SENTINELS)?;
  let state_num: Ccode = row.id("state_num", &SENTINELS)?;
  let partic_no = partic.next((war_no, state_num));
  for spell in spells(row)? {
    batch.participant_dates.push(War3ParticipantDates { war_no, state_num, partic_no, spell });
  }
  batch.participants.push(War3Participant {
    war_no,
    state_num,
    partic_no,
    deaths: row.count("deaths", &SENTINELS)?,
    outcome: optional(row, "outcome")?,
    initiate: optional(row, "initiate")?.map(|v| v == 1),
    sys_stat: optional(row, "sys_stat")?,
    int_side: optional(row, "int_side")?,
  });
  Ok(())
}

/// Load any number of v3 war lists followed by the participant list.
pub fn load(wars: &[Vec<Row>], participants: &[Row]) -> Result<War3Batch> {
  let war_types = factor::war_types();
  let mut batch = War3Batch::default();

  for row in wars.iter().flatten() {
    war_row(&mut batch, row).at(DATASET, row)?;
  }
  for w in &batch.wars {
    war_types.check("war_type", Some(w.war_type));
  }

  let mut partic = OccurrenceCounter::new();
  for row in participants {
    participant_row(&mut batch, row, &mut partic).at(DATASET, row)?;
  }

  info!(
    wars = batch.wars.len(),
    war_spells = batch.war_dates.len(),
    participants = batch.participants.len(),
    "decoded COW war data v3"
  );
  Ok(batch)
}
