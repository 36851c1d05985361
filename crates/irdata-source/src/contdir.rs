//! COW Direct Contiguity v3.1.

use chrono::NaiveDate;
use irdata_core::{
  contiguity::{Contiguity, month_stamp},
  dataset::Dataset,
  date::SentinelPolicy,
  factor,
  row::Row,
  state::Ccode,
};
use tracing::info;

use crate::error::{AtRow, Result};

pub const SENTINELS: SentinelPolicy = SentinelPolicy::NONE;

const DATASET: Dataset = Dataset::Contdir;

/// Load `contdir.csv`. `begin` and `end` are `YYYYMM` month stamps: a spell
/// runs from the first day of its begin month to the last day of its end
/// month. Spells ending on or after `ongoing` are flagged ongoing.
pub fn load(rows: &[Row], ongoing: NaiveDate) -> Result<Vec<Contiguity>> {
  let types = factor::contiguity_types();
  let mut out = Vec::with_capacity(rows.len());
  for row in rows {
    let decode = || -> irdata_core::Result<Contiguity> {
      let state_l: Ccode = row.id("statelno", &SENTINELS)?;
      let state_h: Ccode = row.id("statehno", &SENTINELS)?;
      let conttype = row.value("conttype", &SENTINELS)?;
      types.check("conttype", Some(conttype));
      let (start, _) = month_stamp("begin", row.require("begin")?)?;
      let (_, end) = month_stamp("end", row.require("end")?)?;
      let notes = if row.has("notes") { row.text("notes")? } else { None };
      Ok(Contiguity::new(state_l, state_h, start, end, conttype, notes)?.at_vintage(ongoing))
    };
    out.push(decode().at(DATASET, row)?);
  }
  info!(spells = out.len(), "decoded direct contiguity");
  Ok(out)
}
