//! Militarized Interstate Disputes v3.10 (MIDA and MIDB).

use chrono::NaiveDate;
use irdata_core::{
  Error as CoreError,
  dataset::Dataset,
  date::{DateRange, SentinelPolicy},
  dispute::{Dispute, DisputeBatch, DisputeLink, DisputeParticipant},
  keys::OccurrenceCounter,
  row::Row,
  state::Ccode,
};
use tracing::info;

use crate::error::{AtRow, Result};

pub const SENTINELS: SentinelPolicy = SentinelPolicy { missing: &[-9], ongoing: None };

const DATASET: Dataset = Dataset::Mids;

const LINKS: [&str; 3] = ["link1", "link2", "link3"];

/// Start and end of a dispute or participant spell. MIDs have no ongoing
/// code, so the ongoing date is never used.
fn dates(row: &Row) -> irdata_core::Result<(DateRange, DateRange)> {
  Ok((
    row.date_range(["st_year", "st_mon", "st_day"], &SENTINELS, NaiveDate::MAX)?,
    row.date_range(["end_year", "end_mon", "end_day"], &SENTINELS, NaiveDate::MAX)?,
  ))
}

/// Decode a MIDA `link` cell: `0` or empty for none, `NNNW` for a war,
/// otherwise another dispute.
pub fn parse_link(field: &str, disp_num: u32, raw: &str) -> irdata_core::Result<Option<DisputeLink>> {
  let raw = raw.trim();
  if raw.is_empty() || raw == "0" {
    return Ok(None);
  }
  let bad = |e: std::num::ParseIntError| CoreError::malformed(field, raw, e.to_string());
  match raw.strip_suffix(['W', 'w']) {
    Some(war) => Ok(Some(DisputeLink::War { disp_num, war_num: war.trim().parse().map_err(bad)? })),
    None => Ok(Some(DisputeLink::Dispute { from: disp_num, to: raw.parse().map_err(bad)? })),
  }
}

fn dispute_row(batch: &mut DisputeBatch, row: &Row) -> irdata_core::Result<()> {
  let disp_num: u32 = row.id("disp_num", &SENTINELS)?;
  let (start, end) = dates(row)?;
  let dispute = Dispute {
    disp_num,
    start,
    end,
    outcome: row.opt("outcome", &SENTINELS)?,
    settle: row.opt("settle", &SENTINELS)?,
    fatality: row.opt("fatality", &SENTINELS)?,
    hi_act: row.opt("hi_act", &SENTINELS)?,
    host_lev: row.opt("host_lev", &SENTINELS)?,
    num_a: row.opt("num_a", &SENTINELS)?,
    num_b: row.opt("num_b", &SENTINELS)?,
  };
  dispute.check()?;
  batch.disputes.push(dispute);

  for field in LINKS {
    if let Some(raw) = row.get(field)
      && let Some(link) = parse_link(field, disp_num, raw)?
    {
      batch.links.push(link);
    }
  }
  Ok(())
}

fn participant_row(
  batch: &mut DisputeBatch,
  row: &Row,
  spells: &mut OccurrenceCounter<(u32, Ccode)>,
) -> irdata_core::Result<()> {
  let disp_num: u32 = row.id("disp_num", &SENTINELS)?;
  let ccode: Ccode = row.id("ccode", &SENTINELS)?;
  let (start, end) = dates(row)?;
  let participant = DisputeParticipant {
    disp_num,
    ccode,
    spell_num: spells.next((disp_num, ccode)),
    start,
    end,
    side_a: row.flag("side_a", &SENTINELS)?,
    rev_state: row.flag("rev_state", &SENTINELS)?,
    fatality: row.opt("fatality", &SENTINELS)?,
    hi_act: row.opt("hi_act", &SENTINELS)?,
    host_lev: row.opt("host_lev", &SENTINELS)?,
    orig: row.flag("orig", &SENTINELS)?,
  };
  participant.check()?;
  batch.participants.push(participant);
  Ok(())
}

/// Load MIDA (disputes and their links) and MIDB (participants).
pub fn load(mida: &[Row], midb: &[Row]) -> Result<DisputeBatch> {
  let mut batch = DisputeBatch::default();
  for row in mida {
    dispute_row(&mut batch, row).at(DATASET, row)?;
  }
  let mut spells = OccurrenceCounter::new();
  for row in midb {
    participant_row(&mut batch, row, &mut spells).at(DATASET, row)?;
  }
  info!(
    disputes = batch.disputes.len(),
    links = batch.links.len(),
    participants = batch.participants.len(),
    "decoded MIDs"
  );
  Ok(batch)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::text::Delimited;

  const MIDA: &str = "\
DispNum,StDay,StMon,StYear,EndDay,EndMon,EndYear,Outcome,Settle,Fatality,HiAct,HostLev,NumA,NumB,Link1,Link2,Link3,Version
2,-9,7,1902,24,1,1903,4,3,0,7,3,1,1,0,0,0,3.1
3,2,5,1913,25,8,1913,4,3,1,16,4,1,1,12W,0,0,3.1
4,-9,-9,1946,15,12,1952,5,2,0,-9,2,1,1,3,257,0,3.1
";

  const MIDB: &str = "\
DispNum,StAbb,CCode,StDay,StMon,StYear,EndDay,EndMon,EndYear,SideA,RevState,Fatality,HiAct,HostLev,Orig,Version
2,USA,2,-9,7,1902,24,1,1903,1,1,0,7,3,1,3.1
2,UK,200,-9,7,1902,24,1,1903,0,0,0,7,3,1,3.1
2,USA,2,1,3,1903,5,3,1903,1,1,0,7,3,0,3.1
";

  fn rows(text: &str) -> Vec<Row> { Delimited::csv().rows("test", text.as_bytes()).unwrap() }

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  #[test]
  fn links_split_by_suffix() {
    assert_eq!(parse_link("link1", 3, "12W").unwrap(), Some(DisputeLink::War { disp_num: 3, war_num: 12 }));
    assert_eq!(parse_link("link1", 4, "257").unwrap(), Some(DisputeLink::Dispute { from: 4, to: 257 }));
    assert_eq!(parse_link("link1", 4, "0").unwrap(), None);
    assert!(parse_link("link1", 4, "XW").is_err());
  }

  #[test]
  fn disputes_with_partial_dates() {
    let batch = load(&rows(MIDA), &rows(MIDB)).unwrap();
    assert_eq!(batch.disputes.len(), 3);

    let first = &batch.disputes[0];
    assert_eq!((first.start.min, first.start.max), (Some(d(1902, 7, 1)), Some(d(1902, 7, 31))));
    assert_eq!(first.end.as_exact(), Some(d(1903, 1, 24)));
    assert_eq!(first.fatality, Some(0));
    assert_eq!(batch.disputes[2].hi_act, None);

    assert_eq!(batch.war_links().count(), 1);
    let mids: Vec<_> = batch.mid_links().map(|l| (l.from, l.to)).collect();
    assert_eq!(mids, [(4, 3), (4, 257)]);
  }

  #[test]
  fn participant_spells_numbered_per_state() {
    let batch = load(&[], &rows(MIDB)).unwrap();
    let usa: Vec<_> = batch.participants.iter().filter(|p| p.ccode == 2).collect();
    assert_eq!(usa.iter().map(|p| p.spell_num).collect::<Vec<_>>(), [1, 2]);
    assert_eq!(usa[0].side_a, Some(true));
    assert_eq!(usa[1].orig, Some(false));
    let uk = batch.participants.iter().find(|p| p.ccode == 200).unwrap();
    assert_eq!((uk.spell_num, uk.side_a), (1, Some(false)));
  }
}
