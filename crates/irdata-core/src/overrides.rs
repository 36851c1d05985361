//! Hand-curated corrections applied after the automatic merge.
//!
//! The merge joins on equal codes, which goes wrong where one system kept a
//! code through a historical succession while the other switched codes, and
//! where the two systems number a few Pacific island states differently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Error, Result,
  date::Vintage,
  link::{CrossSystemLink, LinkFilter},
};

/// One correction: retire every automatic link matching `retire`, then
/// insert `links` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
  pub name:   String,
  pub retire: LinkFilter,
  pub links:  Vec<CrossSystemLink>,
}

/// Counts from applying a set of overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideReport {
  pub applied:  usize,
  pub retired:  usize,
  pub inserted: usize,
}

fn on(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt(y, m, d)
    .ok_or_else(|| Error::malformed("override date", format!("{y}-{m}-{d}"), "not a calendar date"))
}

/// The built-in override table. Every override link runs to the COW
/// vintage's ongoing date.
pub fn builtin(vintage: &Vintage) -> Result<Vec<Override>> {
  let ongoing = vintage.cow;
  let unification = on(1990, 10, 3)?;
  let yemen = on(1990, 5, 22)?;
  let islands = on(1999, 9, 14)?;
  let tuvalu = on(2000, 9, 5)?;

  let island = |name: &str, cow: i32, ksg: i32, start: NaiveDate| -> Result<Override> {
    Ok(Override {
      name:   name.to_owned(),
      retire: LinkFilter::ksg([ksg]).or_cow([cow]),
      links:  vec![CrossSystemLink::new(Some(cow), Some(ksg), start, ongoing)?],
    })
  };

  Ok(vec![
    // COW moves unified Germany from 260 back to 255; KSG continues the
    // Federal Republic as 260.
    Override {
      name:   "germany".to_owned(),
      retire: LinkFilter::ksg([260]).or_cow([255]).during(unification, ongoing),
      links:  vec![CrossSystemLink::new(Some(255), Some(260), unification, ongoing)?],
    },
    // COW codes unified Yemen 679; KSG continues North Yemen as 678.
    Override {
      name:   "yemen".to_owned(),
      retire: LinkFilter::ksg([678]).or_cow([679]).during(yemen, ongoing),
      links:  vec![CrossSystemLink::new(Some(679), Some(678), yemen, ongoing)?],
    },
    island("nauru", 970, 971, islands)?,
    island("tonga", 955, 972, islands)?,
    island("tuvalu", 947, 973, tuvalu)?,
    island("kiribati", 946, 970, islands)?,
  ])
}

/// Apply `overrides` to an in-memory link set.
///
/// All retirements run before any insertion, so one override's links are
/// never retired by a later override's filter. Inserted links that are
/// already present are not duplicated.
pub fn apply(links: &mut Vec<CrossSystemLink>, overrides: &[Override]) -> OverrideReport {
  let before = links.len();
  links.retain(|l| !overrides.iter().any(|o| o.retire.matches(l)));
  let retired = before - links.len();

  let mut inserted = 0;
  for o in overrides {
    for link in &o.links {
      if !links.contains(link) {
        links.push(*link);
        inserted += 1;
      }
    }
    debug!(name = %o.name, links = o.links.len(), "applied override");
  }
  OverrideReport { applied: overrides.len(), retired, inserted }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::merge::{MergeOptions, merge};
  use crate::state::{CodingSystem, MembershipInterval};

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  fn cow(code: i32, n: u32, s: NaiveDate, e: NaiveDate) -> MembershipInterval {
    MembershipInterval::new(CodingSystem::Cow, code, n, s, e).unwrap()
  }

  fn ksg(code: i32, n: u32, s: NaiveDate, e: NaiveDate) -> MembershipInterval {
    MembershipInterval::new(CodingSystem::Ksg, code, n, s, e).unwrap()
  }

  fn germany_memberships() -> (Vec<MembershipInterval>, Vec<MembershipInterval>) {
    let v = Vintage::default();
    (
      vec![
        cow(255, 1, d(1816, 1, 1), d(1945, 5, 8)),
        cow(255, 2, d(1990, 10, 3), v.cow),
        cow(260, 1, d(1955, 5, 5), d(1990, 10, 2)),
      ],
      vec![ksg(255, 1, d(1816, 1, 1), d(1945, 5, 8)), ksg(260, 1, d(1949, 9, 21), v.ksg)],
    )
  }

  #[test]
  fn builtin_table_has_six_corrections() {
    let table = builtin(&Vintage::default()).unwrap();
    let names: Vec<_> = table.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["germany", "yemen", "nauru", "tonga", "tuvalu", "kiribati"]);
    for o in &table {
      for l in &o.links {
        assert_eq!(l.end, Vintage::default().cow);
      }
    }
  }

  #[test]
  fn germany_override_takes_precedence() {
    let table = builtin(&Vintage::default()).unwrap();
    let (c, k) = germany_memberships();
    for remainders in [false, true] {
      let mut links = merge(&c, &k, MergeOptions::for_vintage(remainders, &Vintage::default())).unwrap().links;
      apply(&mut links, &table);

      let window = LinkFilter::ksg([260]).or_cow([255]).during(d(1990, 10, 3), Vintage::default().cow);
      let hits: Vec<_> = links.iter().filter(|l| window.matches(l)).copied().collect();
      assert_eq!(hits, table[0].links, "remainders = {remainders}");

      // The automatic West German link survives.
      assert!(links.iter().any(|l| l.cow == Some(260) && l.ksg == Some(260) && l.end == d(1990, 10, 2)));
      // So does pre-war Germany.
      assert!(links.iter().any(|l| l.cow == Some(255) && l.ksg == Some(255)));
    }
  }

  #[test]
  fn yemen_override_with_no_automatic_overlap() {
    let v = Vintage::default();
    let c = vec![cow(678, 1, d(1926, 9, 2), d(1990, 5, 21)), cow(679, 1, d(1990, 5, 22), v.cow)];
    let k = vec![ksg(678, 1, d(1918, 10, 30), v.ksg)];
    let mut links = merge(&c, &k, MergeOptions::default()).unwrap().links;
    assert!(!links.iter().any(|l| l.cow == Some(679)));

    apply(&mut links, &builtin(&v).unwrap());
    let yemen: Vec<_> = links.iter().filter(|l| l.cow == Some(679)).collect();
    assert_eq!(yemen.len(), 1);
    assert_eq!((yemen[0].ksg, yemen[0].start), (Some(678), d(1990, 5, 22)));
    assert!(links.iter().any(|l| l.cow == Some(678) && l.end == d(1990, 5, 21)));
  }

  #[test]
  fn island_codes_are_replaced_wholesale() {
    let v = Vintage::default();
    // COW 970 is Nauru but KSG 970 is Kiribati.
    let c = vec![cow(970, 1, d(1999, 9, 14), v.cow)];
    let k = vec![ksg(970, 1, d(1979, 7, 12), v.ksg), ksg(971, 1, d(1968, 1, 31), v.ksg)];
    let mut links = merge(&c, &k, MergeOptions::for_vintage(true, &v)).unwrap().links;
    assert!(links.iter().any(|l| l.cow == Some(970) && l.ksg == Some(970)));

    let report = apply(&mut links, &builtin(&v).unwrap());
    assert!(!links.iter().any(|l| l.cow == Some(970) && l.ksg == Some(970)));
    assert!(links.contains(&CrossSystemLink::new(Some(970), Some(971), d(1999, 9, 14), v.cow).unwrap()));
    assert!(links.contains(&CrossSystemLink::new(Some(946), Some(970), d(1999, 9, 14), v.cow).unwrap()));
    assert_eq!(report.applied, 6);
    assert_eq!(report.inserted, 6);
    assert!(report.retired >= 1);
  }

  #[test]
  fn apply_is_idempotent() {
    let table = builtin(&Vintage::default()).unwrap();
    let mut links = Vec::new();
    apply(&mut links, &table);
    let once = links.clone();
    let report = apply(&mut links, &table);
    assert_eq!(links.len(), once.len());
    for l in &once {
      assert!(links.contains(l));
    }
    assert_eq!(report.retired, report.inserted);
  }
}
