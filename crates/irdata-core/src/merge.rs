//! Pairwise interval merge between the two coding systems.
//!
//! Intervals are joined on the shared numeric code. The join assumes that an
//! identical code denotes the same state in both systems; the handful of
//! codes where that is false are patched afterwards by
//! [`overrides`](crate::overrides).

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Result,
  date::Vintage,
  link::CrossSystemLink,
  state::{Ccode, CodingSystem, MembershipInterval, Spell},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
  /// Also emit one-sided links for the parts of each interval that no
  /// counterpart interval covers.
  #[serde(default)]
  pub remainders: bool,
  /// Last day both systems cover. Remainder links end no later than this;
  /// a gap that only opens after it is the two lists' vintages differing.
  #[serde(default)]
  pub horizon:    Option<NaiveDate>,
}

impl MergeOptions {
  /// Options for two state lists of `vintage`, clipped to the earlier of
  /// their ongoing dates.
  pub fn for_vintage(remainders: bool, vintage: &Vintage) -> Self {
    Self { remainders, horizon: Some(vintage.horizon()) }
  }
}

/// A code with no overlapping interval in the other system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Unmatched {
  pub system: CodingSystem,
  pub code:   Ccode,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
  /// Distinct links in emission order.
  pub links:     Vec<CrossSystemLink>,
  /// Sorted by system, then code.
  pub unmatched: Vec<Unmatched>,
}

impl MergeOutcome {
  /// Drop unmatched codes that some two-sided link in `links` now covers,
  /// e.g. after overrides have linked them by hand. One-sided remainder links
  /// never count as a match.
  pub fn settle(&mut self, links: &[CrossSystemLink]) {
    let linked: HashSet<(CodingSystem, Ccode)> = links
      .iter()
      .filter(|l| !l.is_one_sided())
      .flat_map(|l| {
        [
          l.cow.map(|c| (CodingSystem::Cow, c)),
          l.ksg.map(|c| (CodingSystem::Ksg, c)),
        ]
      })
      .flatten()
      .collect();
    self.unmatched.retain(|u| !linked.contains(&(u.system, u.code)));
  }
}

/// One overlap between a left and a right interval of the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Overlap {
  pub left:  Ccode,
  pub right: Ccode,
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

/// Every overlapping `(left, right)` pair with equal codes, in left-then-right
/// source order.
///
/// Touching boundaries count as overlap. Several right intervals overlapping
/// one left interval each produce their own entry; nothing is coalesced.
pub fn overlaps<L, R>(left: &[L], right: &[R]) -> Vec<Overlap>
where
  L: Keyed,
  R: Keyed,
{
  let by_code = index_by_code(right);
  let mut out = Vec::new();
  for l in left {
    let Some(candidates) = by_code.get(&l.code()) else {
      continue;
    };
    for r in candidates.iter().filter(|r| l.overlaps(**r)) {
      out.push(Overlap {
        left:  l.code(),
        right: r.code(),
        start: l.start().max(r.start()),
        end:   l.end().min(r.end()),
      });
    }
  }
  out
}

/// A dated spell that belongs to one code.
pub trait Keyed: Spell {
  fn code(&self) -> Ccode;
}

impl Keyed for MembershipInterval {
  fn code(&self) -> Ccode { self.code }
}

fn index_by_code<R: Keyed>(items: &[R]) -> HashMap<Ccode, Vec<&R>> {
  let mut map: HashMap<Ccode, Vec<&R>> = HashMap::new();
  for item in items {
    map.entry(item.code()).or_default().push(item);
  }
  map
}

/// Merge COW and KSG membership intervals into cross-system links.
///
/// Intersections come first, in COW source order. With
/// [`MergeOptions::remainders`] the uncovered parts follow: COW remainders,
/// then KSG remainders, each cut at [`MergeOptions::horizon`]. Duplicate
/// links are dropped.
pub fn merge(
  cow: &[MembershipInterval],
  ksg: &[MembershipInterval],
  options: MergeOptions,
) -> Result<MergeOutcome> {
  let mut links = Links::default();
  for o in overlaps(cow, ksg) {
    links.push(CrossSystemLink::new(Some(o.left), Some(o.right), o.start, o.end)?);
  }

  if options.remainders {
    for (system, own, other) in [(CodingSystem::Cow, cow, ksg), (CodingSystem::Ksg, ksg, cow)] {
      let by_code = index_by_code(other);
      for interval in own {
        let covering = by_code.get(&interval.code).map(Vec::as_slice).unwrap_or_default();
        for (start, end) in uncovered(interval, covering) {
          let end = options.horizon.map_or(end, |h| end.min(h));
          if start <= end {
            links.push(CrossSystemLink::one_sided(system, interval.code, start, end)?);
          }
        }
      }
    }
  }

  let unmatched = unmatched_codes(cow, ksg);
  debug!(links = links.list.len(), unmatched = unmatched.len(), "merged memberships");
  Ok(MergeOutcome { links: links.list, unmatched })
}

#[derive(Default)]
struct Links {
  seen: HashSet<CrossSystemLink>,
  list: Vec<CrossSystemLink>,
}

impl Links {
  fn push(&mut self, link: CrossSystemLink) {
    if self.seen.insert(link) {
      self.list.push(link);
    }
  }
}

/// The sub-spans of `interval` not covered by the union of `covering`.
fn uncovered<S: Spell>(interval: &S, covering: &[&S]) -> Vec<(NaiveDate, NaiveDate)> {
  let mut spans: Vec<(NaiveDate, NaiveDate)> = covering
    .iter()
    .filter(|c| interval.overlaps(**c))
    .map(|c| (c.start().max(interval.start()), c.end().min(interval.end())))
    .collect();
  spans.sort();

  let mut gaps = Vec::new();
  let mut cursor = Some(interval.start());
  for (start, end) in spans {
    let Some(from) = cursor else { break };
    if start > from {
      if let Some(until) = start.pred_opt() {
        gaps.push((from, until));
      }
    }
    if end >= from {
      cursor = end.succ_opt();
    }
  }
  if let Some(from) = cursor {
    if from <= interval.end() {
      gaps.push((from, interval.end()));
    }
  }
  gaps
}

fn unmatched_codes(cow: &[MembershipInterval], ksg: &[MembershipInterval]) -> Vec<Unmatched> {
  let mut out = BTreeSet::new();
  for (system, own, other) in [(CodingSystem::Cow, cow, ksg), (CodingSystem::Ksg, ksg, cow)] {
    let by_code = index_by_code(other);
    let mut matched = HashSet::new();
    for interval in own {
      let hit = by_code
        .get(&interval.code)
        .is_some_and(|cands| cands.iter().any(|c| interval.overlaps(*c)));
      if hit {
        matched.insert(interval.code);
      }
    }
    for interval in own {
      if !matched.contains(&interval.code) {
        out.insert(Unmatched { system, code: interval.code });
      }
    }
  }
  out.into_iter().collect()
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  fn iv(system: CodingSystem, code: Ccode, n: u32, start: NaiveDate, end: NaiveDate) -> MembershipInterval {
    MembershipInterval::new(system, code, n, start, end).unwrap()
  }

  fn cow(code: Ccode, n: u32, start: NaiveDate, end: NaiveDate) -> MembershipInterval {
    iv(CodingSystem::Cow, code, n, start, end)
  }

  fn ksg(code: Ccode, n: u32, start: NaiveDate, end: NaiveDate) -> MembershipInterval {
    iv(CodingSystem::Ksg, code, n, start, end)
  }

  #[test]
  fn intersection_takes_later_start_and_earlier_end() {
    let out = merge(
      &[cow(2, 1, d(1816, 1, 1), d(2008, 6, 30))],
      &[ksg(2, 1, d(1816, 1, 1), d(2008, 11, 1))],
      MergeOptions::default(),
    )
    .unwrap();
    assert_eq!(out.links, vec![
      CrossSystemLink::new(Some(2), Some(2), d(1816, 1, 1), d(2008, 6, 30)).unwrap()
    ]);
    assert!(out.unmatched.is_empty());
  }

  #[test]
  fn different_codes_never_merge() {
    let out = merge(
      &[cow(260, 1, d(1871, 1, 18), d(1945, 5, 8))],
      &[ksg(255, 1, d(1949, 5, 23), d(2008, 11, 1))],
      MergeOptions::default(),
    )
    .unwrap();
    assert!(out.links.is_empty());
    assert_eq!(out.unmatched, vec![
      Unmatched { system: CodingSystem::Cow, code: 260 },
      Unmatched { system: CodingSystem::Ksg, code: 255 },
    ]);
  }

  #[test]
  fn touching_boundary_yields_single_day_link() {
    let out = merge(
      &[cow(100, 1, d(1900, 1, 1), d(1910, 6, 1))],
      &[ksg(100, 1, d(1910, 6, 1), d(1920, 1, 1))],
      MergeOptions::default(),
    )
    .unwrap();
    assert_eq!(out.links.len(), 1);
    assert_eq!(out.links[0].start, out.links[0].end);
  }

  #[test]
  fn each_overlapping_counterpart_gets_its_own_link() {
    let out = merge(
      &[cow(300, 1, d(1900, 1, 1), d(1950, 1, 1))],
      &[ksg(300, 1, d(1890, 1, 1), d(1910, 1, 1)), ksg(300, 2, d(1920, 1, 1), d(1930, 1, 1))],
      MergeOptions::default(),
    )
    .unwrap();
    assert_eq!(
      out.links.iter().map(|l| (l.start, l.end)).collect::<Vec<_>>(),
      vec![(d(1900, 1, 1), d(1910, 1, 1)), (d(1920, 1, 1), d(1930, 1, 1))]
    );
  }

  #[test]
  fn duplicate_inputs_produce_one_link() {
    let a = cow(2, 1, d(1816, 1, 1), d(2008, 6, 30));
    let b = ksg(2, 1, d(1816, 1, 1), d(2008, 11, 1));
    let out = merge(&[a, a], &[b], MergeOptions::default()).unwrap();
    assert_eq!(out.links.len(), 1);
  }

  #[test]
  fn remainders_cover_the_gaps() {
    let out = merge(
      &[cow(300, 1, d(1900, 1, 1), d(1950, 1, 1))],
      &[ksg(300, 1, d(1890, 1, 1), d(1910, 1, 1)), ksg(300, 2, d(1920, 1, 1), d(1930, 1, 1))],
      MergeOptions { remainders: true, horizon: None },
    )
    .unwrap();
    let one_sided: Vec<_> = out.links.iter().filter(|l| l.is_one_sided()).copied().collect();
    assert_eq!(one_sided, vec![
      CrossSystemLink::new(Some(300), None, d(1910, 1, 2), d(1919, 12, 31)).unwrap(),
      CrossSystemLink::new(Some(300), None, d(1930, 1, 2), d(1950, 1, 1)).unwrap(),
      CrossSystemLink::new(None, Some(300), d(1890, 1, 1), d(1899, 12, 31)).unwrap(),
    ]);
  }

  #[test]
  fn remainder_of_unmatched_interval_is_whole_interval() {
    let out = merge(
      &[cow(260, 1, d(1955, 5, 5), d(1990, 10, 2))],
      &[],
      MergeOptions { remainders: true, horizon: None },
    )
    .unwrap();
    assert_eq!(out.links, vec![
      CrossSystemLink::new(Some(260), None, d(1955, 5, 5), d(1990, 10, 2)).unwrap()
    ]);
  }

  #[test]
  fn settle_drops_codes_linked_later() {
    let mut out = merge(
      &[cow(970, 1, d(1999, 9, 14), d(2008, 6, 30))],
      &[ksg(971, 1, d(1968, 1, 31), d(2008, 11, 1))],
      MergeOptions::default(),
    )
    .unwrap();
    assert_eq!(out.unmatched.len(), 2);
    let manual = CrossSystemLink::new(Some(970), Some(971), d(1999, 9, 14), d(2008, 6, 30)).unwrap();
    out.settle(&[manual]);
    assert!(out.unmatched.is_empty());
  }

  #[test]
  fn remainder_links_do_not_settle_their_own_code() {
    let mut out = merge(
      &[cow(2, 1, d(1816, 1, 1), d(2008, 6, 30))],
      &[ksg(2, 1, d(1816, 1, 1), d(2008, 11, 1)), ksg(999, 1, d(1900, 1, 1), d(1901, 1, 1))],
      MergeOptions { remainders: true, horizon: None },
    )
    .unwrap();
    let links = out.links.clone();
    assert!(links.iter().any(|l| l.ksg == Some(999)));
    out.settle(&links);
    assert_eq!(out.unmatched, vec![Unmatched { system: CodingSystem::Ksg, code: 999 }]);
  }

  #[test]
  fn vintage_gap_is_not_a_remainder() {
    let v = Vintage::default();
    let out = merge(
      &[cow(2, 1, d(1816, 1, 1), v.cow)],
      &[ksg(2, 1, d(1816, 1, 1), v.ksg)],
      MergeOptions::for_vintage(true, &v),
    )
    .unwrap();
    assert_eq!(out.links, vec![CrossSystemLink::new(Some(2), Some(2), d(1816, 1, 1), v.cow).unwrap()]);
  }

  #[test]
  fn remainders_stop_at_the_horizon() {
    let v = Vintage::default();
    let out = merge(
      &[cow(345, 1, d(1878, 8, 1), d(1941, 4, 20)), cow(345, 2, d(1944, 10, 20), d(2006, 6, 4))],
      &[ksg(345, 1, d(1878, 8, 1), v.ksg)],
      MergeOptions::for_vintage(true, &v),
    )
    .unwrap();
    let one_sided: Vec<_> = out.links.iter().filter(|l| l.is_one_sided()).copied().collect();
    assert_eq!(one_sided, vec![
      CrossSystemLink::new(None, Some(345), d(1941, 4, 21), d(1944, 10, 19)).unwrap(),
      CrossSystemLink::new(None, Some(345), d(2006, 6, 5), v.cow).unwrap(),
    ]);
  }

  fn arb_interval(system: CodingSystem) -> impl Strategy<Value = MembershipInterval> {
    (1i32..6, 0i64..20_000, 0i64..5_000).prop_map(move |(code, offset, len)| {
      let start = d(1900, 1, 1) + chrono::Duration::days(offset);
      let end = start + chrono::Duration::days(len);
      iv(system, code, 1, start, end)
    })
  }

  proptest! {
    #[test]
    fn overlap_is_symmetric(
      a in proptest::collection::vec(arb_interval(CodingSystem::Cow), 0..8),
      b in proptest::collection::vec(arb_interval(CodingSystem::Ksg), 0..8),
    ) {
      let mut ab: Vec<_> = overlaps(&a, &b);
      let mut ba: Vec<_> = overlaps(&b, &a)
        .into_iter()
        .map(|o| Overlap { left: o.right, right: o.left, ..o })
        .collect();
      ab.sort();
      ba.sort();
      prop_assert_eq!(ab, ba);
    }

    #[test]
    fn links_are_intersections(
      a in proptest::collection::vec(arb_interval(CodingSystem::Cow), 0..8),
      b in proptest::collection::vec(arb_interval(CodingSystem::Ksg), 0..8),
    ) {
      let out = merge(&a, &b, MergeOptions::default()).unwrap();
      for link in &out.links {
        prop_assert!(link.start <= link.end);
        let derived = a.iter().any(|x| {
          b.iter().any(|y| {
            x.code == y.code
              && Some(x.code) == link.cow
              && link.start == x.start.max(y.start)
              && link.end == x.end.min(y.end)
          })
        });
        prop_assert!(derived);
      }
    }

    #[test]
    fn remainders_partition_each_interval(
      a in proptest::collection::vec(arb_interval(CodingSystem::Cow), 1..6),
      b in proptest::collection::vec(arb_interval(CodingSystem::Ksg), 0..6),
    ) {
      let out = merge(&a, &b, MergeOptions { remainders: true, horizon: None }).unwrap();
      for x in &a {
        // Every day of a COW interval is covered by a link carrying its code.
        let mut day = x.start;
        while day <= x.end {
          let covered = out.links.iter().any(|l| l.cow == Some(x.code) && l.start <= day && day <= l.end);
          prop_assert!(covered, "day {} of {:?} uncovered", day, x);
          day = day + chrono::Duration::days(97);
        }
      }
    }
  }
}
