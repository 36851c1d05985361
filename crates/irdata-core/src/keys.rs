//! Composite keys for entities without a single-column natural key.
//!
//! All keys are pure functions of their inputs, so a loader can use them as
//! lookups without asking the store whether a row already exists.

use std::{collections::HashMap, fmt, hash::Hash};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::state::Ccode;

/// Placeholder used in a belligerent key when the actor has no country code.
pub const NO_CODE: &str = "None";

/// Separator between the parts of every synthesised key.
pub const SEPARATOR: char = ' ';

// ─── Occurrence counting ─────────────────────────────────────────────────────

/// Running 1-based count of how often each key has been seen.
///
/// Scoped to one load pass; the caller owns it and passes it explicitly.
#[derive(Debug, Clone)]
pub struct OccurrenceCounter<K> {
  counts: HashMap<K, u32>,
}

impl<K: Hash + Eq> Default for OccurrenceCounter<K> {
  fn default() -> Self { Self { counts: HashMap::new() } }
}

impl<K: Hash + Eq> OccurrenceCounter<K> {
  pub fn new() -> Self { Self::default() }

  /// Record one more occurrence of `key` and return its number (1 on first
  /// sight).
  pub fn next(&mut self, key: K) -> u32 {
    let n = self.counts.entry(key).or_insert(0);
    *n += 1;
    *n
  }

  /// How many times `key` has been seen so far.
  pub fn seen<Q>(&self, key: &Q) -> u32
  where
    K: std::borrow::Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.counts.get(key).copied().unwrap_or(0)
  }

  /// Number of distinct keys seen.
  pub fn distinct(&self) -> usize { self.counts.len() }
}

// ─── Belligerents ────────────────────────────────────────────────────────────

/// Identifies a war participant, state or non-state.
///
/// COW does not define belligerents consistently across its war datasets, so
/// the pair of country code and display name is used. A non-state actor is
/// identified by its name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BelligerentKey(String);

impl BelligerentKey {
  /// `ccode` should already be normalised: non-positive codes are `None`.
  pub fn new(ccode: Option<Ccode>, name: &str) -> Self {
    let name = name.trim();
    match ccode {
      Some(code) => Self(format!("{code}{SEPARATOR}{name}")),
      None => Self(format!("{NO_CODE}{SEPARATOR}{name}")),
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for BelligerentKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Sides ───────────────────────────────────────────────────────────────────

/// One of the two sides of a war or dispute.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
  A,
  B,
}

impl Side {
  /// COW codes sides as 1 and 2.
  pub fn from_code(code: i64) -> Option<Self> {
    match code {
      1 => Some(Self::A),
      2 => Some(Self::B),
      _ => None,
    }
  }

  pub fn other(self) -> Self {
    match self {
      Self::A => Self::B,
      Self::B => Self::A,
    }
  }
}

/// War number plus side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SideKey {
  pub war_num: u32,
  pub side:    Side,
}

impl SideKey {
  pub fn new(war_num: u32, side: Side) -> Self { Self { war_num, side } }

  /// Both sides of a war, A first.
  pub fn both(war_num: u32) -> [Self; 2] { [Self::new(war_num, Side::A), Self::new(war_num, Side::B)] }
}

impl fmt::Display for SideKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{SEPARATOR}{}", self.war_num, self.side)
  }
}

// ─── Participation ───────────────────────────────────────────────────────────

/// One participation of an actor in a conflict.
///
/// `occurrence` counts how often the same `(conflict, actor)` pair has
/// appeared so far in source order, which separates a state fighting the
/// same war in several disjoint spells or on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipationKey {
  /// War number, or dispute number for MIDs.
  pub conflict:   u32,
  /// Belligerent key, or the country code as text.
  pub actor:      String,
  pub occurrence: u32,
}

impl fmt::Display for ParticipationKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{SEPARATOR}{}{SEPARATOR}{}", self.conflict, self.actor, self.occurrence)
  }
}

/// Hands out [`ParticipationKey`]s for one load pass.
#[derive(Debug, Default)]
pub struct ParticipationKeys {
  counter: OccurrenceCounter<(u32, String)>,
}

impl ParticipationKeys {
  pub fn new() -> Self { Self::default() }

  pub fn next(&mut self, conflict: u32, actor: impl Into<String>) -> ParticipationKey {
    let actor = actor.into();
    let occurrence = self.counter.next((conflict, actor.clone()));
    ParticipationKey { conflict, actor, occurrence }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn belligerent_key_is_deterministic() {
    let a = BelligerentKey::new(Some(200), "United Kingdom");
    let b = BelligerentKey::new(Some(200), " United Kingdom ");
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "200 United Kingdom");
  }

  #[test]
  fn non_state_key_uses_marker() {
    let k = BelligerentKey::new(None, "Taiping Rebels");
    assert_eq!(k.as_str(), "None Taiping Rebels");
    assert_ne!(k, BelligerentKey::new(Some(710), "Taiping Rebels"));
  }

  #[test]
  fn occurrence_counter_is_per_key() {
    let mut c = OccurrenceCounter::new();
    assert_eq!(c.next(2), 1);
    assert_eq!(c.next(2), 2);
    assert_eq!(c.next(20), 1);
    assert_eq!(c.next(2), 3);
    assert_eq!(c.seen(&2), 3);
    assert_eq!(c.seen(&99), 0);
    assert_eq!(c.distinct(), 2);
  }

  #[test]
  fn participation_keys_count_recurring_pairs() {
    let mut keys = ParticipationKeys::new();
    let first = keys.next(108, "255");
    let other = keys.next(108, "2");
    let again = keys.next(108, "255");
    let other_war = keys.next(139, "255");

    assert_eq!(first.occurrence, 1);
    assert_eq!(other.occurrence, 1);
    assert_eq!(again.occurrence, 2);
    assert_eq!(other_war.occurrence, 1);
    assert_eq!(again.to_string(), "108 255 2");
  }

  #[test]
  fn side_codes() {
    assert_eq!(Side::from_code(1), Some(Side::A));
    assert_eq!(Side::from_code(2), Some(Side::B));
    assert_eq!(Side::from_code(-8), None);
    assert_eq!(Side::A.other(), Side::B);
    assert_eq!(SideKey::new(7, Side::B).to_string(), "7 b");
    assert_eq!("a".parse::<Side>().unwrap(), Side::A);
  }
}
