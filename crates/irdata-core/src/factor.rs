//! Label tables for categorical codes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::record::{Cell, Record};

/// A `(value, label)` table for one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor<V: Ord> {
  pub table:  String,
  pub labels: BTreeMap<V, String>,
}

impl<V: Ord + Copy + Into<Cell> + std::fmt::Display> Factor<V> {
  pub fn new<L: Into<String>>(table: impl Into<String>, labels: impl IntoIterator<Item = (V, L)>) -> Self {
    Self {
      table:  table.into(),
      labels: labels.into_iter().map(|(v, l)| (v, l.into())).collect(),
    }
  }

  pub fn label(&self, value: V) -> Option<&str> { self.labels.get(&value).map(String::as_str) }

  pub fn contains(&self, value: V) -> bool { self.labels.contains_key(&value) }

  /// Check a loaded value against the table. Unknown codes are kept but
  /// logged.
  pub fn check(&self, field: &str, value: Option<V>) -> Option<V> {
    if let Some(v) = value {
      if !self.contains(v) {
        warn!(table = %self.table, field, value = %v, "code not in factor table");
      }
    }
    value
  }

  pub fn entries(&self) -> Vec<FactorEntry> {
    self
      .labels
      .iter()
      .map(|(v, l)| FactorEntry { table: self.table.clone(), value: (*v).into(), label: l.clone() })
      .collect()
  }
}

/// One persisted row of a factor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorEntry {
  pub table: String,
  pub value: Cell,
  pub label: String,
}

impl Record for FactorEntry {
  const COLUMNS: &'static [&'static str] = &["tbl", "value", "label"];
  const TABLE: &'static str = "factors";

  fn cells(&self) -> Vec<Cell> {
    vec![self.table.as_str().into(), self.value.clone(), self.label.as_str().into()]
  }
}

// ─── Built-in tables ─────────────────────────────────────────────────────────

pub fn war_types() -> Factor<i64> {
  Factor::new("cow_war_types", [
    (1, "Inter-State War"),
    (2, "Extra-State War: colonial"),
    (3, "Extra-State War: imperial"),
    (4, "Intra-State War: civil war for central control"),
    (5, "Intra-State War: civil war over local issues"),
    (6, "Intra-State War: regional internal"),
    (7, "Intra-State War: intercommunal"),
    (8, "Non-State War: in non-state territory"),
    (9, "Non-State War: across state borders"),
  ])
}

pub fn war4_outcomes() -> Factor<i64> {
  Factor::new("war4_outcomes", [
    (1, "Winner"),
    (2, "Loser"),
    (3, "Compromise/Tied"),
    (4, "Transformed into another type of war"),
    (5, "Ongoing"),
    (6, "Stalemate"),
    (7, "Conflict continues at below war level"),
    (8, "Changed sides"),
  ])
}

pub fn war4_where_fought() -> Factor<i64> {
  Factor::new("war4_where_fought", [
    (1, "W. Hemisphere"),
    (2, "Europe"),
    (4, "Africa"),
    (6, "Middle East"),
    (7, "Asia"),
    (9, "Oceania"),
    (11, "Europe & Middle East"),
    (12, "Europe & Asia"),
    (13, "W. Hemisphere & Asia"),
    (14, "Europe, Africa & Middle East"),
    (15, "Europe, Africa, Middle East & Asia"),
    (16, "Africa, Middle East, Asia & Oceania"),
    (17, "Asia & Oceania"),
    (18, "Africa & Middle East"),
    (19, "Europe, Africa, Middle East, Asia & Oceania"),
  ])
}

pub fn contiguity_types() -> Factor<i64> {
  Factor::new("cont_type", [
    (1, "Land or river"),
    (2, "Water, 12 miles or less"),
    (3, "Water, 24 miles or less"),
    (4, "Water, 150 miles or less"),
    (5, "Water, 400 miles or less"),
  ])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_and_entries() {
    let f = contiguity_types();
    assert_eq!(f.label(1), Some("Land or river"));
    assert_eq!(f.label(6), None);

    let entries = f.entries();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].table, "cont_type");
    assert_eq!(entries[0].value, Cell::Int(1));
  }

  #[test]
  fn check_keeps_unknown_codes() {
    let f = war4_outcomes();
    assert_eq!(f.check("outcome", Some(42)), Some(42));
    assert_eq!(f.check("outcome", None), None);
  }

  #[test]
  fn where_fought_skips_unused_codes() {
    let f = war4_where_fought();
    assert!(!f.contains(3));
    assert!(f.contains(19));
  }
}
