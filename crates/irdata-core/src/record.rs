//! Table shape shared by every persisted record type.
//!
//! A record names its table and columns and renders itself as a row of
//! [`Cell`]s in column order. Storage backends build their statements from
//! this instead of knowing each type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::DateRange;

/// One column value, backend-neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
  Null,
  Bool(bool),
  Int(i64),
  Real(f64),
  Date(NaiveDate),
  Text(String),
}

impl From<bool> for Cell {
  fn from(v: bool) -> Self { Self::Bool(v) }
}

impl From<i64> for Cell {
  fn from(v: i64) -> Self { Self::Int(v) }
}

impl From<i32> for Cell {
  fn from(v: i32) -> Self { Self::Int(v.into()) }
}

impl From<u32> for Cell {
  fn from(v: u32) -> Self { Self::Int(v.into()) }
}

impl From<f64> for Cell {
  fn from(v: f64) -> Self { Self::Real(v) }
}

impl From<NaiveDate> for Cell {
  fn from(v: NaiveDate) -> Self { Self::Date(v) }
}

impl From<String> for Cell {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for Cell {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

/// A persisted record type.
pub trait Record {
  const TABLE: &'static str;
  const COLUMNS: &'static [&'static str];

  /// One cell per entry of [`COLUMNS`](Self::COLUMNS), same order.
  fn cells(&self) -> Vec<Cell>;
}

/// Both bounds of a [`DateRange`], for `*_min` / `*_max` column pairs.
pub fn range_cells(range: &DateRange) -> [Cell; 2] { [range.min.into(), range.max.into()] }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn option_maps_to_null() {
    assert_eq!(Cell::from(None::<i64>), Cell::Null);
    assert_eq!(Cell::from(Some(3_i32)), Cell::Int(3));
    assert_eq!(Cell::from("x"), Cell::Text("x".into()));
  }

  #[test]
  fn unknown_range_is_two_nulls() {
    assert_eq!(range_cells(&DateRange::UNKNOWN), [Cell::Null, Cell::Null]);
  }
}
