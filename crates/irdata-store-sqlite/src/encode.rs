//! Conversions between domain types and SQLite column values.
//!
//! Dates are stored as `YYYY-MM-DD` text, which sorts chronologically.
//! Booleans are stored as 0/1. Coding systems are stored in their lowercase
//! text form.

use chrono::NaiveDate;
use irdata_core::{
  link::{CrossSystemLink, YearLink},
  record::{Cell, Record},
  state::{Ccode, CodingSystem, MembershipInterval, State},
};
use rusqlite::types::Value;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Cells ───────────────────────────────────────────────────────────────────

pub fn encode_cell(cell: Cell) -> Value {
  match cell {
    Cell::Null => Value::Null,
    Cell::Bool(v) => Value::Integer(v.into()),
    Cell::Int(v) => Value::Integer(v),
    Cell::Real(v) => Value::Real(v),
    Cell::Date(v) => Value::Text(encode_date(v)),
    Cell::Text(v) => Value::Text(v),
  }
}

/// `INSERT INTO <table> (<columns>) VALUES (?1, ...)` for `R`.
pub fn insert_sql<R: Record>(or_ignore: bool) -> String {
  let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT {}INTO {} ({}) VALUES ({})",
    if or_ignore { "OR IGNORE " } else { "" },
    R::TABLE,
    R::COLUMNS.join(", "),
    placeholders.join(", "),
  )
}

/// Insert every record through one prepared statement. Returns the number of
/// rows actually written, which is lower than `rows.len()` when `or_ignore`
/// skipped duplicates.
pub fn insert_all<R: Record>(conn: &rusqlite::Connection, rows: &[R], or_ignore: bool) -> rusqlite::Result<usize> {
  if rows.is_empty() {
    return Ok(0);
  }
  let mut stmt = conn.prepare_cached(&insert_sql::<R>(or_ignore))?;
  let mut written = 0;
  for row in rows {
    written += stmt.execute(rusqlite::params_from_iter(row.cells().into_iter().map(encode_cell)))?;
  }
  Ok(written)
}

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── CodingSystem ────────────────────────────────────────────────────────────

pub fn encode_system(system: CodingSystem) -> String { system.to_string() }

pub fn decode_system(s: &str) -> Result<CodingSystem> {
  s.parse().map_err(|_| Error::UnknownValue { kind: "coding system", value: s.to_owned() })
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Read inside the connection thread as plain column values, decoded into
// domain types after the call returns.

pub struct RawState {
  pub system:     String,
  pub code:       Ccode,
  pub abbrev:     String,
  pub name:       String,
  pub microstate: bool,
}

impl RawState {
  pub const SELECT: &'static str = "SELECT system, code, abbrev, name, microstate FROM states";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      system:     row.get(0)?,
      code:       row.get(1)?,
      abbrev:     row.get(2)?,
      name:       row.get(3)?,
      microstate: row.get(4)?,
    })
  }

  pub fn into_state(self) -> Result<State> {
    Ok(State {
      system:     decode_system(&self.system)?,
      code:       self.code,
      abbrev:     self.abbrev,
      name:       self.name,
      microstate: self.microstate,
    })
  }
}

pub struct RawMembership {
  pub system:   String,
  pub code:     Ccode,
  pub interval: u32,
  pub start:    String,
  pub end:      String,
}

impl RawMembership {
  pub const SELECT: &'static str = "SELECT system, code, interval, start_date, end_date FROM memberships";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      system:   row.get(0)?,
      code:     row.get(1)?,
      interval: row.get(2)?,
      start:    row.get(3)?,
      end:      row.get(4)?,
    })
  }

  pub fn into_membership(self) -> Result<MembershipInterval> {
    Ok(MembershipInterval::new(
      decode_system(&self.system)?,
      self.code,
      self.interval,
      decode_date(&self.start)?,
      decode_date(&self.end)?,
    )?)
  }
}

/// A stored cross-system link, dates still as text.
pub struct RawLink {
  pub cow:   Option<Ccode>,
  pub ksg:   Option<Ccode>,
  pub start: String,
  pub end:   String,
}

impl RawLink {
  pub const SELECT: &'static str = "SELECT cow_ccode, ksg_ccode, start_date, end_date FROM ksg_to_cow";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      cow:   row.get(0)?,
      ksg:   row.get(1)?,
      start: row.get(2)?,
      end:   row.get(3)?,
    })
  }

  pub fn into_link(self) -> Result<CrossSystemLink> {
    Ok(CrossSystemLink::new(self.cow, self.ksg, decode_date(&self.start)?, decode_date(&self.end)?)?)
  }
}

pub const SELECT_YEAR_LINKS: &str = "SELECT cow_ccode, ksg_ccode, year, start_year, end_year, mid_year, frac_year \
                                     FROM ksg_to_cow_year";

pub fn year_link_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<YearLink> {
  Ok(YearLink {
    cow:        row.get(0)?,
    ksg:        row.get(1)?,
    year:       row.get(2)?,
    start_year: row.get(3)?,
    end_year:   row.get(4)?,
    mid_year:   row.get(5)?,
    frac_year:  row.get(6)?,
  })
}

#[cfg(test)]
mod tests {
  use irdata_core::project::SystemYear;

  use super::*;

  #[test]
  fn insert_statement_follows_columns() {
    assert_eq!(
      insert_sql::<SystemYear>(false),
      "INSERT INTO system_years (system, code, year) VALUES (?1, ?2, ?3)"
    );
    assert!(insert_sql::<CrossSystemLink>(true).starts_with("INSERT OR IGNORE INTO ksg_to_cow "));
  }

  #[test]
  fn dates_are_iso_text() {
    let d = NaiveDate::from_ymd_opt(1816, 1, 1).unwrap();
    assert_eq!(encode_cell(Cell::Date(d)), Value::Text("1816-01-01".into()));
    assert_eq!(decode_date("1816-01-01").unwrap(), d);
    assert!(matches!(decode_date("1816/01/01"), Err(Error::DateParse(_))));
  }

  #[test]
  fn unknown_system_is_reported() {
    assert_eq!(decode_system("ksg").unwrap(), CodingSystem::Ksg);
    assert!(matches!(decode_system("gw"), Err(Error::UnknownValue { kind: "coding system", .. })));
  }
}
