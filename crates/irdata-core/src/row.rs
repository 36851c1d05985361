//! Decoded source rows.

use chrono::NaiveDate;

use crate::{
  Error, Result,
  date::{Coded, DateRange, SentinelPolicy},
  state::Ccode,
};

/// One source row as ordered `(field, value)` pairs, already decoded to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
  /// 1-based line in the source file.
  pub line:   usize,
  pub fields: Vec<(String, String)>,
}

impl Row {
  pub fn new(line: usize, fields: Vec<(String, String)>) -> Self { Self { line, fields } }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v.as_str())
  }

  pub fn has(&self, field: &str) -> bool { self.get(field).is_some() }

  pub fn require(&self, field: &str) -> Result<&str> {
    self.get(field).ok_or_else(|| Error::MissingField(field.to_owned()))
  }

  /// Trimmed text, `None` when empty.
  pub fn text(&self, field: &str) -> Result<Option<String>> {
    let v = self.require(field)?.trim();
    Ok((!v.is_empty()).then(|| v.to_owned()))
  }

  pub fn int(&self, field: &str, policy: &SentinelPolicy) -> Result<Coded<i64>> {
    policy.parse(field, self.require(field)?)
  }

  /// Like [`int`](Self::int), for fields that must hold a value.
  pub fn value(&self, field: &str, policy: &SentinelPolicy) -> Result<i64> {
    match self.int(field, policy)? {
      Coded::Value(v) => Ok(v),
      Coded::Missing | Coded::Ongoing => Err(Error::MissingField(field.to_owned())),
    }
  }

  /// The value if present, `None` for missing or ongoing.
  pub fn opt(&self, field: &str, policy: &SentinelPolicy) -> Result<Option<i64>> {
    Ok(self.int(field, policy)?.value())
  }

  /// A required integer narrowed to an identifier type.
  pub fn id<T: TryFrom<i64>>(&self, field: &str, policy: &SentinelPolicy) -> Result<T> {
    let v = self.value(field, policy)?;
    T::try_from(v).map_err(|_| Error::malformed(field, v.to_string(), "out of range"))
  }

  /// A country code. Missing and non-positive codes are absent.
  pub fn ccode(&self, field: &str, policy: &SentinelPolicy) -> Result<Option<Ccode>> {
    match self.opt(field, policy)? {
      Some(v) if v > 0 => {
        Ccode::try_from(v).map(Some).map_err(|_| Error::malformed(field, v.to_string(), "out of range"))
      }
      _ => Ok(None),
    }
  }

  /// A count such as battle deaths: thousands separators are stripped and
  /// non-positive values are absent.
  pub fn count(&self, field: &str, policy: &SentinelPolicy) -> Result<Option<i64>> {
    let raw = self.require(field)?.replace(',', "");
    Ok(policy.parse(field, &raw)?.value().filter(|v| *v > 0))
  }

  /// `"1"` is true, `"0"` false, anything missing absent.
  pub fn flag(&self, field: &str, policy: &SentinelPolicy) -> Result<Option<bool>> {
    match self.int(field, policy)? {
      Coded::Value(1) => Ok(Some(true)),
      Coded::Value(0) => Ok(Some(false)),
      Coded::Value(v) => Err(Error::malformed(field, v.to_string(), "expected 0 or 1")),
      Coded::Missing | Coded::Ongoing => Ok(None),
    }
  }

  /// Build a [`DateRange`] from three component fields.
  pub fn date_range(
    &self,
    [year, month, day]: [&str; 3],
    policy: &SentinelPolicy,
    ongoing: NaiveDate,
  ) -> Result<DateRange> {
    DateRange::from_coded(self.int(year, policy)?, self.int(month, policy)?, self.int(day, policy)?, ongoing)
  }

  /// An exact date from three component fields that must all be present.
  pub fn date(&self, fields: [&str; 3], policy: &SentinelPolicy, ongoing: NaiveDate) -> Result<NaiveDate> {
    let range = self.date_range(fields, policy, ongoing)?;
    range.as_exact().ok_or_else(|| {
      Error::malformed(fields.join("/"), format!("{:?}..{:?}", range.min, range.max), "incomplete date")
    })
  }
}
