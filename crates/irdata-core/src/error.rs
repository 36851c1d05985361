//! Error types for `irdata-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A numeric or date field could not be parsed, even after sentinel
  /// substitution.
  #[error("malformed {field} value {value:?}: {reason}")]
  Malformed {
    field:  String,
    value:  String,
    reason: String,
  },

  #[error("missing field: {0}")]
  MissingField(String),

  #[error("invalid interval for {what}: end {end} precedes start {start}")]
  InvalidInterval {
    what:  String,
    start: NaiveDate,
    end:   NaiveDate,
  },

  #[error("cross-system link {start}..{end} has neither a COW nor a KSG code")]
  EmptyLink { start: NaiveDate, end: NaiveDate },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn malformed(
    field: impl Into<String>,
    value: impl Into<String>,
    reason: impl Into<String>,
  ) -> Self {
    Self::Malformed {
      field:  field.into(),
      value:  value.into(),
      reason: reason.into(),
    }
  }

  /// Wrap an error raised by a persistence backend.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// True for errors that indicate an upstream decoding bug rather than bad
  /// source data.
  pub fn is_invariant_violation(&self) -> bool {
    matches!(self, Self::InvalidInterval { .. } | Self::EmptyLink { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
