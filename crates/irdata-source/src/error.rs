//! Error types for the irdata-source loaders.

use std::path::PathBuf;

use irdata_core::{dataset::Dataset, row::Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot read {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot decode {what}: {reason}")]
  Decode { what: String, reason: String },

  /// A row failed to load. The whole file is rejected.
  #[error("{dataset} line {line}: {source}")]
  Row {
    dataset: Dataset,
    line:    usize,
    #[source]
    source:  irdata_core::Error,
  },
}

impl Error {
  pub(crate) fn decode(what: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Decode { what: what.into(), reason: reason.into() }
  }

  /// The core error behind a row failure.
  pub fn core(&self) -> Option<&irdata_core::Error> {
    match self {
      Self::Row { source, .. } => Some(source),
      _ => None,
    }
  }
}

/// Attach the dataset and source line to a core error.
pub(crate) trait AtRow<T> {
  fn at(self, dataset: Dataset, row: &Row) -> Result<T>;
}

impl<T> AtRow<T> for irdata_core::Result<T> {
  fn at(self, dataset: Dataset, row: &Row) -> Result<T> {
    self.map_err(|source| Error::Row { dataset, line: row.line, source })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
