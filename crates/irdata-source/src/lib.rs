//! Source-file decoding and per-dataset loaders for irdata.
//!
//! Turns the upstream delimited files into [`irdata_core`] batches. Pure
//! synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use irdata_core::{dataset::Dataset, date::Vintage};
//! use irdata_source::{SourceFiles, read};
//!
//! let files = SourceFiles { dir: "data".into(), ..SourceFiles::default() };
//! let loaded = read(&files, Dataset::CowStates, &Vintage::default()).unwrap();
//! println!("{} factor labels", loaded.factors().len());
//! ```

pub mod contdir;
pub mod cow;
pub mod error;
pub mod ksg;
pub mod mid;
pub mod text;
pub mod war3;
pub mod war4;

use std::path::{Path, PathBuf};

pub use error::{Error, Result};
use irdata_core::{
  contiguity::Contiguity,
  dataset::Dataset,
  date::Vintage,
  dispute::DisputeBatch,
  factor::{self, FactorEntry},
  row::Row,
  state::{CodingSystem, StateSystem},
  store::IrStore,
  war::WarBatch,
  war3::War3Batch,
};
use serde::{Deserialize, Serialize};
use text::{Delimited, TextEncoding};
use tracing::debug;

// ─── Source layout ───────────────────────────────────────────────────────────

/// Where each dataset's files live. Names are relative to `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
  pub dir:               PathBuf,
  pub cow_states:        String,
  pub cow_majors:        String,
  pub ksg_states:        String,
  pub ksg_microstates:   String,
  pub war4_inter:        String,
  pub war4_intra:        String,
  pub war4_nonstate:     String,
  /// Inter-, intra- and extra-state war lists.
  pub war3_wars:         Vec<String>,
  pub war3_participants: String,
  pub mida:              String,
  pub midb:              String,
  pub contdir:           String,
}

impl Default for SourceFiles {
  fn default() -> Self {
    Self {
      dir:               PathBuf::from("data"),
      cow_states:        "states2008.1.csv".into(),
      cow_majors:        "majors2008.1.csv".into(),
      ksg_states:        "iisystem.dat".into(),
      ksg_microstates:   "microstatessystem.dat".into(),
      war4_inter:        "InterStateWarData_v4.0.csv".into(),
      war4_intra:        "IntraStateWarData_v4.1.csv".into(),
      war4_nonstate:     "NonStateWarData_v4.0.csv".into(),
      war3_wars:         vec![
        "InterStateWars_V3-0.csv".into(),
        "IntraStateWars_V3-0.csv".into(),
        "ExtraStateWars_V3-0.csv".into(),
      ],
      war3_participants: "InterStateWarParticipants_V3-0.csv".into(),
      mida:              "MIDA_3.10.csv".into(),
      midb:              "MIDB_3.10.csv".into(),
      contdir:           "contdir.csv".into(),
    }
  }
}

impl SourceFiles {
  pub fn path(&self, name: &str) -> PathBuf { self.dir.join(name) }

  fn rows(&self, name: &str, dialect: &Delimited) -> Result<Vec<Row>> {
    let path = self.path(name);
    let rows = rows_from(&path, dialect)?;
    debug!(path = %path.display(), rows = rows.len(), "decoded source file");
    Ok(rows)
  }
}

/// Read and decode one delimited file.
pub fn rows_from(path: &Path, dialect: &Delimited) -> Result<Vec<Row>> {
  let bytes = std::fs::read(path).map_err(|source| Error::Read { path: path.to_owned(), source })?;
  dialect.rows(&path.display().to_string(), &bytes)
}

// ─── Loaded batches ──────────────────────────────────────────────────────────

/// One dataset's decoded records, ready to persist.
#[derive(Debug)]
pub enum Loaded {
  States(CodingSystem, StateSystem),
  Wars(WarBatch),
  War3(War3Batch),
  Disputes(DisputeBatch),
  Contiguity(Vec<Contiguity>),
}

impl Loaded {
  pub fn dataset(&self) -> Dataset {
    match self {
      Self::States(CodingSystem::Cow, _) => Dataset::CowStates,
      Self::States(CodingSystem::Ksg, _) => Dataset::KsgStates,
      Self::Wars(_) => Dataset::War4,
      Self::War3(_) => Dataset::War3,
      Self::Disputes(_) => Dataset::Mids,
      Self::Contiguity(_) => Dataset::Contdir,
    }
  }

  /// The factor labels that describe this dataset's coded columns.
  pub fn factors(&self) -> Vec<FactorEntry> {
    match self {
      Self::States(..) | Self::Disputes(_) => Vec::new(),
      Self::Wars(_) => [factor::war_types(), factor::war4_outcomes(), factor::war4_where_fought()]
        .iter()
        .flat_map(|f| f.entries())
        .collect(),
      Self::War3(_) => factor::war_types().entries(),
      Self::Contiguity(_) => factor::contiguity_types().entries(),
    }
  }

  /// Write the batch and its factor labels to `store`.
  pub async fn persist<S: IrStore>(self, store: &S) -> std::result::Result<(), S::Error> {
    let factors = self.factors();
    if !factors.is_empty() {
      store.add_factors(factors).await?;
    }
    match self {
      Self::States(system, batch) => store.add_state_system(system, batch).await,
      Self::Wars(batch) => store.add_wars(batch).await,
      Self::War3(batch) => store.add_war3(batch).await,
      Self::Disputes(batch) => store.add_disputes(batch).await,
      Self::Contiguity(rows) => store.add_contiguity(rows).await,
    }
  }
}

/// Read and decode every file of `dataset`.
pub fn read(files: &SourceFiles, dataset: Dataset, vintage: &Vintage) -> Result<Loaded> {
  let csv = Delimited::csv();
  let latin1 = Delimited::csv().encoding(TextEncoding::Latin1);

  Ok(match dataset {
    Dataset::CowStates => Loaded::States(
      CodingSystem::Cow,
      cow::load(&files.rows(&files.cow_states, &csv)?, &files.rows(&files.cow_majors, &csv)?, vintage.cow)?,
    ),
    Dataset::KsgStates => {
      let dialect = ksg::dialect();
      Loaded::States(
        CodingSystem::Ksg,
        ksg::load(&files.rows(&files.ksg_states, &dialect)?, &files.rows(&files.ksg_microstates, &dialect)?)?,
      )
    }
    Dataset::War4 => Loaded::Wars(war4::load(
      &files.rows(&files.war4_inter, &csv)?,
      &files.rows(&files.war4_intra, &latin1)?,
      &files.rows(&files.war4_nonstate, &latin1)?,
      vintage.war4,
    )?),
    Dataset::War3 => {
      let wars = files.war3_wars.iter().map(|name| files.rows(name, &latin1)).collect::<Result<Vec<_>>>()?;
      Loaded::War3(war3::load(&wars, &files.rows(&files.war3_participants, &latin1)?)?)
    }
    Dataset::Mids => {
      Loaded::Disputes(mid::load(&files.rows(&files.mida, &latin1)?, &files.rows(&files.midb, &latin1)?)?)
    }
    Dataset::Contdir => Loaded::Contiguity(contdir::load(&files.rows(&files.contdir, &latin1)?, vintage.contdir)?),
  })
}
