//! Layered configuration: optional TOML file, then `IRDATA_*` environment
//! variables. Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::builder::{ConfigBuilder, DefaultState};
use irdata_core::date::Vintage;
use irdata_source::SourceFiles;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path: PathBuf,
  pub sources:    SourceFiles,
  pub vintage:    Vintage,
  /// Emit one-sided links for spans without a counterpart.
  pub remainders: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("irdata.sqlite3"),
      sources:    SourceFiles::default(),
      vintage:    Vintage::default(),
      remainders: false,
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then the environment.
  ///
  /// Nested keys use a double underscore: `IRDATA_SOURCES__DIR=/data`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("IRDATA")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      );
    Self::build(builder)
  }

  fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let settings = builder.build().context("failed to read configuration")?;
    let mut out: Self = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    out.store_path = expand_tilde(&out.store_path);
    Ok(out)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
