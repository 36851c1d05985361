//! `irdata`: load the COW, KSG and related datasets into SQLite and
//! reconcile the two state systems.
//!
//! # Usage
//!
//! ```text
//! irdata load                        # every dataset, then reconcile
//! irdata load --dataset mids --dataset contdir
//! irdata reconcile --remainders --dry-run
//! irdata links --ksg 260 --json
//! irdata links --cow 255 --years --from 1990-01-01 --to 1991-12-31
//! ```
//!
//! Settings come from `irdata.toml` (or `--config`) and `IRDATA_*`
//! environment variables.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use irdata_core::{dataset::Dataset, state::Ccode};
use irdata_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "irdata", version, about = "COW/KSG state-system loader and reconciler")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "irdata.toml")]
  config: PathBuf,

  /// SQLite database file; overrides `store_path`.
  #[arg(long, global = true, env = "IRDATA_STORE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reload source datasets, rebuild system years and reconcile.
  Load {
    /// Dataset to reload; repeat for several. Defaults to all.
    #[arg(long = "dataset", value_name = "NAME")]
    datasets:   Vec<Dataset>,
    #[arg(long)]
    remainders: bool,
  },

  /// Recompute cross-system links and year links from stored memberships.
  Reconcile {
    #[arg(long)]
    remainders: bool,
    /// Compute and print the result without writing it.
    #[arg(long)]
    dry_run:    bool,
  },

  /// Query stored links.
  Links {
    #[arg(long, value_name = "CCODE")]
    cow:   Vec<Ccode>,
    #[arg(long, value_name = "CCODE")]
    ksg:   Vec<Ccode>,
    /// Only links overlapping this span (both bounds required).
    #[arg(long, requires = "to")]
    from:  Option<NaiveDate>,
    #[arg(long, requires = "from")]
    to:    Option<NaiveDate>,
    /// Show the per-year projection instead of the spans.
    #[arg(long)]
    years: bool,
    #[arg(long)]
    json:  bool,
  },

  /// Show recent reconcile reports.
  Runs {
    #[arg(long, default_value_t = 5)]
    limit: usize,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  match cli.command {
    Command::Load { datasets, remainders } => {
      settings.remainders |= remainders;
      commands::load(&store, &settings, &datasets).await
    }
    Command::Reconcile { remainders, dry_run } => {
      settings.remainders |= remainders;
      commands::reconcile(&store, &settings, dry_run).await
    }
    Command::Links { cow, ksg, from, to, years, json } => {
      let query = commands::LinkQuery { cow, ksg, during: from.zip(to), years, json };
      commands::links(&store, &query).await
    }
    Command::Runs { limit } => commands::runs(&store, limit).await,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn datasets_parse_by_name() {
    let cli = Cli::try_parse_from(["irdata", "load", "--dataset", "mids", "--dataset", "cow-states"]).unwrap();
    match cli.command {
      Command::Load { datasets, remainders } => {
        assert_eq!(datasets, [Dataset::Mids, Dataset::CowStates]);
        assert!(!remainders);
      }
      other => panic!("unexpected command: {other:?}"),
    }
    assert!(Cli::try_parse_from(["irdata", "load", "--dataset", "nmc"]).is_err());
  }

  #[test]
  fn link_span_needs_both_bounds() {
    assert!(Cli::try_parse_from(["irdata", "links", "--from", "1990-01-01"]).is_err());
    let cli = Cli::try_parse_from([
      "irdata", "links", "--ksg", "260", "--from", "1990-01-01", "--to", "1990-12-31", "--years",
    ])
    .unwrap();
    match cli.command {
      Command::Links { ksg, from, years, .. } => {
        assert_eq!(ksg, [260]);
        assert_eq!(from, NaiveDate::from_ymd_opt(1990, 1, 1));
        assert!(years);
      }
      other => panic!("unexpected command: {other:?}"),
    }
  }

  #[test]
  fn global_flags_follow_the_subcommand() {
    let cli = Cli::try_parse_from(["irdata", "reconcile", "--dry-run", "--store", "/tmp/x.sqlite3"]).unwrap();
    assert_eq!(cli.store, Some(PathBuf::from("/tmp/x.sqlite3")));
    assert!(matches!(cli.command, Command::Reconcile { dry_run: true, remainders: false }));
  }
}
