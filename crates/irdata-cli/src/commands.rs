//! Subcommand bodies.

use anyhow::Context as _;
use chrono::NaiveDate;
use irdata_core::{
  dataset::Dataset,
  link::{CrossSystemLink, LinkFilter, YearLink},
  merge::MergeOptions,
  overrides, pipeline,
  state::{Ccode, CodingSystem},
  store::IrStore,
};
use irdata_store_sqlite::SqliteStore;
use strum::IntoEnumIterator;
use tracing::info;

use crate::settings::Settings;

fn options(settings: &Settings) -> MergeOptions { MergeOptions::for_vintage(settings.remainders, &settings.vintage) }

// ─── load ────────────────────────────────────────────────────────────────────

/// Reload `datasets` (all when empty), then reconcile.
///
/// Each dataset is decoded completely before its stored rows are removed, so
/// a malformed file leaves the previous load in place.
pub async fn load(store: &SqliteStore, settings: &Settings, datasets: &[Dataset]) -> anyhow::Result<()> {
  let datasets: Vec<Dataset> = if datasets.is_empty() { Dataset::iter().collect() } else { datasets.to_vec() };

  for dataset in datasets {
    let loaded = irdata_source::read(&settings.sources, dataset, &settings.vintage)
      .with_context(|| format!("failed to read dataset {dataset}"))?;
    store
      .unload(dataset)
      .await
      .with_context(|| format!("failed to unload dataset {dataset}"))?;
    loaded
      .persist(store)
      .await
      .with_context(|| format!("failed to store dataset {dataset}"))?;
    info!(%dataset, "loaded dataset");

    let system = match dataset {
      Dataset::CowStates => Some(CodingSystem::Cow),
      Dataset::KsgStates => Some(CodingSystem::Ksg),
      _ => None,
    };
    if let Some(system) = system {
      pipeline::rebuild_system_years(store, system)
        .await
        .with_context(|| format!("failed to rebuild {system} system years"))?;
    }
  }

  reconcile(store, settings, false).await
}

// ─── reconcile ───────────────────────────────────────────────────────────────

pub async fn reconcile(store: &SqliteStore, settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
  let table = overrides::builtin(&settings.vintage).context("failed to build override table")?;

  if dry_run {
    let cow = store.memberships(CodingSystem::Cow).await?;
    let ksg = store.memberships(CodingSystem::Ksg).await?;
    let plan = pipeline::plan(&cow, &ksg, &table, options(settings))?;
    println!("dry run (nothing written)");
    println!("  intervals   cow {:>5}  ksg {:>5}", cow.len(), ksg.len());
    println!(
      "  links       {:>5}  ({} overrides, {} retired)",
      plan.links.len(),
      plan.overrides.applied,
      plan.overrides.retired
    );
    println!("  year links  {:>5}", plan.year_links.len());
    print!("  unmatched   {:>5}", plan.unmatched.len());
    for u in &plan.unmatched {
      print!("\n    {} {}", u.system, u.code);
    }
    println!();
    return Ok(());
  }

  let report = pipeline::reconcile(store, &table, options(settings))
    .await
    .context("reconcile failed")?;
  println!("{report}");
  Ok(())
}

// ─── links ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LinkQuery {
  pub cow:    Vec<Ccode>,
  pub ksg:    Vec<Ccode>,
  pub during: Option<(NaiveDate, NaiveDate)>,
  pub years:  bool,
  pub json:   bool,
}

impl LinkQuery {
  fn filter(&self) -> LinkFilter {
    LinkFilter { cow: self.cow.clone(), ksg: self.ksg.clone(), during: self.during }
  }
}

fn code(c: Option<Ccode>) -> String { c.map_or_else(|| "-".to_owned(), |c| c.to_string()) }

fn link_line(l: &CrossSystemLink) -> String {
  format!("{:>5} {:>5}  {} {}", code(l.cow), code(l.ksg), l.start, l.end)
}

fn year_line(y: &YearLink) -> String {
  let flag = |b: bool, c: char| if b { c } else { '.' };
  format!(
    "{:>5} {:>5}  {}  {}{}{}  {:.4}",
    code(y.cow),
    code(y.ksg),
    y.year,
    flag(y.start_year, 's'),
    flag(y.mid_year, 'm'),
    flag(y.end_year, 'e'),
    y.frac_year
  )
}

pub async fn links(store: &SqliteStore, query: &LinkQuery) -> anyhow::Result<()> {
  let filter = query.filter();
  if query.years {
    let rows = store.year_links(&filter).await?;
    if query.json {
      println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
      println!("  cow   ksg  year  sme  frac");
      rows.iter().for_each(|y| println!("{}", year_line(y)));
    }
  } else {
    let rows = store.links(&filter).await?;
    if query.json {
      println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
      println!("  cow   ksg  start      end");
      rows.iter().for_each(|l| println!("{}", link_line(l)));
    }
  }
  Ok(())
}

// ─── runs ────────────────────────────────────────────────────────────────────

pub async fn runs(store: &SqliteStore, limit: usize) -> anyhow::Result<()> {
  let reports = store.runs(limit).await?;
  if reports.is_empty() {
    println!("no reconcile runs recorded");
  }
  for report in reports {
    println!("{} {}", report.finished_at.format("%Y-%m-%d %H:%M:%S"), report);
  }
  Ok(())
}
