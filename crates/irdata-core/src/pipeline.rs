//! The reconcile run: merge, override, project.
//!
//! Each stage completes before the next begins. Derived tables are rebuilt
//! from scratch on every run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  link::{CrossSystemLink, YearLink},
  merge::{MergeOptions, Unmatched, merge},
  overrides::{self, Override, OverrideReport},
  project::{project_links, system_years},
  state::{CodingSystem, MembershipInterval},
  store::IrStore,
};

/// Summary of one reconcile run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
  pub run_id:            Uuid,
  pub finished_at:       DateTime<Utc>,
  pub remainders:        bool,
  pub cow_states:        usize,
  pub ksg_states:        usize,
  pub cow_intervals:     usize,
  pub ksg_intervals:     usize,
  pub links:             usize,
  pub overrides_applied: usize,
  pub links_retired:     usize,
  pub year_links:        usize,
  /// Codes still without a counterpart after overrides.
  pub unmatched:         Vec<Unmatched>,
}

impl std::fmt::Display for ReconcileReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "run {}", self.run_id)?;
    writeln!(f, "  states      cow {:>5}  ksg {:>5}", self.cow_states, self.ksg_states)?;
    writeln!(f, "  intervals   cow {:>5}  ksg {:>5}", self.cow_intervals, self.ksg_intervals)?;
    writeln!(
      f,
      "  links       {:>5}  ({} overrides, {} retired)",
      self.links, self.overrides_applied, self.links_retired
    )?;
    writeln!(f, "  year links  {:>5}", self.year_links)?;
    write!(f, "  unmatched   {:>5}", self.unmatched.len())?;
    for u in &self.unmatched {
      write!(f, "\n    {} {}", u.system, u.code)?;
    }
    Ok(())
  }
}

/// The in-memory result of a reconcile run.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
  pub links:      Vec<CrossSystemLink>,
  pub year_links: Vec<YearLink>,
  pub unmatched:  Vec<Unmatched>,
  pub overrides:  OverrideReport,
}

/// Run merge, overrides and projection without a store.
pub fn plan(
  cow: &[MembershipInterval],
  ksg: &[MembershipInterval],
  overrides: &[Override],
  options: MergeOptions,
) -> Result<Plan> {
  let mut outcome = merge(cow, ksg, options)?;
  let mut links = std::mem::take(&mut outcome.links);
  let report = overrides::apply(&mut links, overrides);
  let year_links = project_links(&links)?;
  outcome.settle(&links);
  Ok(Plan { links, year_links, unmatched: outcome.unmatched, overrides: report })
}

/// Rebuild the system-year table of `system` from its stored memberships.
pub async fn rebuild_system_years<S: IrStore>(store: &S, system: CodingSystem) -> Result<usize> {
  let memberships = store.memberships(system).await.map_err(Error::store)?;
  let n = store
    .replace_system_years(system, system_years(&memberships))
    .await
    .map_err(Error::store)?;
  info!(%system, years = n, "rebuilt system years");
  Ok(n)
}

/// Recompute every cross-system link and year link from the stored
/// memberships, then record the run.
///
/// Merge, overrides and projection run in memory; the stored links and year
/// links are then replaced in a single write, so a failed run leaves the
/// previous run's tables as they were.
pub async fn reconcile<S: IrStore>(
  store: &S,
  overrides: &[Override],
  options: MergeOptions,
) -> Result<ReconcileReport> {
  let cow_states = store.states(CodingSystem::Cow).await.map_err(Error::store)?.len();
  let ksg_states = store.states(CodingSystem::Ksg).await.map_err(Error::store)?.len();
  let cow = store.memberships(CodingSystem::Cow).await.map_err(Error::store)?;
  let ksg = store.memberships(CodingSystem::Ksg).await.map_err(Error::store)?;

  let Plan { links, year_links, unmatched, overrides: applied } = plan(&cow, &ksg, overrides, options)?;
  info!(
    links = links.len(),
    remainders = options.remainders,
    retired = applied.retired,
    inserted = applied.inserted,
    "merged memberships and applied overrides"
  );

  let (links, year_links) = store.replace_links(links, year_links).await.map_err(Error::store)?;
  info!(links, year_links, "stored links and year links");

  if !unmatched.is_empty() {
    warn!(count = unmatched.len(), "codes without a counterpart in the other system");
  }

  let report = ReconcileReport {
    run_id: Uuid::new_v4(),
    finished_at: Utc::now(),
    remainders: options.remainders,
    cow_states,
    ksg_states,
    cow_intervals: cow.len(),
    ksg_intervals: ksg.len(),
    links,
    overrides_applied: applied.applied,
    links_retired: applied.retired,
    year_links,
    unmatched,
  };
  store.record_run(&report).await.map_err(Error::store)?;
  Ok(report)
}
