//! The `IrStore` trait: the persistence sink for loaded and derived records.
//!
//! Implemented by storage backends (e.g. `irdata-store-sqlite`). The loaders
//! and the reconcile pipeline depend on this abstraction, not on any concrete
//! backend. The pipeline assumes exclusive single-writer access for the
//! duration of a run.

use std::future::Future;

use crate::{
  contiguity::Contiguity,
  dataset::Dataset,
  dispute::DisputeBatch,
  factor::FactorEntry,
  link::{CrossSystemLink, LinkFilter, YearLink},
  pipeline::ReconcileReport,
  project::SystemYear,
  state::{CodingSystem, MembershipInterval, State, StateSystem},
  war::WarBatch,
  war3::War3Batch,
};

/// Abstraction over an irdata store backend.
///
/// Every batch write commits as a unit. Derived tables (system years, links,
/// year links) are replaced wholesale, never updated in place. Links and
/// year links are replaced together.
pub trait IrStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Source datasets ───────────────────────────────────────────────────

  /// Persist one coding system's states, memberships and (COW only) major
  /// powers. Membership order is kept for read-back.
  fn add_state_system(
    &self,
    system: CodingSystem,
    batch: StateSystem,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_wars(&self, batch: WarBatch) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_war3(&self, batch: War3Batch) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_disputes(&self, batch: DisputeBatch) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_contiguity(
    &self,
    rows: Vec<Contiguity>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert factor labels, replacing existing labels of the same tables.
  fn add_factors(
    &self,
    entries: Vec<FactorEntry>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete everything a dataset loaded, so it can be loaded again.
  fn unload(&self, dataset: Dataset) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── State system reads ────────────────────────────────────────────────

  fn states(
    &self,
    system: CodingSystem,
  ) -> impl Future<Output = Result<Vec<State>, Self::Error>> + Send + '_;

  /// Membership intervals of one system in load order.
  fn memberships(
    &self,
    system: CodingSystem,
  ) -> impl Future<Output = Result<Vec<MembershipInterval>, Self::Error>> + Send + '_;

  /// Replace all system years of `system`. Returns the number written.
  fn replace_system_years(
    &self,
    system: CodingSystem,
    years: Vec<SystemYear>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Cross-system links ────────────────────────────────────────────────

  /// Replace every cross-system link and every year link in one commit.
  /// Links already present in `links` are stored once. Returns the number of
  /// links and year links written.
  fn replace_links(
    &self,
    links: Vec<CrossSystemLink>,
    year_links: Vec<YearLink>,
  ) -> impl Future<Output = Result<(usize, usize), Self::Error>> + Send + '_;

  /// Links matching `filter`, ordered by start date, then codes.
  fn links<'a>(
    &'a self,
    filter: &'a LinkFilter,
  ) -> impl Future<Output = Result<Vec<CrossSystemLink>, Self::Error>> + Send + 'a;

  /// Year links whose codes match `filter`, ordered by year. The filter's
  /// date span is applied to the calendar year.
  fn year_links<'a>(
    &'a self,
    filter: &'a LinkFilter,
  ) -> impl Future<Output = Result<Vec<YearLink>, Self::Error>> + Send + 'a;

  // ── Runs ──────────────────────────────────────────────────────────────

  fn record_run<'a>(
    &'a self,
    report: &'a ReconcileReport,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// The most recent reconcile reports, newest first.
  fn runs(&self, limit: usize) -> impl Future<Output = Result<Vec<ReconcileReport>, Self::Error>> + Send + '_;
}
