//! [`SqliteStore`], the SQLite implementation of [`IrStore`].

use std::{collections::BTreeSet, path::Path};

use irdata_core::{
  contiguity::Contiguity,
  dataset::Dataset,
  dispute::DisputeBatch,
  factor::FactorEntry,
  link::{CrossSystemLink, LinkFilter, YearLink},
  pipeline::ReconcileReport,
  project::SystemYear,
  record::Record,
  state::{CodingSystem, MembershipInterval, State, StateSystem},
  store::IrStore,
  war::WarBatch,
  war3::War3Batch,
};
use tracing::debug;

use crate::{
  Result,
  encode::{RawLink, RawMembership, RawState, SELECT_YEAR_LINKS, encode_system, insert_all, year_link_from_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An irdata store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Row count of `table`. Table names come from the `Record` impls only.
  pub async fn count(&self, table: &'static str) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?))
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }

  async fn raw_links(&self) -> Result<Vec<RawLink>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "{} ORDER BY start_date, cow_ccode, ksg_ccode",
          RawLink::SELECT
        ))?;
        let rows = stmt
          .query_map([], RawLink::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws)
  }
}

// ─── IrStore impl ────────────────────────────────────────────────────────────

impl IrStore for SqliteStore {
  type Error = crate::Error;

  // ── Source datasets ───────────────────────────────────────────────────────

  async fn add_state_system(&self, system: CodingSystem, batch: StateSystem) -> Result<()> {
    let (states, memberships, majors) = (batch.states.len(), batch.memberships.len(), batch.majors.len());
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_all(&tx, &batch.states, false)?;
        insert_all(&tx, &batch.memberships, false)?;
        insert_all(&tx, &batch.majors, false)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!(%system, states, memberships, majors, "stored state system");
    Ok(())
  }

  async fn add_wars(&self, batch: WarBatch) -> Result<()> {
    let wars = batch.wars.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_all(&tx, &batch.wars, false)?;
        insert_all(&tx, &batch.sides, false)?;
        insert_all(&tx, &batch.belligerents, false)?;
        insert_all(&tx, &batch.participations, false)?;
        insert_all(&tx, &batch.spells, false)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!(wars, "stored COW war data v4");
    Ok(())
  }

  async fn add_war3(&self, batch: War3Batch) -> Result<()> {
    let wars = batch.wars.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_all(&tx, &batch.wars, false)?;
        insert_all(&tx, &batch.war_dates, false)?;
        insert_all(&tx, &batch.participants, false)?;
        insert_all(&tx, &batch.participant_dates, false)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!(wars, "stored COW war data v3");
    Ok(())
  }

  async fn add_disputes(&self, batch: DisputeBatch) -> Result<()> {
    let mid_links: Vec<_> = batch.mid_links().collect();
    let war_links: Vec<_> = batch.war_links().collect();
    let disputes = batch.disputes.len();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_all(&tx, &batch.disputes, false)?;
        insert_all(&tx, &mid_links, false)?;
        insert_all(&tx, &war_links, false)?;
        insert_all(&tx, &batch.participants, false)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!(disputes, "stored MIDs");
    Ok(())
  }

  async fn add_contiguity(&self, rows: Vec<Contiguity>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_all(&tx, &rows, false)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_factors(&self, entries: Vec<FactorEntry>) -> Result<()> {
    let tables: BTreeSet<String> = entries.iter().map(|e| e.table.clone()).collect();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for table in &tables {
          tx.execute("DELETE FROM factors WHERE tbl = ?1", rusqlite::params![table])?;
        }
        insert_all(&tx, &entries, false)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn unload(&self, dataset: Dataset) -> Result<()> {
    let system = match dataset {
      Dataset::CowStates => Some(encode_system(CodingSystem::Cow)),
      Dataset::KsgStates => Some(encode_system(CodingSystem::Ksg)),
      _ => None,
    };
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        for table in dataset.tables() {
          removed += tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        if let Some(system) = system {
          for table in Dataset::SHARED.iter().copied().chain([SystemYear::TABLE]) {
            removed += tx.execute(&format!("DELETE FROM {table} WHERE system = ?1"), rusqlite::params![system])?;
          }
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;
    debug!(%dataset, removed, "unloaded dataset");
    Ok(())
  }

  // ── State system reads ────────────────────────────────────────────────────

  async fn states(&self, system: CodingSystem) -> Result<Vec<State>> {
    let system = encode_system(system);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("{} WHERE system = ?1 ORDER BY code", RawState::SELECT))?;
        let rows = stmt
          .query_map(rusqlite::params![system], RawState::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawState::into_state).collect()
  }

  async fn memberships(&self, system: CodingSystem) -> Result<Vec<MembershipInterval>> {
    let system = encode_system(system);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("{} WHERE system = ?1 ORDER BY rowid", RawMembership::SELECT))?;
        let rows = stmt
          .query_map(rusqlite::params![system], RawMembership::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMembership::into_membership).collect()
  }

  async fn replace_system_years(&self, system: CodingSystem, years: Vec<SystemYear>) -> Result<usize> {
    let system = encode_system(system);
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM system_years WHERE system = ?1", rusqlite::params![system])?;
        let written = insert_all(&tx, &years, false)?;
        tx.commit()?;
        Ok(written)
      })
      .await?;
    Ok(written)
  }

  // ── Cross-system links ────────────────────────────────────────────────────

  async fn replace_links(&self, links: Vec<CrossSystemLink>, year_links: Vec<YearLink>) -> Result<(usize, usize)> {
    for link in &links {
      link.validate()?;
    }
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM ksg_to_cow_year", [])?;
        tx.execute("DELETE FROM ksg_to_cow", [])?;
        let links = insert_all(&tx, &links, true)?;
        let years = insert_all(&tx, &year_links, false)?;
        tx.commit()?;
        Ok((links, years))
      })
      .await?;
    debug!(links = written.0, year_links = written.1, "replaced links");
    Ok(written)
  }

  async fn links(&self, filter: &LinkFilter) -> Result<Vec<CrossSystemLink>> {
    let mut out = Vec::new();
    for raw in self.raw_links().await? {
      let link = raw.into_link()?;
      if filter.matches(&link) {
        out.push(link);
      }
    }
    Ok(out)
  }

  async fn year_links(&self, filter: &LinkFilter) -> Result<Vec<YearLink>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{SELECT_YEAR_LINKS} ORDER BY year, cow_ccode, ksg_ccode"))?;
        let rows = stmt
          .query_map([], year_link_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows.into_iter().filter(|y| filter.matches_year(y)).collect())
  }

  // ── Runs ──────────────────────────────────────────────────────────────────

  async fn record_run(&self, report: &ReconcileReport) -> Result<()> {
    let run_id = report.run_id.hyphenated().to_string();
    let finished_at = report.finished_at.to_rfc3339();
    let json = serde_json::to_string(report)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO load_runs (run_id, finished_at, report) VALUES (?1, ?2, ?3)",
          rusqlite::params![run_id, finished_at, json],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn runs(&self, limit: usize) -> Result<Vec<ReconcileReport>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let reports: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT report FROM load_runs ORDER BY finished_at DESC, rowid DESC LIMIT ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    let reports = reports
      .iter()
      .map(|json| serde_json::from_str(json))
      .collect::<serde_json::Result<Vec<ReconcileReport>>>()?;
    Ok(reports)
  }
}
