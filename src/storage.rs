// SQLite storage for sleep nights
//
// The `sleep_night` table is the single source of truth; the TUI never
// mutates its own list directly. Writes go through NightStore, and the
// watcher task turns table changes into full snapshots delivered over a
// channel - the "external data source" the list adapter consumes.
//
//   key press ──▶ NightStore (INSERT/UPDATE/DELETE)
//                      │
//   watcher ──poll──▶ snapshot ──hash gate──▶ mpsc ──▶ adapter.submit()
//
// Connections come from an r2d2 pool so the watcher's blocking reads and
// the TUI's writes never contend on a single handle. WAL mode keeps
// readers unblocked during writes.

use crate::model::SleepNight;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

type Pool = r2d2::Pool<SqliteConnectionManager>;

/// Handle to the sleep night database. Cheap to clone (shares the pool).
#[derive(Clone)]
pub struct NightStore {
    pool: Pool,
}

impl NightStore {
    /// Open (creating if necessary) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = r2d2::Pool::builder()
            .max_size(4)
            .build(manager)
            .context("Failed to create connection pool")?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database for tests. Pool size 1: every pooled handle to
    /// `:memory:` would otherwise be its own separate database.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA busy_timeout=5000;

            CREATE TABLE IF NOT EXISTS sleep_night (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time_milli INTEGER NOT NULL,
                end_time_milli INTEGER NOT NULL,
                quality INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .context("Failed to initialize sleep_night schema")?;
        Ok(())
    }

    /// Load the full snapshot, newest night first
    pub fn snapshot(&self) -> Result<Vec<SleepNight>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, start_time_milli, end_time_milli, quality
             FROM sleep_night ORDER BY id DESC",
        )?;
        let nights = stmt
            .query_map([], |row| {
                Ok(SleepNight::from_millis(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get::<_, i64>(3)?.clamp(0, 5) as u8,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(nights)
    }

    /// The night still being tracked, if any (end time == start time)
    pub fn current_night(&self) -> Result<Option<SleepNight>> {
        Ok(self.snapshot()?.into_iter().find(|n| n.in_progress()))
    }

    /// Begin tracking a new night at `now`. Returns the new night's id.
    pub fn start_night(&self, now: DateTime<Utc>) -> Result<i64> {
        let conn = self.pool.get()?;
        let millis = now.timestamp_millis();
        conn.execute(
            "INSERT INTO sleep_night (start_time_milli, end_time_milli, quality)
             VALUES (?1, ?1, 0)",
            params![millis],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Stop tracking night `id` at `now`
    pub fn stop_night(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE sleep_night SET end_time_milli = ?1 WHERE id = ?2",
            params![now.timestamp_millis(), id],
        )?;
        Ok(())
    }

    /// Set the quality rating for night `id`
    pub fn set_quality(&self, id: i64, quality: u8) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE sleep_night SET quality = ?1 WHERE id = ?2",
            params![quality as i64, id],
        )?;
        Ok(())
    }

    /// Look up one night by id
    pub fn night(&self, id: i64) -> Result<Option<SleepNight>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, start_time_milli, end_time_milli, quality
             FROM sleep_night WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(SleepNight::from_millis(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get::<_, i64>(3)?.clamp(0, 5) as u8,
            ))
        })?;
        Ok(rows.next().transpose()?)
    }

    /// Delete one night
    pub fn delete_night(&self, id: i64) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM sleep_night WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Delete every night
    pub fn clear(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM sleep_night", [])?;
        Ok(())
    }

    /// Insert a fully formed night (demo seeding)
    pub fn insert_night(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        quality: u8,
    ) -> Result<i64> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO sleep_night (start_time_milli, end_time_milli, quality)
             VALUES (?1, ?2, ?3)",
            params![
                start.timestamp_millis(),
                end.timestamp_millis(),
                quality as i64
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// Fingerprint a snapshot so the watcher only forwards real changes.
/// Any attribute change on any night changes the hash.
pub fn snapshot_fingerprint(nights: &[SleepNight]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for night in nights {
        hasher.update(night.id.to_le_bytes());
        hasher.update(night.start_time.timestamp_millis().to_le_bytes());
        hasher.update(night.end_time.timestamp_millis().to_le_bytes());
        hasher.update([night.quality]);
    }
    hasher.finalize().into()
}

/// Poll the database and deliver snapshots whenever content changes.
///
/// The first poll always delivers (the TUI starts with no data). Reads
/// run on the blocking pool; rusqlite is synchronous and must not stall
/// the async runtime. Exits when the receiving side is dropped.
pub async fn run_watcher(
    store: NightStore,
    poll_interval: Duration,
    snapshot_tx: mpsc::Sender<Vec<SleepNight>>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    let mut last_fingerprint: Option<[u8; 32]> = None;

    loop {
        ticker.tick().await;

        let reader = store.clone();
        let nights = match tokio::task::spawn_blocking(move || reader.snapshot()).await {
            Ok(Ok(nights)) => nights,
            Ok(Err(e)) => {
                tracing::error!("Snapshot read failed: {:?}", e);
                continue;
            }
            Err(e) => {
                tracing::error!("Snapshot task panicked: {:?}", e);
                continue;
            }
        };

        let fingerprint = snapshot_fingerprint(&nights);
        if last_fingerprint == Some(fingerprint) {
            continue; // Nothing changed; don't wake the adapter
        }
        last_fingerprint = Some(fingerprint);

        tracing::debug!(nights = nights.len(), "delivering snapshot");
        if snapshot_tx.send(nights).await.is_err() {
            // TUI is gone; stop polling
            return;
        }
    }
}
