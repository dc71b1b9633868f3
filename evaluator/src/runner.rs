//! The Evaluator process (SPEC_FULL.md §4.9): every ~500 ms, submits all
//! registered trackers' queries in one transaction bound to the session's
//! current lap, and publishes the results to the log sink. Grounded on
//! `original_source/src/aci/metrics/database/monitor.py`'s `Evaluator`
//! (`pipeline()` batching of tracker queries).

use crate::error::{Error, Result};
use harness_types::Tracker;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{info, warn};

/// One tracker's result for one tick. `value` is `None` when the tracker's
/// interval had no matching rows for the current lap.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerResult {
    pub name: String,
    pub value: Option<f64>,
}

pub struct Evaluator {
    pool: PgPool,
    table: String,
    trackers: Vec<Tracker>,
}

impl Evaluator {
    pub async fn connect(
        cfg: &harness_config::PostgresConfig,
        table: impl Into<String>,
        trackers: Vec<Tracker>,
    ) -> Result<Self> {
        let table = table.into();
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            cfg.user, cfg.password, cfg.host, cfg.port, cfg.dbname
        );
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .map_err(|source| Error::Connect {
                host: cfg.host.clone(),
                port: cfg.port,
                dbname: cfg.dbname.clone(),
                source,
            })?;
        Ok(Self { pool, table, trackers })
    }

    pub fn trackers(&self) -> &[Tracker] {
        &self.trackers
    }

    /// Runs one evaluation tick: fetches the session's current lap, then
    /// every tracker's query bound to it, inside one transaction. Returns
    /// `Ok(None)` when the table has no rows yet (nothing to evaluate).
    pub async fn tick(&self) -> Result<Option<Vec<TrackerResult>>> {
        let mut tx = self.pool.begin().await?;

        let current_lap: Option<i64> = sqlx::query(&format!(
            "SELECT completed_laps FROM {} ORDER BY id DESC LIMIT 1",
            self.table
        ))
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.get::<i32, _>(0) as i64);

        let Some(lap) = current_lap else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut results = Vec::with_capacity(self.trackers.len());
        for tracker in &self.trackers {
            let value: Option<f64> = sqlx::query(tracker.query())
                .bind(lap)
                .fetch_optional(&mut *tx)
                .await?
                .and_then(|row| row.try_get::<Option<f64>, _>(0).ok().flatten());
            results.push(TrackerResult {
                name: tracker.name.clone(),
                value,
            });
        }

        tx.commit().await?;
        Ok(Some(results))
    }

    /// Runs `tick` forever at ~500ms intervals until `running` is cleared.
    /// A transient database error rolls back implicitly (the transaction is
    /// dropped) and is logged; the next tick retries (SPEC_FULL.md §7).
    pub async fn run(&self, running: std::sync::Arc<std::sync::atomic::AtomicBool>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_millis(500));
        while running.load(std::sync::atomic::Ordering::Relaxed) {
            interval.tick().await;
            match self.tick().await {
                Ok(Some(results)) => {
                    for result in &results {
                        info!(tracker = %result.name, value = ?result.value, "evaluated");
                    }
                }
                Ok(None) => {}
                Err(source) => warn!(%source, "evaluation tick failed, retrying next tick"),
            }
        }
    }
}
