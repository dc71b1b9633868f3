//! DatabaseWriter (SPEC_FULL.md §4.8): connects once, creates the session
//! table if absent, and inserts one row per observation. Grounded on
//! `original_source/src/aci/metrics/database/state_logger.py`
//! (`DatabaseStateInterface`).

use crate::error::{Error, Result};
use crate::schema_sql::{create_table_sql, insert_row_sql};
use harness_types::{CumulativeTimeTracker, DecodedState, FieldKind, FieldValue, StateDecoder, StateSchema};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::Query;
use sqlx::Postgres;
use tracing::{error, info};

/// Picks the table name: the configured override, or `session` by default.
pub fn resolve_table_name(cfg: &harness_config::PostgresConfig) -> String {
    cfg.table_name.clone().unwrap_or_else(|| "session".to_string())
}

fn field_u64(decoded: &DecodedState, name: &str) -> u64 {
    match decoded.get(name) {
        Some(FieldValue::UnsignedInt(v)) => *v as u64,
        _ => 0,
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    kind: FieldKind,
    value: FieldValue,
) -> Query<'q, Postgres, PgArguments> {
    match (kind, value) {
        (_, FieldValue::Null) => query.bind(Option::<f32>::None),
        (FieldKind::SignedInt, FieldValue::SignedInt(v)) => query.bind(v),
        (FieldKind::UnsignedInt, FieldValue::UnsignedInt(v)) => query.bind(v as i32),
        (FieldKind::Float, FieldValue::Float(v)) => query.bind(v),
        (FieldKind::Text, FieldValue::Text(v)) => query.bind(v),
        // Unreachable given StateDecoder always produces the field's own
        // kind, but bind a harmless NULL rather than panic on a mismatch.
        _ => query.bind(Option::<f32>::None),
    }
}

/// Owns the postgres connection pool, the session table name, the schema
/// used to decode incoming state bytes, and the cumulative-time tracker
/// that survives across inserts (SPEC_FULL.md §8 invariant 4).
pub struct DatabaseWriter {
    pool: PgPool,
    table: String,
    schema: StateSchema,
    cumulative: CumulativeTimeTracker,
    rows_inserted: u64,
}

impl DatabaseWriter {
    pub async fn connect(
        cfg: &harness_config::PostgresConfig,
        schema: StateSchema,
        table: impl Into<String>,
    ) -> Result<Self> {
        let table = table.into();
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            cfg.user, cfg.password, cfg.host, cfg.port, cfg.dbname
        );
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .map_err(|source| Error::Connect {
                host: cfg.host.clone(),
                port: cfg.port,
                dbname: cfg.dbname.clone(),
                source,
            })?;

        let create_sql = create_table_sql(&table, &schema);
        sqlx::query(&create_sql)
            .execute(&pool)
            .await
            .map_err(|source| Error::CreateTable {
                table: table.clone(),
                source,
            })?;
        info!(%table, "session table ready");

        Ok(Self {
            pool,
            table,
            schema,
            cumulative: CumulativeTimeTracker::new(),
            rows_inserted: 0,
        })
    }

    pub fn rows_inserted(&self) -> u64 {
        self.rows_inserted
    }

    /// Decodes `raw_state`, renames/sanitises it, computes `i_total_time`,
    /// and inserts a row. A decode failure or a single-row insert failure is
    /// logged and swallowed: the storage path never crashes on bad content
    /// (SPEC_FULL.md §7 TransientRowError).
    pub async fn insert(&mut self, raw_state: &[u8]) -> Result<()> {
        let mut decoded = match StateDecoder::decode(&self.schema, raw_state) {
            Ok(decoded) => decoded,
            Err(source) => {
                error!(table = %self.table, %source, "dropping row: state decode failed");
                return Ok(());
            }
        };
        decoded.sanitize_for_storage();

        let i_current_time = field_u64(&decoded, "i_current_time");
        let i_last_time = field_u64(&decoded, "i_last_time");
        let i_total_time = self.cumulative.advance(i_current_time, i_last_time) as i64;

        let sql = insert_row_sql(&self.table, &self.schema);
        let mut query = sqlx::query(&sql);
        for field in self.schema.fields() {
            let value = decoded.get(&field.name).cloned().unwrap_or(FieldValue::Null);
            query = bind_value(query, field.kind, value);
        }
        query = query.bind(i_total_time);

        if let Err(source) = query.execute(&self.pool).await {
            error!(table = %self.table, %source, "row insert failed, skipping row");
            return Ok(());
        }
        self.rows_inserted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_table_name_defaults_when_unset() {
        let mut cfg = harness_config::PostgresConfig::default();
        cfg.table_name = None;
        assert_eq!(resolve_table_name(&cfg), "session");

        cfg.table_name = Some("monza_0001".to_string());
        assert_eq!(resolve_table_name(&cfg), "monza_0001");
    }

    #[test]
    fn field_u64_defaults_to_zero_for_missing_or_wrong_kind() {
        let schema = StateSchema::new(vec![harness_types::SchemaField::new(
            "i_current_time",
            FieldKind::UnsignedInt,
            4,
        )]);
        let decoded = StateDecoder::decode(&schema, &42u32.to_le_bytes()).unwrap();
        assert_eq!(field_u64(&decoded, "i_current_time"), 42);
        assert_eq!(field_u64(&decoded, "missing"), 0);
    }
}
