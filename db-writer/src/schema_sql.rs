//! Builds the `CREATE TABLE` and per-row `INSERT` statements from a
//! [`StateSchema`] (SPEC_FULL.md §4.8, §6 database schema). Grounded on
//! `original_source/src/metrics/database/sql.py`'s `get_create_table_sql`/
//! `get_insert_row_sql`.

use harness_types::{FieldKind, StateSchema};

fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::SignedInt | FieldKind::UnsignedInt => "int4",
        FieldKind::Float => "float4",
        FieldKind::Text => "text",
    }
}

/// One column per schema field (renamed per [`StateSchema::storage_name`]),
/// plus `id SERIAL PRIMARY KEY` and `i_total_time BIGSERIAL` (SPEC_FULL.md
/// §6). `IF NOT EXISTS` makes re-creating an existing table non-fatal, the
/// same behaviour the original writer gets by catching a duplicate-table
/// error.
pub fn create_table_sql(table: &str, schema: &StateSchema) -> String {
    let mut columns = vec!["id SERIAL PRIMARY KEY".to_string()];
    for field in schema.fields() {
        let name = StateSchema::storage_name(&field.name);
        columns.push(format!("{name} {}", sql_type(field.kind)));
    }
    columns.push("i_total_time BIGSERIAL".to_string());
    format!("CREATE TABLE IF NOT EXISTS {table} ({})", columns.join(", "))
}

/// Column order matches [`create_table_sql`] minus `id` (autogenerated):
/// every schema field, storage-renamed, then `i_total_time`.
pub fn insert_row_sql(table: &str, schema: &StateSchema) -> String {
    let mut columns: Vec<&str> = schema
        .fields()
        .iter()
        .map(|f| StateSchema::storage_name(&f.name))
        .collect();
    columns.push("i_total_time");

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_types::SchemaField;

    fn tiny_schema() -> StateSchema {
        StateSchema::new(vec![
            SchemaField::new("current_time", FieldKind::Float, 4),
            SchemaField::new("gear", FieldKind::SignedInt, 4),
            SchemaField::new("tyre_compound", FieldKind::Text, 33),
        ])
    }

    #[test]
    fn create_table_renames_current_time_and_adds_bookkeeping_columns() {
        let sql = create_table_sql("session_0001", &tiny_schema());
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS session_0001"));
        assert!(sql.contains("current_laptime float4"));
        assert!(!sql.contains("current_time "));
        assert!(sql.contains("gear int4"));
        assert!(sql.contains("tyre_compound text"));
        assert!(sql.contains("id SERIAL PRIMARY KEY"));
        assert!(sql.contains("i_total_time BIGSERIAL"));
    }

    #[test]
    fn insert_sql_has_one_placeholder_per_column_plus_total_time() {
        let sql = insert_row_sql("session_0001", &tiny_schema());
        assert!(sql.contains("(current_laptime, gear, tyre_compound, i_total_time)"));
        assert!(sql.contains("($1, $2, $3, $4)"));
    }
}
