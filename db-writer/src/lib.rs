//! DatabaseWriter (SPEC_FULL.md §4.8): derives a table schema from
//! [`harness_types::StateSchema`], performs parameterised per-row inserts,
//! and tracks cumulative lap time across wraparounds.

mod error;
mod schema_sql;
mod writer;

pub use error::{Error, Result};
pub use schema_sql::{create_table_sql, insert_row_sql};
pub use writer::DatabaseWriter;
