#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connecting to postgres at {host}:{port}/{dbname}: {source}")]
    Connect {
        host: String,
        port: u16,
        dbname: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("creating table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Decode(#[from] harness_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
