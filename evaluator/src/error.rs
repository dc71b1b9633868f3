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

    #[error("identifier {0:?} is not a safe SQL identifier")]
    UnsafeIdentifier(String),

    #[error(transparent)]
    Tracker(#[from] harness_types::Error),

    #[error(transparent)]
    Query(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
