#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("allocating shared observation arena at {path:?}: {source}")]
    ArenaAlloc {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mapping shared observation arena at {path:?}: {source}")]
    ArenaMap {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] harness_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
