#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("shared memory region {path:?} is unavailable: {source}")]
    SharedMemoryUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shared memory region {path:?} is {got} bytes, expected at least {expected}")]
    RegionTooSmall {
        path: std::path::PathBuf,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Types(#[from] harness_types::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
