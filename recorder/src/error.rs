#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("creating recording directory {path:?}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {path:?}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding frame {1} as JPEG: {0}")]
    Encode(#[source] image::ImageError, u64),
}

pub type Result<T> = std::result::Result<T, Error>;
