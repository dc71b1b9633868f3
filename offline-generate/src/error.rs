#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("reading track mesh {path:?}: {source}")]
    ReadMesh {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing track mesh {path:?}: {source}")]
    ParseMesh {
        path: std::path::PathBuf,
        #[source]
        source: obj::ObjError,
    },

    #[error("reading recording directory {path:?}: {source}")]
    ReadRecordingDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("creating output directory {path:?}: {source}")]
    CreateOutputDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reading sample {path:?}: {source}")]
    ReadSample {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copying frame {path:?}: {source}")]
    CopyFrame {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("saving raster {path:?}: {source}")]
    SaveRaster {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Decode(#[from] harness_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
