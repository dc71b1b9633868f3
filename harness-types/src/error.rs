/// Errors shared by every crate that decodes, encodes, or validates the
/// telemetry wire format and schema.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("state payload is {got} bytes, schema expects {expected}")]
    SchemaMismatch { expected: usize, got: usize },

    #[error("field \"{0}\" is not valid UTF-8")]
    NonUtf8Field(String),

    #[error("unknown tracker kind \"{0}\"")]
    UnknownTrackerKind(String),

    #[error("identifier \"{0}\" is not safe to interpolate into SQL")]
    UnsafeIdentifier(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
