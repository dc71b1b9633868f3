#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("capture backend could not open window/display region: {0}")]
    OpenFailed(String),

    #[error("capture source produced no frame this tick")]
    SourceExhausted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
