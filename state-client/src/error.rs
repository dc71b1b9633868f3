#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("state-server at {addr} refused the connection: {source}")]
    ServerUnavailable {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
