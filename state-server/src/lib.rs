mod error;
mod reader;
mod server;

pub use error::{Error, Result};
pub use reader::StateReader;
pub use server::{bind, run, spawn_reader_thread, SharedSnapshot};
