mod client;
mod error;

pub use client::StateClient;
pub use error::{Error, Result};
