use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] verdant_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Cannot read photo file: {0}")]
    PhotoUnreadable(String),
    #[error("Refusing to clear the local store without --yes")]
    ClearNotConfirmed,
    #[error("Configuration error: {0}")]
    Config(String),
}
