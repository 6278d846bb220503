use std::process::ExitCode;

use derive_more::{Display, From};
use translate_bot_model_cache::{BackendError, CacheError};

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Errors that stop the bot from starting or running
#[derive(Debug, From, Display)]
pub enum Error {
    #[from]
    Config(ConfigError),

    #[from]
    Cache(CacheError),

    #[from]
    Backend(BackendError),

    #[from]
    Transport(TransportError),
}

impl std::error::Error for Error {}

impl Error {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}
