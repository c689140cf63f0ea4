//! Error type for the Classmark CLI.

use std::io;

use thiserror::Error;

use classmark::ClassmarkError;

use crate::{config::ConfigError, script::ScriptError};

/// Everything that can stop a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Classmark(#[from] ClassmarkError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A session script failed to parse or replay. Carries the script source
    /// so diagnostics can point into it.
    #[error("{err}")]
    Script { err: ScriptError, src: String },
}

impl CliError {
    /// Create a new `Script` error with the associated script source.
    pub fn new_script_error(err: ScriptError, src: impl Into<String>) -> Self {
        Self::Script {
            err,
            src: src.into(),
        }
    }
}
