use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("Invalid command line '{0}'")]
    InvalidCommand(String),

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnFailed { command: String, source: std::io::Error },

    /// `code` is -1 when the process was terminated by a signal
    #[error("`{command}` exited with code {code}: {stderr}")]
    CommandFailed { command: String, code: i32, stderr: String },

    #[error("Expected output {} was not produced", path.display())]
    MissingOutput { path: PathBuf },

    #[error("Invalid compiler output: {0}")]
    InvalidCompilerOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
