use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures scoped to one stage or pipeline. None of these are fatal to
/// the host process.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("path escapes the sandbox root: {}", .0.display())]
    SandboxViolation(PathBuf),

    #[error("command already registered: {0}")]
    RegistrationConflict(String),

    #[error("stream closed by peer")]
    StreamClosed,

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] io::Error),
}
