use crate::cancel::CancelToken;
use crate::error::ExecError;
use crate::sandbox::Sandbox;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

pub type InputHandle = Box<dyn Read + Send>;
pub type OutputHandle = Box<dyn Write + Send>;

/// Per-stage execution state. Owned exclusively by the stage's thread for
/// the lifetime of one command; stages of a pipeline never share one.
///
/// A `None` stream means the stage inherits the caller's terminal.
pub struct ExecContext {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub exit_code: i32,
    pub stdin: Option<InputHandle>,
    pub stdout: Option<OutputHandle>,
    pub stderr: Option<OutputHandle>,
    pub sandbox: Arc<Sandbox>,
    pub cancel: CancelToken,
}

impl ExecContext {
    pub fn new(sandbox: Arc<Sandbox>, cancel: CancelToken) -> Self {
        let cwd = sandbox
            .root()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            cwd,
            env: std::env::vars().collect(),
            exit_code: 0,
            stdin: None,
            stdout: None,
            stderr: None,
            sandbox,
            cancel,
        }
    }

    /// Fresh context for one pipeline stage: same cwd/env snapshot, no
    /// streams bound yet. The coordinator binds them before spawning.
    pub fn for_stage(&self) -> Self {
        Self {
            cwd: self.cwd.clone(),
            env: self.env.clone(),
            exit_code: self.exit_code,
            stdin: None,
            stdout: None,
            stderr: None,
            sandbox: self.sandbox.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Sandbox-checked path resolution against this context's cwd. Every
    /// path argument a command touches goes through here.
    pub fn resolve(&self, candidate: &str) -> Result<PathBuf, ExecError> {
        self.sandbox.resolve(candidate, &self.cwd)
    }
}

/// Conventional environment defaults, applied only where a variable is
/// not already set.
pub fn default_environment(env: &mut HashMap<String, String>) {
    let tmp = std::env::temp_dir().to_string_lossy().into_owned();
    let defaults = [
        ("PATH", "/bin:/usr/bin".to_string()),
        ("HOME", "/".to_string()),
        ("TMPDIR", tmp),
        ("TERM", "xterm".to_string()),
    ];
    for (key, val) in defaults {
        env.entry(key.to_string()).or_insert(val);
    }
}
