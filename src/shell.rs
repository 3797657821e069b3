use crate::builtins;
use crate::cancel::CancelToken;
use crate::context::{self, ExecContext, InputHandle, OutputHandle};
use crate::error::ExecError;
use crate::pipeline::{parse_pipeline, run_pipeline};
use crate::registry::{EntryPoint, Registry};
use crate::sandbox::Sandbox;
use crate::stream::CaptureBuffer;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One interactive session: a command registry, a sandbox, a working
/// directory and an environment. Sessions are independent; two of them
/// never observe each other's state.
pub struct Shell {
    registry: Arc<Registry>,
    sandbox: Arc<Sandbox>,
    cancel: CancelToken,
    cwd: PathBuf,
    env: HashMap<String, String>,
    last_status: i32,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// Fresh session with the default command set, a process-environment
    /// snapshot and no confinement.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());
        builtins::register_defaults(&registry);
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            registry,
            sandbox: Arc::new(Sandbox::new()),
            cancel: CancelToken::new(),
            cwd,
            env: std::env::vars().collect(),
            last_status: 0,
        }
    }

    /// Conventional defaults (`PATH`, `HOME`, `TMPDIR`, `TERM`), applied
    /// only where the session does not already have a value.
    pub fn initialize_default_environment(&mut self) {
        context::default_environment(&mut self.env);
    }

    /// Installs the confinement root. The working directory is clamped
    /// into the root so the very next resolution starts inside it.
    pub fn set_sandbox_root(&mut self, path: &Path) -> Result<(), ExecError> {
        self.sandbox.set_root(path)?;
        if let Some(root) = self.sandbox.root() {
            if !self.cwd.starts_with(&root) {
                self.cwd = root;
            }
        }
        Ok(())
    }

    pub fn sandbox_root(&self) -> Option<PathBuf> {
        self.sandbox.root()
    }

    pub fn list_commands(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn is_executable(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn register_command(
        &self,
        name: &str,
        entry: Arc<dyn EntryPoint>,
        group: Option<&str>,
    ) -> Result<(), ExecError> {
        self.registry.register(name, entry, group)
    }

    pub fn replace_command(
        &self,
        name: &str,
        entry: Arc<dyn EntryPoint>,
        all_occurrences: bool,
    ) -> Result<(), ExecError> {
        self.registry.replace(name, entry, all_occurrences)
    }

    /// Token shared by every stage this session launches; wire it to a
    /// signal handler to cancel a running pipeline cooperatively.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn set_env(&mut self, key: &str, value: &str) {
        self.env.insert(key.to_string(), value.to_string());
    }

    /// Exit status of the most recent command line (`$?`).
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Runs a command line against the caller's terminal streams.
    pub fn run(&mut self, line: &str) -> Result<i32, ExecError> {
        self.run_with_streams(line, None, None, None)
    }

    /// Runs a command line, streaming the last stage's output into the
    /// caller-supplied sink.
    pub fn run_with_output(&mut self, line: &str, sink: OutputHandle) -> Result<i32, ExecError> {
        self.run_with_streams(line, None, Some(sink), None)
    }

    /// Runs a command line with stdout captured into memory.
    pub fn run_collect(&mut self, line: &str) -> Result<(i32, String), ExecError> {
        let capture = CaptureBuffer::new();
        let status = self.run_with_streams(line, None, Some(capture.writer()), None)?;
        Ok((status, capture.to_string_lossy()))
    }

    /// Full control over the three external streams. `None` inherits the
    /// terminal. A single-stage command line runs on its own thread like
    /// any pipeline, but its final cwd/env are adopted back into the
    /// session so `cd` and `export` behave as expected; stages of a
    /// multi-stage pipeline are isolated like subshells.
    pub fn run_with_streams(
        &mut self,
        line: &str,
        stdin: Option<InputHandle>,
        stdout: Option<OutputHandle>,
        stderr: Option<OutputHandle>,
    ) -> Result<i32, ExecError> {
        self.cancel.reset();
        let stages = parse_pipeline(line)?;
        if stages.is_empty() {
            return Ok(self.last_status);
        }
        debug!("running {} stage(s): {line}", stages.len());
        let single = stages.len() == 1;

        let mut base = ExecContext::new(self.sandbox.clone(), self.cancel.clone());
        base.cwd = self.cwd.clone();
        base.env = self.env.clone();
        base.exit_code = self.last_status;

        let run = run_pipeline(&self.registry, &base, stages, stdin, stdout, stderr)?;

        if single {
            if let Some(state) = run.session {
                self.cwd = state.cwd;
                self.env = state.env;
            }
        }
        self.last_status = run.status;
        Ok(run.status)
    }
}
