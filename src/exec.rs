use crate::context::ExecContext;
use crate::error::ExecError;
use crate::registry::CommandDescriptor;
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_PANIC: i32 = 101;
pub const EXIT_NOT_FOUND: i32 = 127;
pub const EXIT_INTERRUPTED: i32 = 130;
pub const EXIT_BROKEN_PIPE: i32 = 141;

/// What a stage leaves behind for the session: its exit code and, if the
/// thread finished cleanly, the cwd/env it ended with (so `cd`/`export`
/// can be adopted by the caller).
pub struct StageResult {
    pub code: i32,
    pub state: Option<SessionState>,
}

pub struct SessionState {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
}

pub struct StageHandle {
    name: String,
    thread: JoinHandle<StageResult>,
}

/// Launches one command on its own thread. The context moves into the
/// thread; nothing about the stage is observable by siblings except
/// through the streams bound to it.
pub fn spawn(
    descriptor: Arc<CommandDescriptor>,
    argv: Vec<String>,
    mut ctx: ExecContext,
) -> io::Result<StageHandle> {
    let name = argv.first().cloned().unwrap_or_else(|| descriptor.name.clone());
    let thread_name = name.clone();

    let thread = thread::Builder::new()
        .name(format!("stage-{thread_name}"))
        .spawn(move || {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| descriptor.entry.run(&argv, &mut ctx)));

            let code = match outcome {
                Ok(Ok(code)) => code,
                Ok(Err(err)) => report_failure(&mut ctx, &argv[0], err),
                Err(_) => {
                    warn!("entry point for '{}' panicked", argv[0]);
                    write_stage_error(&mut ctx, &format!("{}: entry point panicked", argv[0]));
                    EXIT_PANIC
                }
            };
            debug!("stage '{}' finished with code {}", argv[0], code);

            // Close the stage's pipe ends before the caller joins, so the
            // neighbor sees EOF / broken pipe promptly.
            ctx.stdin = None;
            ctx.stdout = None;
            ctx.stderr = None;

            StageResult {
                code,
                state: Some(SessionState {
                    cwd: ctx.cwd,
                    env: ctx.env,
                }),
            }
        })?;

    Ok(StageHandle { name, thread })
}

impl StageHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks until the stage finishes. The guard inside the thread means
    /// a join error is unreachable in practice; it is still mapped to a
    /// panic result rather than propagated.
    pub fn join(self) -> StageResult {
        self.thread.join().unwrap_or(StageResult {
            code: EXIT_PANIC,
            state: None,
        })
    }
}

/// Maps an entry-point error onto a conventional exit code, writing the
/// message to the stage's stderr. Broken pipe and cancellation are normal
/// early-exit conditions and stay quiet.
fn report_failure(ctx: &mut ExecContext, name: &str, err: anyhow::Error) -> i32 {
    if let Some(ioe) = err.downcast_ref::<io::Error>() {
        match ioe.kind() {
            io::ErrorKind::BrokenPipe => return EXIT_BROKEN_PIPE,
            io::ErrorKind::Interrupted => return EXIT_INTERRUPTED,
            _ => {}
        }
    }
    if let Some(exec_err) = err.downcast_ref::<ExecError>() {
        match exec_err {
            ExecError::Interrupted => return EXIT_INTERRUPTED,
            ExecError::StreamClosed => return EXIT_BROKEN_PIPE,
            ExecError::Io(ioe) if ioe.kind() == io::ErrorKind::BrokenPipe => {
                return EXIT_BROKEN_PIPE;
            }
            ExecError::Io(ioe) if ioe.kind() == io::ErrorKind::Interrupted => {
                return EXIT_INTERRUPTED;
            }
            _ => {}
        }
    }

    write_stage_error(ctx, &format!("{name}: {err:#}"));
    EXIT_FAILURE
}

fn write_stage_error(ctx: &mut ExecContext, msg: &str) {
    match &mut ctx.stderr {
        Some(err) => {
            let _ = writeln!(err, "cove: {msg}");
        }
        None => eprintln!("cove: {msg}"),
    }
}
