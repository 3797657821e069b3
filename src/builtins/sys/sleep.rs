// Sleep command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Context, Result, bail};
use std::time::{Duration, Instant};

pub struct SleepCommand;

impl EntryPoint for SleepCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let Some(arg) = argv.get(1) else {
            bail!("sleep: missing operand");
        };
        let seconds: f64 = arg
            .parse()
            .with_context(|| format!("sleep: invalid interval: {arg}"))?;

        // Waits in short slices so cancellation is honored promptly even
        // though this stage never touches a stream.
        let deadline = Instant::now() + Duration::from_secs_f64(seconds.max(0.0));
        while Instant::now() < deadline {
            ctx.cancel.checkpoint()?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            std::thread::sleep(remaining.min(Duration::from_millis(20)));
        }
        Ok(0)
    }
}
