// Pwd command

use crate::builtins::common::write_line;
use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::Result;

pub struct PwdCommand;

impl EntryPoint for PwdCommand {
    fn run(&self, _argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let cwd = ctx.cwd.to_string_lossy().into_owned();
        write_line(ctx, &cwd)?;
        Ok(0)
    }
}
