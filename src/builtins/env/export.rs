// Export command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Result, bail};

pub struct ExportCommand;

impl EntryPoint for ExportCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        if argv.len() < 2 {
            bail!("export: usage: export KEY=VALUE [KEY=VALUE ...]");
        }
        for assignment in &argv[1..] {
            match assignment.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    ctx.env.insert(key.to_string(), value.to_string());
                }
                _ => bail!("export: not a valid assignment: {assignment}"),
            }
        }
        Ok(0)
    }
}
