// Echo command

use crate::builtins::common::{write_line, write_text};
use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::Result;

pub struct EchoCommand;

impl EntryPoint for EchoCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let mut newline = true;
        let mut start = 1;
        if argv.get(1).map(String::as_str) == Some("-n") {
            newline = false;
            start = 2;
        }

        let output = argv[start.min(argv.len())..].join(" ");
        if newline {
            write_line(ctx, &output)?;
        } else {
            write_text(ctx, &output)?;
        }
        Ok(0)
    }
}
