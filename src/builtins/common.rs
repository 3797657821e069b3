// Private helpers shared by the builtin commands.

use crate::context::ExecContext;
use std::io::{self, Write};

/// Writes one line to the stage's stdout, falling back to the terminal
/// when no stream is bound.
pub fn write_line(ctx: &mut ExecContext, line: &str) -> io::Result<()> {
    match &mut ctx.stdout {
        Some(out) => writeln!(out, "{line}"),
        None => {
            println!("{line}");
            Ok(())
        }
    }
}

pub fn write_text(ctx: &mut ExecContext, text: &str) -> io::Result<()> {
    match &mut ctx.stdout {
        Some(out) => out.write_all(text.as_bytes()),
        None => io::stdout().write_all(text.as_bytes()),
    }
}
