// Cd command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Result, bail};

pub struct CdCommand;

impl EntryPoint for CdCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        // argv[0] is "cd". argv[1] is the target path.
        let target = if argv.len() < 2 {
            ctx.env.get("HOME").cloned().unwrap_or_else(|| "/".to_string())
        } else {
            argv[1].clone()
        };

        // A denied resolution propagates here and leaves cwd untouched.
        // Lexical resolution only: canonicalizing could follow a symlink
        // out of the sandbox root.
        let new_path = ctx.resolve(&target)?;
        if !new_path.is_dir() {
            bail!("cd: no such file or directory: {target}");
        }
        ctx.cwd = new_path;
        Ok(0)
    }
}
