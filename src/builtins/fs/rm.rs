// Rm command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Context, Result, bail};
use std::fs;

pub struct RmCommand;

impl EntryPoint for RmCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let mut recursive = false;
        let mut force = false;
        let mut paths = Vec::new();

        // Skip command name (argv[0])
        for arg in &argv[1..] {
            if arg.starts_with('-') {
                if arg.contains('r') || arg.contains('R') {
                    recursive = true;
                }
                if arg.contains('f') {
                    force = true;
                }
            } else {
                paths.push(arg);
            }
        }

        for path_str in paths {
            let p = ctx.resolve(path_str)?;
            if !p.exists() {
                if !force {
                    bail!("File not found: {path_str}");
                }
                continue;
            }

            if p.is_dir() {
                if recursive {
                    fs::remove_dir_all(&p)
                        .with_context(|| format!("Failed to remove directory: {path_str}"))?;
                } else {
                    bail!("Cannot remove directory '{path_str}' without -r");
                }
            } else {
                fs::remove_file(&p)
                    .with_context(|| format!("Failed to remove file: {path_str}"))?;
            }
        }
        Ok(0)
    }
}
