// Mkdir command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Context, Result};
use std::fs;

pub struct MkdirCommand;

impl EntryPoint for MkdirCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let mut parents = false;
        let mut paths = Vec::new();

        // Skip command name
        for arg in &argv[1..] {
            if arg == "-p" {
                parents = true;
            } else if arg.starts_with('-') {
                // Ignore other flags
            } else {
                paths.push(arg);
            }
        }

        for path_str in paths {
            let p = ctx.resolve(path_str)?;
            if parents {
                fs::create_dir_all(&p)
                    .with_context(|| format!("Failed to create directory (with parents): {path_str}"))?;
            } else {
                fs::create_dir(&p)
                    .with_context(|| format!("Failed to create directory: {path_str}"))?;
            }
        }
        Ok(0)
    }
}
