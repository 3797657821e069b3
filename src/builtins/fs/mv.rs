// Mv command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Context, Result, bail};
use std::fs;

pub struct MvCommand;

impl EntryPoint for MvCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let args: Vec<&String> = argv[1..].iter().filter(|a| !a.starts_with('-')).collect();
        if args.len() < 2 {
            bail!("mv requires source and destination");
        }

        let dest_str = args.last().unwrap();
        let sources = &args[..args.len() - 1];

        let dest_path = ctx.resolve(dest_str)?;
        let dest_is_dir = dest_path.is_dir();
        if sources.len() > 1 && !dest_is_dir {
            bail!("Target '{dest_str}' is not a directory");
        }

        for src_str in sources {
            let src_path = ctx.resolve(src_str)?;
            if !src_path.exists() {
                bail!("Source not found: {src_str}");
            }

            let target = if dest_is_dir {
                dest_path.join(
                    src_path
                        .file_name()
                        .ok_or_else(|| anyhow::anyhow!("Invalid source filename"))?,
                )
            } else {
                dest_path.clone()
            };

            fs::rename(&src_path, &target)
                .with_context(|| format!("Failed to move {} to {}", src_str, target.display()))?;
        }
        Ok(0)
    }
}
