// Cp command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

pub struct CpCommand;

impl EntryPoint for CpCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let mut recursive = false;
        let mut paths = Vec::new();

        // Skip command name
        for arg in &argv[1..] {
            if arg == "-r" || arg == "-R" || arg == "--recursive" {
                recursive = true;
            } else {
                paths.push(arg.clone());
            }
        }

        if paths.len() < 2 {
            bail!("cp requires at least source and destination");
        }

        let dest_str = paths.pop().unwrap();
        let sources = paths;

        let dest_path = ctx.resolve(&dest_str)?;
        let dest_is_dir = dest_path.is_dir();

        if sources.len() > 1 && !dest_is_dir {
            bail!("Target '{dest_str}' is not a directory");
        }

        for src_str in sources {
            let src_path = ctx.resolve(&src_str)?;
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

            if src_path.is_dir() {
                if recursive {
                    copy_dir_recursive(&src_path, &target)?;
                } else {
                    bail!("Omitting directory '{src_str}' (use -r to copy)");
                }
            } else {
                fs::copy(&src_path, &target)
                    .with_context(|| format!("Failed to copy {} to {}", src_str, target.display()))?;
            }
        }

        Ok(0)
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if ty.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
