// Ls / dir: one implementation dispatching on argv[0].

use crate::builtins::common::write_line;
use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::{Context, Result, bail};
use std::fs;

pub struct LsCommand;

impl EntryPoint for LsCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let mut show_hidden = false;
        let mut targets = Vec::new();
        for arg in &argv[1..] {
            if arg == "-a" || arg == "--all" {
                show_hidden = true;
            } else if arg.starts_with('-') {
                // Ignore other flags
            } else {
                targets.push(arg.clone());
            }
        }
        if targets.is_empty() {
            targets.push(".".to_string());
        }

        for target in &targets {
            let path = ctx.resolve(target)?;
            if !path.exists() {
                bail!("{}: no such file or directory: {target}", argv[0]);
            }
            if path.is_file() {
                write_line(ctx, target)?;
                continue;
            }

            let mut names: Vec<String> = fs::read_dir(&path)
                .with_context(|| format!("cannot read directory: {target}"))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| show_hidden || !name.starts_with('.'))
                .collect();
            names.sort();
            for name in names {
                write_line(ctx, &name)?;
            }
        }
        Ok(0)
    }
}
