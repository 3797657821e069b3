// Cat command

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use crate::stream::{Guarded, copy_interruptible};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read, Write};

pub struct CatCommand;

impl EntryPoint for CatCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let cancel = ctx.cancel.clone();
        let files: Vec<String> = argv[1..].iter().filter(|a| !a.starts_with('-')).cloned().collect();

        // Open sources up front so path errors surface before any output.
        let mut sources: Vec<Box<dyn Read + Send>> = Vec::new();
        if files.is_empty() {
            match ctx.stdin.take() {
                Some(input) => sources.push(input),
                None => sources.push(Box::new(io::stdin())),
            }
        } else {
            for name in &files {
                let path = ctx.resolve(name)?;
                let file =
                    File::open(&path).with_context(|| format!("cannot open: {name}"))?;
                sources.push(Box::new(Guarded::new(file, cancel.clone())));
            }
        }

        let mut terminal;
        let out: &mut dyn Write = match ctx.stdout.as_mut() {
            Some(out) => out.as_mut(),
            None => {
                terminal = io::stdout();
                &mut terminal
            }
        };

        for mut source in sources {
            copy_interruptible(&mut *source, out, &cancel)?;
        }
        Ok(0)
    }
}
