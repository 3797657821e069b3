// Wc command

use crate::builtins::common::write_line;
use crate::context::ExecContext;
use crate::registry::EntryPoint;
use crate::stream::Guarded;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read};

pub struct WcCommand;

impl EntryPoint for WcCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let mut lines_only = false;
        let mut words_only = false;
        let mut bytes_only = false;
        let mut files = Vec::new();

        for arg in &argv[1..] {
            match arg.as_str() {
                "-l" => lines_only = true,
                "-w" => words_only = true,
                "-c" => bytes_only = true,
                other => files.push(other.to_string()),
            }
        }

        let mut content = Vec::new();
        if files.is_empty() {
            match ctx.stdin.take() {
                Some(mut input) => {
                    read_guarded(&mut *input, &mut content, ctx)?;
                }
                None => {
                    read_guarded(&mut io::stdin(), &mut content, ctx)?;
                }
            }
        } else {
            let cancel = ctx.cancel.clone();
            for name in &files {
                let path = ctx.resolve(name)?;
                let file = File::open(&path).with_context(|| format!("cannot open: {name}"))?;
                read_guarded(&mut Guarded::new(file, cancel.clone()), &mut content, ctx)?;
            }
        }

        let lines = content.iter().filter(|b| **b == b'\n').count();
        let text = String::from_utf8_lossy(&content);
        let words = text.split_whitespace().count();
        let bytes = content.len();

        let rendered = if lines_only {
            lines.to_string()
        } else if words_only {
            words.to_string()
        } else if bytes_only {
            bytes.to_string()
        } else {
            format!("{lines} {words} {bytes}")
        };
        write_line(ctx, &rendered)?;
        Ok(0)
    }
}

fn read_guarded(source: &mut dyn Read, buf: &mut Vec<u8>, ctx: &ExecContext) -> Result<()> {
    let mut chunk = [0u8; 8192];
    loop {
        ctx.cancel.checkpoint()?;
        let n = source.read(&mut chunk)?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}
