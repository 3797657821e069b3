// Env / printenv: one implementation dispatching on argv[0].

use crate::builtins::common::write_line;
use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::Result;

pub struct EnvCommand;

impl EntryPoint for EnvCommand {
    fn run(&self, argv: &[String], ctx: &mut ExecContext) -> Result<i32> {
        let as_printenv = argv[0] == "printenv";

        if as_printenv && argv.len() > 1 {
            let mut missing = false;
            for name in argv[1..].to_vec() {
                match ctx.env.get(&name).cloned() {
                    Some(value) => write_line(ctx, &value)?,
                    None => missing = true,
                }
            }
            return Ok(if missing { 1 } else { 0 });
        }

        let mut keys: Vec<String> = ctx.env.keys().cloned().collect();
        keys.sort();
        for key in keys {
            let line = format!("{key}={}", ctx.env[&key]);
            write_line(ctx, &line)?;
        }
        Ok(0)
    }
}
