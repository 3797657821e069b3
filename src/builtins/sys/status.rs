// True / false commands

use crate::context::ExecContext;
use crate::registry::EntryPoint;
use anyhow::Result;

pub struct TrueCommand;

impl EntryPoint for TrueCommand {
    fn run(&self, _argv: &[String], _ctx: &mut ExecContext) -> Result<i32> {
        Ok(0)
    }
}

pub struct FalseCommand;

impl EntryPoint for FalseCommand {
    fn run(&self, _argv: &[String], _ctx: &mut ExecContext) -> Result<i32> {
        Ok(1)
    }
}
