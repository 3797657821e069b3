mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use colored::*;
use cove::Shell;
use cove::config::load_config;
use log::debug;
use std::io::{BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = load_config(&config_dir)?;

    let mut shell = Shell::new();
    shell.initialize_default_environment();
    for (key, value) in &config.env {
        shell.set_env(key, value);
    }

    let root = cli
        .sandbox
        .or_else(|| config.sandbox.and_then(|s| s.root));
    if let Some(root) = root {
        shell
            .set_sandbox_root(&root)
            .with_context(|| format!("Failed to set sandbox root: {}", root.display()))?;
        debug!("confined to {}", root.display());
    }

    if cli.list {
        for name in shell.list_commands() {
            println!("{name}");
        }
        return Ok(());
    }

    // Ctrl-C cancels the running pipeline cooperatively; the session
    // itself stays alive.
    let token = shell.cancel_token();
    ctrlc::set_handler(move || token.cancel()).context("Failed to install signal handler")?;

    if let Some(line) = cli.command {
        let status = run_line(&mut shell, &line);
        std::process::exit(status);
    }

    repl(&mut shell)
}

fn run_line(shell: &mut Shell, line: &str) -> i32 {
    match shell.run(line) {
        Ok(status) => status,
        Err(err) => {
            eprintln!("{} {err:#}", "✗".red());
            1
        }
    }
}

fn repl(shell: &mut Shell) -> Result<()> {
    let stdin = std::io::stdin();
    loop {
        let cwd = shell.cwd().display().to_string();
        eprint!("{} {} ", cwd.cyan(), "❯".bold());
        std::io::stderr().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Leaving the session is a host decision; no entry point ever
        // terminates the process.
        if line == "exit" {
            break;
        }

        let status = run_line(shell, line);
        if status != 0 {
            eprintln!("{}", format!("exit status {status}").red().dimmed());
        }
    }
    Ok(())
}
