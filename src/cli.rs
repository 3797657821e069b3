use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cove", version, about = "Cove: Sandboxed In-Process Shell")]
pub struct Cli {
    /// Run a single command line and exit with its status
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,

    /// Confine all path resolution to this directory
    #[arg(short = 's', long = "sandbox")]
    pub sandbox: Option<PathBuf>,

    /// Directory to load cove.toml / .env from (defaults to the cwd)
    #[arg(long = "config-dir")]
    pub config_dir: Option<PathBuf>,

    /// List registered commands and exit
    #[arg(short = 'l', long = "list")]
    pub list: bool,
}
