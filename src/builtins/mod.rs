pub mod env;
pub mod fs;
pub mod io;
pub mod sys;

pub mod common; // Private helpers

use crate::registry::{EntryPoint, Registry};
use std::sync::Arc;

/// Registers the default command set on a fresh registry. Shared groups
/// (`env`/`printenv`, `ls`/`dir`) are single implementations dispatching
/// on `argv[0]`.
pub fn register_defaults(registry: &Registry) {
    let add = |name: &str, entry: Arc<dyn EntryPoint>, group: Option<&str>| {
        registry
            .register(name, entry, group)
            .expect("default command registered twice");
    };

    // IO
    add("echo", Arc::new(io::echo::EchoCommand), None);
    add("cat", Arc::new(io::cat::CatCommand), None);
    add("wc", Arc::new(io::wc::WcCommand), None);

    // Env/Navigation
    add("cd", Arc::new(env::cd::CdCommand), None);
    add("pwd", Arc::new(env::pwd::PwdCommand), None);
    add("export", Arc::new(env::export::ExportCommand), None);
    let vars: Arc<dyn EntryPoint> = Arc::new(env::vars::EnvCommand);
    add("env", vars.clone(), Some("env"));
    add("printenv", vars, Some("env"));

    // FS commands
    let ls: Arc<dyn EntryPoint> = Arc::new(fs::ls::LsCommand);
    add("ls", ls.clone(), Some("ls"));
    add("dir", ls, Some("ls"));
    add("mkdir", Arc::new(fs::mkdir::MkdirCommand), None);
    add("rm", Arc::new(fs::rm::RmCommand), None);
    add("cp", Arc::new(fs::cp::CpCommand), None);
    add("mv", Arc::new(fs::mv::MvCommand), None);

    // Status/timing
    add("true", Arc::new(sys::status::TrueCommand), None);
    add("false", Arc::new(sys::status::FalseCommand), None);
    add("sleep", Arc::new(sys::sleep::SleepCommand), None);
}
