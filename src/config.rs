use anyhow::{Context, Result};
use colored::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct CoveConfig {
    pub sandbox: Option<SandboxConfig>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SandboxConfig {
    pub root: Option<PathBuf>,
}

/// Loads `cove.toml` from `dir` if present, then layers `.env` on top of
/// its `[env]` table. A missing config file is not an error; sessions
/// run unconfined with the process environment.
pub fn load_config(dir: &Path) -> Result<CoveConfig> {
    let config_path = dir.join("cove.toml");
    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).context("Failed to read cove.toml")?;
        toml::from_str(&content).context("Failed to parse cove.toml")?
    } else {
        CoveConfig::default()
    };

    // Resolve a relative sandbox root against the config's directory.
    if let Some(sandbox) = &mut config.sandbox {
        if let Some(root) = &mut sandbox.root {
            if root.is_relative() {
                let rel = std::mem::take(root);
                *root = dir.join(rel);
            }
        }
    }

    // Load .env using dotenvy (Override Layer)
    let env_filename = env::var("COVE_ENV")
        .map(|v| format!(".env.{v}"))
        .unwrap_or_else(|_| ".env".to_string());
    let env_path = dir.join(&env_filename);

    if env_path.exists() {
        eprintln!("{} Loading environment from: {}", "🌿".green(), env_filename.bold());
        for item in dotenvy::from_path_iter(&env_path)? {
            let (key, val) = item?;
            // .env overrides cove.toml
            config.env.insert(key, val);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cove-config-{name}"));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_config_yields_defaults() {
        let dir = scratch("missing");
        let config = load_config(&dir).unwrap();
        assert!(config.sandbox.is_none());
        assert!(config.env.is_empty());
    }

    #[test]
    fn env_file_overrides_config_table() {
        let dir = scratch("layering");
        fs::write(
            dir.join("cove.toml"),
            "[env]\nMODE = \"from-toml\"\nKEPT = \"yes\"\n",
        )
        .unwrap();
        fs::write(dir.join(".env"), "MODE=from-dotenv\n").unwrap();

        let config = load_config(&dir).unwrap();
        assert_eq!(config.env.get("MODE").map(String::as_str), Some("from-dotenv"));
        assert_eq!(config.env.get("KEPT").map(String::as_str), Some("yes"));
    }

    #[test]
    fn relative_sandbox_root_resolves_against_dir() {
        let dir = scratch("root");
        fs::write(dir.join("cove.toml"), "[sandbox]\nroot = \"jail\"\n").unwrap();

        let config = load_config(&dir).unwrap();
        let root = config.sandbox.unwrap().root.unwrap();
        assert_eq!(root, dir.join("jail"));
    }
}
