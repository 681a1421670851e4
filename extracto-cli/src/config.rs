use anyhow::{Context, Result};
use extracto_core::ParserConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_extracto_home, extracto_home};

pub fn default_config_path() -> Result<PathBuf> {
    Ok(extracto_home()?.join("config.toml"))
}

/// `explicit` must exist; the default location falls back to built-in
/// defaults when absent.
pub fn load_config(explicit: Option<&Path>) -> Result<ParserConfig> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = default_config_path()?;
            if !p.exists() {
                return Ok(ParserConfig::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(path: &Path, cfg: &ParserConfig) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(explicit: Option<&Path>) -> Result<()> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => ensure_extracto_home()?.join("config.toml"),
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&p, &ParserConfig::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
