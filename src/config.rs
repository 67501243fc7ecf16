//! Runtime configuration resolved from CLI flags and environment.
//!
//! Database path: `--db` / `MAESTRO_DB`, falling back to
//! `$HOME/.maestro/maestro.db`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::render::GlyphStyle;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub glyphs: GlyphStyle,
    pub poll_interval: Duration,
}

impl Config {
    pub fn resolve(cli_db: Option<String>, ascii: bool) -> Result<Self> {
        let db_path = match cli_db {
            Some(p) => PathBuf::from(p),
            None => default_db_path()?,
        };
        Ok(Self {
            db_path,
            glyphs: if ascii {
                GlyphStyle::Ascii
            } else {
                GlyphStyle::Unicode
            },
            poll_interval: Duration::from_millis(1000),
        })
    }

    pub fn with_poll_interval(mut self, millis: u64) -> Self {
        self.poll_interval = Duration::from_millis(millis);
        self
    }

    /// Create the database's parent directory if it doesn't exist yet.
    pub fn ensure_db_dir(&self) -> Result<()> {
        ensure_parent_dir(&self.db_path)
    }
}

fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".maestro").join("maestro.db"))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}
