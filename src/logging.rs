//! File logging. The terminal belongs to the UI, so events go to
//! `<data dir>/todolist.log` instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::Config;
use crate::error::{Result, TodoError};

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("todolist.log")
}

/// Installs the global subscriber. Call once, before the UI starts.
pub fn init(config: &Config) -> Result<PathBuf> {
    let level = config.log_level()?;
    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)?;

    let path = log_path(&data_dir);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| TodoError::config(format!("logger already installed: {e}")))?;

    tracing::info!(data_dir = %data_dir.display(), "todolist starting");
    Ok(path)
}
