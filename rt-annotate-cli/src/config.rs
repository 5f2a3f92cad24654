//! Configuration loading and parsing

use anyhow::{Context, Result};
use rt_annotate_engine::ProcessConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Annotation file used when none is given on the command line
    pub annotation_file: Option<PathBuf>,
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

/// Which player follows the annotation process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    #[default]
    None,
    Command,
}

/// External player commands
///
/// Each command is an argument vector; an empty vector means "do nothing".
/// `set_time` arguments may contain `{time}` (H:MM:SS.s), `{seconds}` (total
/// seconds), `{hours}` and `{minutes}` (fields of `{time}`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub kind: PlayerKind,
    #[serde(default)]
    pub start: Vec<String>,
    #[serde(default)]
    pub stop: Vec<String>,
    #[serde(default)]
    pub set_time: Vec<String>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.player.kind == PlayerKind::Command
        && config.player.start.is_empty()
        && config.player.stop.is_empty()
        && config.player.set_time.is_empty()
    {
        log::warn!("Command player configured without any command");
    }

    Ok(config)
}
