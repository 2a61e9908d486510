//! Config file resolution and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::env::resolve_env_vars;
use crate::schema::StackForgeConfig;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the StackForge config directory.
/// Priority: `STACKFORGE_CONFIG_DIR` env > `~/.stackforge/`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STACKFORGE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".stackforge");
    }
    PathBuf::from(".stackforge")
}

/// Full path to the main config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Load and parse the config, resolving `${ENV_VAR}` references.
///
/// Returns defaults if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<StackForgeConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config file does not exist; using defaults");
        return Ok(StackForgeConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("failed to parse config at: {}", path.display()))?;

    info!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Parse YAML (JSON is a YAML subset) into the typed config, substituting
/// env references before deserialization so `${…}` never reaches consumers.
pub fn parse_config(raw: &str) -> Result<StackForgeConfig> {
    if raw.trim().is_empty() {
        return Ok(StackForgeConfig::default());
    }
    let value: serde_json::Value = serde_yaml::from_str(raw).context("invalid YAML")?;
    let resolved = resolve_env_vars(&value)?;
    let config: StackForgeConfig =
        serde_json::from_value(resolved).context("config does not match schema")?;
    Ok(config)
}
