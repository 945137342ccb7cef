use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Persisted CLI preferences, merged over the core client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

pub async fn load_settings() -> Result<CliSettings> {
    let path = settings_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                let defaults = CliSettings::default();
                save_settings(&defaults).await?;
                warn!(
                    error = ?err,
                    "failed to parse settings.json, resetting to defaults"
                );
                Ok(defaults)
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(CliSettings::default()),
        Err(err) => Err(err).context("failed to read settings.json"),
    }
}

pub async fn save_settings(settings: &CliSettings) -> Result<()> {
    let path = settings_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(settings)?;
    tokio::fs::write(&path, serialized)
        .await
        .with_context(|| format!("failed to write settings.json at {}", path.display()))
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn config_dir() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        base.config_dir().join("mentora")
    } else {
        PathBuf::from(".mentora")
    }
}
