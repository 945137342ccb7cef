use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved client configuration: where the platform backend lives and how
/// long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("client configuration invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(detail) => {
                format!("Client not configured—{detail}. Update mentora.yaml.")
            }
        }
    }
}

impl ClientConfig {
    /// Load configuration from the first `mentora.yaml` found in the
    /// candidate chain. An absent file is not an error: the defaults are
    /// enough to talk to a local backend.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = locate_config_file() else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(&path).map_err(|err| {
            ConfigError::Invalid(format!("failed to read {}: {err}", path.display()))
        })?;
        let config: MentoraConfig = serde_yaml::from_str(&contents)
            .map_err(|err| ConfigError::Invalid(format!("invalid mentora.yaml: {err}")))?;
        resolve_client_section(config.client.unwrap_or_default())
    }

    /// `load()` plus environment overrides (`MENTORA_BASE_URL`,
    /// `MENTORA_TIMEOUT_SECS`).
    pub fn from_environment() -> Result<Self, ConfigError> {
        let mut config = Self::load()?;
        if let Ok(value) = std::env::var("MENTORA_BASE_URL") {
            if !value.trim().is_empty() {
                config.base_url = value.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(value) = std::env::var("MENTORA_TIMEOUT_SECS") {
            let parsed = value.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!("MENTORA_TIMEOUT_SECS is not a number: {value}"))
            })?;
            config.timeout_secs = parsed;
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn resolve_client_section(section: ClientSection) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();
    if let Some(base_url) = section.base_url {
        let trimmed = base_url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid(
                "`base_url` in mentora.yaml is empty".to_string(),
            ));
        }
        config.base_url = trimmed;
    }
    if let Some(timeout) = section.timeout_secs {
        if timeout == 0 {
            return Err(ConfigError::Invalid(
                "`timeout_secs` in mentora.yaml must be positive".to_string(),
            ));
        }
        config.timeout_secs = timeout;
    }
    Ok(config)
}

fn locate_config_file() -> Option<PathBuf> {
    mentora_yaml_candidates()
        .into_iter()
        .find(|path| path.exists())
}

fn mentora_yaml_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(base) = BaseDirs::new() {
        let config_dir = base.config_dir().join("mentora");
        paths.push(config_dir.join("mentora.yaml"));
        paths.push(config_dir.join("mentora.yml"));
        let home_dir = base.home_dir();
        paths.push(home_dir.join(".mentora").join("mentora.yaml"));
        paths.push(home_dir.join(".mentora").join("mentora.yml"));
    } else {
        paths.push(PathBuf::from("mentora.yaml"));
        paths.push(PathBuf::from("mentora.yml"));
    }
    paths
}

#[derive(Debug, Deserialize)]
struct MentoraConfig {
    client: Option<ClientSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ClientSection {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}
