use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::filters::DEFAULT_PAGE_SIZE;

pub const DEFAULT_CONFIG_FILE: &str = "segdash.toml";
pub const DEFAULT_DATA_FILE: &str = "top_kpis.csv";
pub const DEFAULT_NARRATIVE_FILE: &str = "cluster_interpretations.txt";

pub const ENV_DATA_PATH: &str = "SEGDASH_DATA_PATH";
pub const ENV_NARRATIVE_PATH: &str = "SEGDASH_NARRATIVE_PATH";
pub const ENV_PAGE_SIZE: &str = "SEGDASH_PAGE_SIZE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub narrative_path: PathBuf,
    pub page_size: usize,
    pub top_n: Option<usize>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            narrative_path: PathBuf::from(DEFAULT_NARRATIVE_FILE),
            page_size: DEFAULT_PAGE_SIZE,
            top_n: None,
        }
    }
}

impl DashboardConfig {
    /// Config file (explicit path, else `segdash.toml` if present, else
    /// defaults), then `.env` / process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATA_PATH).filter(|v| !v.trim().is_empty()) {
            self.data_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_NARRATIVE_PATH).filter(|v| !v.trim().is_empty()) {
            self.narrative_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            self.page_size = raw.trim().parse().map_err(|err| ConfigError::Invalid {
                name: ENV_PAGE_SIZE,
                message: format!("'{raw}': {err}"),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "page_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.top_n == Some(0) {
            return Err(ConfigError::Invalid {
                name: "top_n",
                message: "must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }

    pub fn page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_size).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn top_n(&self) -> Option<NonZeroUsize> {
        self.top_n.and_then(NonZeroUsize::new)
    }
}
