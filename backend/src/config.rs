use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::inference::{BackendKind, TensorLayout};

pub const CONFIG_ENV: &str = "FRESHNESS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/freshness.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid value {value:?} for {key}")]
    InvalidOverride { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            frontend_dir: PathBuf::from("frontend/dist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: BackendKind,
    /// Model file, or a `.tar.gz`/`.tgz` archive holding `model_file`.
    pub path: PathBuf,
    /// Where archives are unpacked.
    pub extract_dir: PathBuf,
    /// Name of the model file inside the archive.
    pub model_file: String,
    pub layout: TensorLayout,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::SavedModel,
            path: PathBuf::from("model/model.tar.gz"),
            extract_dir: PathBuf::from("temp_model_folder"),
            model_file: "model.onnx".to_string(),
            layout: TensorLayout::Nhwc,
        }
    }
}

impl AppConfig {
    /// Loads the YAML config named by `FRESHNESS_CONFIG` (or the default path)
    /// and applies environment overrides. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file_or_default(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(config_str)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.server.frontend_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("MODEL_BACKEND") {
            self.model.backend = parse_enum(&backend).ok_or(ConfigError::InvalidOverride {
                key: "MODEL_BACKEND",
                value: backend.clone(),
            })?;
        }
        if let Some(path) = lookup("MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("MODEL_EXTRACT_DIR") {
            self.model.extract_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("MODEL_FILE") {
            self.model.model_file = file;
        }
        if let Some(layout) = lookup("MODEL_LAYOUT") {
            self.model.layout = parse_enum(&layout).ok_or(ConfigError::InvalidOverride {
                key: "MODEL_LAYOUT",
                value: layout.clone(),
            })?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// Enum overrides use the same spelling as the YAML file.
fn parse_enum<T: serde::de::DeserializeOwned>(value: &str) -> Option<T> {
    serde_yaml::from_str(value.trim()).ok()
}
