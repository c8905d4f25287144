use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_IMAGE_DIR: &str = "./img";
pub const DEFAULT_INPUT_IMAGE: &str = "test.jpg";
pub const DEFAULT_WATERMARK_IMAGE: &str = "logo.png";
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_FONT_SIZE: f32 = 32.0;
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    ConfigDirUnavailable,
    #[error("failed to read or write configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize configuration: {0}")]
    Deserialize(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that input images, watermark images and outputs live in.
    pub image_dir: String,
    pub default_input: String,
    pub default_watermark: String,
    /// TrueType/OpenType font for text watermarks. Empty means the bundled
    /// DejaVu Sans.
    pub font_path: String,
    pub font_size: f32,
    pub text_color: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: DEFAULT_IMAGE_DIR.to_string(),
            default_input: DEFAULT_INPUT_IMAGE.to_string(),
            default_watermark: DEFAULT_WATERMARK_IMAGE.to_string(),
            font_path: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn image_dir(&self) -> PathBuf {
        PathBuf::from(&self.image_dir)
    }

    pub fn font_path(&self) -> Option<PathBuf> {
        let trimmed = self.font_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

/// Loads the inkmark configuration from disk, creating a default file if absent.
pub fn load_or_init() -> Result<LoadOutcome, ConfigError> {
    let path = config_file_path()?;
    load_or_init_at(path)
}

/// Same as [`load_or_init`] but against an explicit file location.
pub fn load_or_init_at(path: PathBuf) -> Result<LoadOutcome, ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(&path)?;
        let config = toml::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(LoadOutcome {
            config,
            path,
            created: false,
        })
    } else {
        let config = Config::default();
        save(&config, &path)?;
        tracing::debug!(path = %path.display(), "wrote default configuration");
        Ok(LoadOutcome {
            config,
            path,
            created: true,
        })
    }
}

/// Persist the given configuration to disk at the provided path.
pub fn save(config: &Config, path: &Path) -> Result<(), ConfigError> {
    ensure_parent_exists(path)?;
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub config: Config,
    pub path: PathBuf,
    pub created: bool,
}

fn ensure_parent_exists(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::ConfigDirUnavailable)?;
    Ok(base_dirs.home_dir().join(".inkmark").join("config.toml"))
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
