//! Configuration system

mod settings;

pub use serde::{Serialize, Deserialize};
pub use settings::{ModelProcessorSettings, RuleAsset};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        match ConfigFormat::from_path(path) {
            Some(ConfigFormat::Toml) => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some(ConfigFormat::Ron) => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some(ConfigFormat::Json) => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            None => Err(ConfigError::UnsupportedFormat(path.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = match ConfigFormat::from_path(path) {
            Some(ConfigFormat::Toml) => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some(ConfigFormat::Ron) => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some(ConfigFormat::Json) => {
                serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            None => return Err(ConfigError::UnsupportedFormat(path.to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// File formats understood by [`Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Format for a file path, by extension
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".toml") {
            Some(Self::Toml)
        } else if path.ends_with(".ron") {
            Some(Self::Ron)
        } else if path.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
