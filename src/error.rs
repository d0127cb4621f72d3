use std::io;

/// Startup errors for gitlab_telegram_notify. Any of these stops the process
/// before the listener is bound.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Project '{project}' is missing required key '{key}'")]
    MissingProjectKey { project: String, key: &'static str },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlParseError(#[from] serde_yaml::Error),
}

/// Helper type for Results that use NotifyError
pub type Result<T> = std::result::Result<T, NotifyError>;
