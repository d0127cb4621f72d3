//! Project configuration store, loaded once at startup and read-only afterwards.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{NotifyError, Result};

/// Delivery settings for one GitLab project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub telegram_bot: String,
    pub telegram_group: String,
    pub telegram_template: String,
    pub gitlab_token: String,
}

/// Shape of a project entry as it appears on disk. Every key is optional here
/// so a missing one can be reported by name instead of as a serde error.
#[derive(Debug, Deserialize)]
struct RawProjectConfig {
    telegram_bot: Option<String>,
    telegram_group: Option<String>,
    telegram_template: Option<String>,
    gitlab_token: Option<String>,
}

impl RawProjectConfig {
    fn validate(self, project: &str) -> Result<ProjectConfig> {
        let require = |value: Option<String>, key: &'static str| {
            value.ok_or_else(|| NotifyError::MissingProjectKey {
                project: project.to_string(),
                key,
            })
        };

        Ok(ProjectConfig {
            telegram_bot: require(self.telegram_bot, "telegram_bot")?,
            telegram_group: require(self.telegram_group, "telegram_group")?,
            telegram_template: require(self.telegram_template, "telegram_template")?,
            gitlab_token: require(self.gitlab_token, "gitlab_token")?,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Project '{project}' not found")]
    ProjectNotFound { project: String },

    #[error("Key 'gitlab_token' is empty for project '{project}'")]
    MissingSecret { project: String },
}

/// Mapping from project name to its [`ProjectConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    projects: HashMap<String, ProjectConfig>,
    source: PathBuf,
}

impl ConfigStore {
    /// Load and parse the configuration file. `.yaml`/`.yml` files are read
    /// as YAML, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NotifyError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let mut store = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        store.source = path.to_path_buf();
        Ok(store)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, RawProjectConfig> = toml::from_str(content)?;
        Self::from_raw(raw)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty YAML document deserializes to unit, not a map
        let raw: Option<HashMap<String, RawProjectConfig>> = serde_yaml::from_str(content)?;
        Self::from_raw(raw.unwrap_or_default())
    }

    fn from_raw(raw: HashMap<String, RawProjectConfig>) -> Result<Self> {
        if raw.is_empty() {
            return Err(NotifyError::ConfigError(
                "No projects defined in configuration".to_string(),
            ));
        }

        let projects = raw
            .into_iter()
            .map(|(name, entry)| entry.validate(&name).map(|cfg| (name, cfg)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self {
            projects,
            source: PathBuf::from("<memory>"),
        })
    }

    /// Returns the settings for `project`, or which part of them is missing.
    pub fn lookup(&self, project: &str) -> std::result::Result<&ProjectConfig, LookupError> {
        let config = self
            .projects
            .get(project)
            .ok_or_else(|| LookupError::ProjectNotFound {
                project: project.to_string(),
            })?;

        if config.gitlab_token.is_empty() {
            return Err(LookupError::MissingSecret {
                project: project.to_string(),
            });
        }

        Ok(config)
    }

    /// Path the store was loaded from, for log messages.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
