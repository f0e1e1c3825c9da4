//! Application configuration management.
//!
//! Configuration is stored at `~/.config/quizcache/config.json`. Environment
//! variables (optionally from a `.env` file) override the stored endpoints
//! and class.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::assistant::DEFAULT_ASSISTANT_URL;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "quizcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "QUIZCACHE_API_URL";
pub const ENV_ASSISTANT_URL: &str = "QUIZCACHE_ASSISTANT_URL";
pub const ENV_CLASS: &str = "QUIZCACHE_CLASS";

/// A subject offered in the picker: backend key plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub key: String,
    pub label: String,
}

impl Subject {
    fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

fn default_subjects() -> Vec<Subject> {
    vec![
        Subject::new("bangla", "Bangla"),
        Subject::new("english", "English"),
        Subject::new("math", "Mathematics"),
        Subject::new("ict", "ICT"),
        Subject::new("physics", "Physics"),
        Subject::new("chemistry", "Chemistry"),
        Subject::new("biology", "Biology"),
        Subject::new("baobi", "BGS"),
        Subject::new("computer", "Computer"),
        Subject::new("electrical", "Electrical"),
        Subject::new("rac", "RAC"),
        Subject::new("automobile", "Automobile"),
        Subject::new("dhormo", "Religion"),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub assistant_url: String,
    pub class_name: String,
    /// Last selected subject key.
    pub subject: String,
    pub subjects: Vec<Subject>,
    /// When true, loads are served from the cache only.
    pub offline_mode: bool,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            assistant_url: DEFAULT_ASSISTANT_URL.to_string(),
            class_name: "nine".to_string(),
            subject: "bangla".to_string(),
            subjects: default_subjects(),
            offline_mode: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = get(ENV_ASSISTANT_URL) {
            self.assistant_url = url;
        }
        if let Some(class_name) = get(ENV_CLASS) {
            self.class_name = class_name;
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory holding the cached question sets.
    pub fn questions_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("questions"))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("logs"))
    }

    /// Display label for a subject key, falling back to the key itself.
    pub fn subject_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.subjects
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.label.as_str())
            .unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.class_name, "nine");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.offline_mode);
        assert_eq!(config.subject_label("math"), "Mathematics");
        assert_eq!(config.subject_label("geography"), "geography");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"class_name": "ten", "offline_mode": true}"#).unwrap();
        assert_eq!(config.class_name, "ten");
        assert!(config.offline_mode);
        assert_eq!(config.subject, "bangla");
        assert_eq!(config.subjects.len(), 13);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            ENV_API_URL => Some("http://bank.local".to_string()),
            ENV_CLASS => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://bank.local");
        assert_eq!(config.class_name, "nine");
        assert_eq!(config.assistant_url, DEFAULT_ASSISTANT_URL);
    }
}
