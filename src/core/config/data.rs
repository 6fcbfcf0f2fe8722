use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::HistoryMode;
use crate::core::config::io::ConfigError;
use crate::core::suggestions::DEFAULT_SUGGESTIONS;
use crate::utils::url::validate_endpoint;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/chat";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Chat endpoint URL (e.g., "http://localhost:8000/api/chat")
    pub endpoint: Option<String>,
    /// Whether prior turns are sent with each prompt
    pub history: Option<HistoryMode>,
    /// Give up on a reply after this many seconds
    pub timeout_secs: Option<u64>,
    /// Replaces the built-in suggestion shortcuts
    pub suggestions: Option<Vec<String>>,
}

/// One-run overrides, usually from command-line flags.
#[derive(Debug, Default, Clone)]
pub struct SettingsOverrides {
    pub endpoint: Option<String>,
    pub history: Option<HistoryMode>,
    pub timeout_secs: Option<u64>,
}

/// Effective settings a [`crate::core::client::ChatClient`] runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub history: HistoryMode,
    pub timeout: Option<Duration>,
    pub suggestions: Vec<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            history: HistoryMode::default(),
            timeout: None,
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn resolve(&self, overrides: &SettingsOverrides) -> Result<ClientSettings, ConfigError> {
        let endpoint = overrides
            .endpoint
            .as_deref()
            .or(self.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = validate_endpoint(endpoint).map_err(|reason| ConfigError::Invalid {
            key: "endpoint",
            reason,
        })?;

        let timeout = match overrides.timeout_secs.or(self.timeout_secs) {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    key: "timeout",
                    reason: "timeout must be at least one second".to_string(),
                })
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let suggestions = match &self.suggestions {
            Some(list) => list
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => ClientSettings::default().suggestions,
        };

        Ok(ClientSettings {
            endpoint,
            history: overrides.history.or(self.history).unwrap_or_default(),
            timeout,
            suggestions,
        })
    }

    /// Applies `lowkey set <key> <value...>`. Returns a confirmation line.
    pub fn set_value(&mut self, key: &str, values: &[String]) -> Result<String, ConfigError> {
        let joined = values.join(" ");
        let joined = joined.trim();
        if joined.is_empty() {
            return Err(ConfigError::Invalid {
                key: "value",
                reason: format!("no value given for {key}"),
            });
        }

        match key {
            "endpoint" => {
                let endpoint = validate_endpoint(joined).map_err(|reason| ConfigError::Invalid {
                    key: "endpoint",
                    reason,
                })?;
                self.endpoint = Some(endpoint.clone());
                Ok(format!("Set endpoint to: {endpoint}"))
            }
            "history" => {
                let mode = joined
                    .parse::<HistoryMode>()
                    .map_err(|reason| ConfigError::Invalid {
                        key: "history",
                        reason,
                    })?;
                self.history = Some(mode);
                Ok(format!("Set history to: {mode}"))
            }
            "timeout" => {
                let secs = joined
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        key: "timeout",
                        reason: format!("expected a positive number of seconds, got {joined}"),
                    })?;
                self.timeout_secs = Some(secs);
                Ok(format!("Set timeout to: {secs}s"))
            }
            "suggestions" => {
                let list: Vec<String> = values
                    .iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                let summary = list.join(", ");
                self.suggestions = Some(list);
                Ok(format!("Set suggestions to: {summary}"))
            }
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }

    pub fn unset_value(&mut self, key: &str) -> Result<String, ConfigError> {
        match key {
            "endpoint" => self.endpoint = None,
            "history" => self.history = None,
            "timeout" => self.timeout_secs = None,
            "suggestions" => self.suggestions = None,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(format!("Unset {key}"))
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
