//! Configuration file support for the notification processor
//!
//! Loads and validates the processor configuration from TOML files.
//! Default location: /etc/sonic/syncd_notifications.conf

use crate::error::{Result, SyncdError};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Worker thread configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Name of the notification worker thread
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

/// Notification handling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Republish port state changes whose port translated to the null id
    #[serde(default = "default_republish_null_port_events")]
    pub republish_null_port_events: bool,

    /// Flush each (switch, port, bridge, type) scope at most once per batch
    #[serde(default = "default_dedup_flush_scopes")]
    pub dedup_flush_scopes: bool,

    /// Maximum payload length quoted in log records (0 = unlimited)
    #[serde(default = "default_log_payload_max_len")]
    pub log_payload_max_len: usize,
}

/// Complete notification processor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_thread_name() -> String {
    "syncd-ntf".to_string()
}

fn default_republish_null_port_events() -> bool {
    true
}

fn default_dedup_flush_scopes() -> bool {
    true
}

fn default_log_payload_max_len() -> usize {
    1024
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            republish_null_port_events: default_republish_null_port_events(),
            dedup_flush_scopes: default_dedup_flush_scopes(),
            log_payload_max_len: default_log_payload_max_len(),
        }
    }
}

impl ProcessorConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SyncdError::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SyncdError::Configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SyncdError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default("/etc/sonic/syncd_notifications.conf")
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            SyncdError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path.as_ref(), content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker.thread_name.trim().is_empty() {
            return Err(SyncdError::Configuration(
                "thread_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Shortens a payload for logging according to `log_payload_max_len`.
    pub fn truncate_payload<'a>(&self, payload: &'a str) -> &'a str {
        let max = self.notifications.log_payload_max_len;
        if max == 0 || payload.len() <= max {
            return payload;
        }

        let mut end = max;
        while !payload.is_char_boundary(end) {
            end -= 1;
        }
        &payload[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert_eq!(config.worker.thread_name, "syncd-ntf");
        assert!(config.notifications.republish_null_port_events);
        assert!(config.notifications.dedup_flush_scopes);
        assert_eq!(config.notifications.log_payload_max_len, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization_partial() {
        let config = ProcessorConfig::from_toml_str(
            r#"
[notifications]
dedup_flush_scopes = false
"#,
        )
        .unwrap();

        assert!(!config.notifications.dedup_flush_scopes);
        assert!(config.notifications.republish_null_port_events);
        assert_eq!(config.worker.thread_name, "syncd-ntf");
    }

    #[test]
    fn test_invalid_toml() {
        let err = ProcessorConfig::from_toml_str("[worker\nthread_name = 1").unwrap_err();
        assert!(matches!(err, SyncdError::Configuration(_)));
    }

    #[test]
    fn test_validate_empty_thread_name() {
        let mut config = ProcessorConfig::default();
        config.worker.thread_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syncd.conf");

        let mut config = ProcessorConfig::default();
        config.worker.thread_name = "ntf-worker".to_string();
        config.notifications.log_payload_max_len = 0;
        config.save(&path).unwrap();

        let loaded = ProcessorConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = ProcessorConfig::load_or_default("/nonexistent/path.conf").unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }

    #[test]
    fn test_truncate_payload() {
        let mut config = ProcessorConfig::default();
        config.notifications.log_payload_max_len = 4;
        assert_eq!(config.truncate_payload("abcdefgh"), "abcd");
        assert_eq!(config.truncate_payload("abc"), "abc");

        config.notifications.log_payload_max_len = 0;
        assert_eq!(config.truncate_payload("abcdefgh"), "abcdefgh");
    }
}
