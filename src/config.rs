//! Configuration loading and defaults for idle-notifyd.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::domain::SESSION_IDLE;

/// Highest volume `paplay` accepts (PA_VOLUME_NORM is 65536).
pub const MAX_VOLUME: u32 = 65536;

const DEFAULT_MESSAGES: [&str; 6] = [
    "All done!",
    "Finished!",
    "Task complete!",
    "Ready when you are!",
    "Your wish is my command!",
    "At your service!",
];

const DEFAULT_SOUNDS: [&str; 2] = [
    "/usr/share/sounds/freedesktop/stereo/complete.oga",
    "/usr/share/sounds/freedesktop/stereo/message-new-instant.oga",
];

/// Errors found while validating a loaded configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("volume {0} exceeds maximum of 65536")]
    VolumeTooHigh(u32),

    #[error("idle_event_type must not be empty")]
    EmptyEventType,
}

/// Main configuration for idle-notifyd.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event kind that triggers a notification (default: "session.idle").
    pub idle_event_type: String,

    /// Minimum milliseconds between two notifications (default: 5000).
    pub cooldown_ms: u64,

    /// Delay between accepting an event and dispatching it (default: 500).
    pub dispatch_delay_ms: u64,

    /// Notification title.
    pub title: String,

    /// Body used when `messages` is empty.
    pub default_message: String,

    /// Candidate bodies, one picked at random per notification.
    pub messages: Vec<String>,

    /// Candidate sound files. Empty means no sound.
    pub sounds: Vec<PathBuf>,

    /// Playback volume passed to the sound command (0..=65536, default: 45000).
    pub volume: u32,

    /// Notification icon.
    /// If unset, uses `<data_dir>/idle-notifyd/icon.png` when it exists.
    pub icon_path: Option<PathBuf>,

    /// Popup command. If unset, `notify-send` from PATH.
    pub notify_command: Option<PathBuf>,

    /// Sound command. If unset, `paplay` from PATH.
    pub sound_command: Option<PathBuf>,

    /// Unix socket to read host events from. If unset, reads stdin.
    pub event_socket: Option<PathBuf>,

    /// Dry run mode: log commands instead of executing.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_event_type: SESSION_IDLE.to_string(),
            cooldown_ms: 5000,
            dispatch_delay_ms: 500,
            title: "OpenCode".to_string(),
            default_message: "All done!".to_string(),
            messages: DEFAULT_MESSAGES.iter().map(ToString::to_string).collect(),
            sounds: DEFAULT_SOUNDS.iter().map(PathBuf::from).collect(),
            volume: 45000,
            icon_path: None,
            notify_command: None,
            sound_command: None,
            event_socket: None,
            dry_run: false,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from the default path, or return defaults if not found.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join("idle-notifyd").join("config.toml");
            if default_path.exists() {
                return Self::load(&default_path);
            }
        }

        Ok(Self::default())
    }

    /// Check values serde cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volume > MAX_VOLUME {
            return Err(ConfigError::VolumeTooHigh(self.volume));
        }
        if self.idle_event_type.is_empty() {
            return Err(ConfigError::EmptyEventType);
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }

    /// Resolve the icon path, falling back to the per-user data directory.
    pub fn resolved_icon(&self) -> Option<PathBuf> {
        if self.icon_path.is_some() {
            return self.icon_path.clone();
        }

        dirs::data_dir()
            .map(|dir| dir.join("idle-notifyd").join("icon.png"))
            .filter(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.idle_event_type, "session.idle");
        assert_eq!(config.cooldown(), Duration::from_secs(5));
        assert_eq!(config.dispatch_delay(), Duration::from_millis(500));
        assert_eq!(config.title, "OpenCode");
        assert_eq!(config.default_message, "All done!");
        assert_eq!(config.messages.len(), 6);
        assert!(config.messages.iter().any(|m| m == "Your wish is my command!"));
        assert_eq!(config.sounds.len(), 2);
        assert_eq!(config.volume, 45000);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            cooldown_ms = 10000
            dispatch_delay_ms = 0
            title = "opencode"
            messages = ["Done"]
            sounds = []
            volume = 32768
            icon_path = "/home/user/.local/share/icons/opencode.png"
            event_socket = "/run/user/1000/host-events.sock"
            dry_run = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cooldown_ms, 10000);
        assert_eq!(config.dispatch_delay(), Duration::ZERO);
        assert_eq!(config.title, "opencode");
        assert_eq!(config.messages, vec!["Done".to_string()]);
        assert!(config.sounds.is_empty());
        assert_eq!(config.volume, 32768);
        assert_eq!(
            config.resolved_icon(),
            Some(PathBuf::from("/home/user/.local/share/icons/opencode.png"))
        );
        assert_eq!(
            config.event_socket,
            Some(PathBuf::from("/run/user/1000/host-events.sock"))
        );
        assert!(config.dry_run);
        // Untouched keys keep their defaults
        assert_eq!(config.idle_event_type, "session.idle");
    }

    #[test]
    fn test_validate_volume() {
        let config = Config {
            volume: MAX_VOLUME + 1,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::VolumeTooHigh(MAX_VOLUME + 1))
        );

        let config = Config {
            volume: MAX_VOLUME,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_event_type() {
        let config = Config {
            idle_event_type: String::new(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyEventType));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cooldown_ms = 1234").unwrap();

        let config = Config::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.cooldown_ms, 1234);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "volume = 70000").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("exceeds maximum"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(&dir.path().join("nope.toml")).is_err());
    }
}
