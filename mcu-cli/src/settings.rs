//! Persistent tool settings

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use mcu_session::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Tool settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Interface path to use instead of discovery
    #[serde(default)]
    pub pinned_device: Option<String>,
    /// Session timing and retries
    #[serde(default)]
    pub session: SessionConfig,
    /// Pause between single volume steps (ms)
    #[serde(default = "default_volume_step_delay")]
    pub volume_step_delay_ms: u64,
}

fn default_volume_step_delay() -> u64 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pinned_device: None,
            session: SessionConfig::default(),
            volume_step_delay_ms: default_volume_step_delay(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for mcuctl
    /// Uses $XDG_CONFIG_HOME/mcuctl, falls back to ~/.config/mcuctl
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("mcuctl"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("mcuctl"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk; a missing or unreadable file gives defaults
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| Self::from_json(&s))
            .unwrap_or_default()
    }

    fn from_json(s: &str) -> Option<Self> {
        match serde_json::from_str(s) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("Ignoring invalid settings file: {}", e);
                None
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().context("could not determine settings path")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;

        Ok(())
    }

    /// Session configuration with command-line overrides applied
    pub fn session_config(&self, cli: &Cli) -> SessionConfig {
        let mut config = self.session.clone();
        if let Some(ms) = cli.timeout_ms {
            config.read_timeout_ms = ms;
        }
        if let Some(attempts) = cli.attempts {
            config.attempts = attempts;
        }
        if cli.confirm_acks {
            config.confirm_acks = true;
        }
        config
    }

    /// Device path to connect to: `--device` first, then the pinned one
    pub fn device_path<'a>(&'a self, cli: &'a Cli) -> Option<&'a str> {
        cli.device.as_deref().or(self.pinned_device.as_deref())
    }

    pub fn volume_step_delay(&self) -> Duration {
        Duration::from_millis(self.volume_step_delay_ms)
    }
}
