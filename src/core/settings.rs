//! Application settings management

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`Settings::api_base_url`]
pub const ENV_API_URL: &str = "VMDASH_API_URL";
/// Environment variable overriding [`Settings::command_timeout_secs`]
pub const ENV_COMMAND_TIMEOUT: &str = "VMDASH_COMMAND_TIMEOUT_SECS";

/// Application theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Theme::Dark, Theme::Light]
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Control API
    /// Base URL of the VM control service
    pub api_base_url: String,
    /// Per-request HTTP timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Upper bound for any status query or start/stop command, in seconds
    pub command_timeout_secs: u64,

    // Display
    /// Application theme
    pub theme: Theme,
    /// Show the informational cards under the control card
    pub show_metrics: bool,
    /// Identifier shown on the control card
    pub instance_label: String,

    // Advanced
    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_ms: 10_000,
            command_timeout_secs: 30,

            theme: Theme::Dark,
            show_metrics: true,
            instance_label: "vm-001".to_string(),

            debug_logging: false,
        }
    }
}

impl Settings {
    /// Apply overrides from the environment (or any other key lookup)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_COMMAND_TIMEOUT).and_then(|v| v.trim().parse().ok()) {
            self.command_timeout_secs = secs;
        }
    }

    /// Validate settings and fix any invalid values
    pub fn validate(&mut self) {
        self.request_timeout_ms = self.request_timeout_ms.max(250);
        self.command_timeout_secs = self.command_timeout_secs.clamp(1, 600);
        if self.api_base_url.trim().is_empty() {
            self.api_base_url = Self::default().api_base_url;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
