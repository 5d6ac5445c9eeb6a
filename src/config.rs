use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub panel: PanelConfig,
    pub forwarder: ForwarderConfig,
    #[serde(default = "default_monitor_config")]
    pub monitor: MonitorConfig,
    #[serde(default = "default_selectors_config")]
    pub selectors: SelectorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForwarderConfig {
    pub endpoint_url: String,
    pub secret_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Delay between message scans, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Reload the panel view every N scans (60 scans at the default
    /// interval is roughly five minutes).
    #[serde(default = "default_refresh_every")]
    pub refresh_every: u32,
    /// How long to wait before restarting after a session failure.
    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: u64,
}

/// CSS selectors for the panel's login form and message list.
#[derive(Debug, Deserialize, Clone)]
pub struct SelectorsConfig {
    #[serde(default = "default_login_username")]
    pub login_username: String,
    #[serde(default = "default_login_password")]
    pub login_password: String,
    #[serde(default = "default_login_submit")]
    pub login_submit: String,
    #[serde(default = "default_message_rows")]
    pub message_rows: String,
    #[serde(default = "default_message_text")]
    pub message_text: String,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_refresh_every() -> u32 {
    60
}

fn default_reconnect_backoff_secs() -> u64 {
    30
}

fn default_login_username() -> String {
    r#"input[name="username"]"#.to_string()
}

fn default_login_password() -> String {
    r#"input[name="password"]"#.to_string()
}

fn default_login_submit() -> String {
    r#"button[type="submit"]"#.to_string()
}

fn default_message_rows() -> String {
    ".message-row".to_string()
}

fn default_message_text() -> String {
    ".message-text".to_string()
}

fn default_monitor_config() -> MonitorConfig {
    MonitorConfig {
        poll_interval_ms: default_poll_interval_ms(),
        refresh_every: default_refresh_every(),
        reconnect_backoff_secs: default_reconnect_backoff_secs(),
    }
}

fn default_selectors_config() -> SelectorsConfig {
    SelectorsConfig {
        login_username: default_login_username(),
        login_password: default_login_password(),
        login_submit: default_login_submit(),
        message_rows: default_message_rows(),
        message_text: default_message_text(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [panel]
            base_url = "https://panel.example.com/login"
            username = "operator"
            password = "hunter2"

            [forwarder]
            endpoint_url = "https://api.example.com/otp-receiver"
            secret_token = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.poll_interval_ms, 5000);
        assert_eq!(config.monitor.refresh_every, 60);
        assert_eq!(config.monitor.reconnect_backoff_secs, 30);
        assert_eq!(config.selectors.login_username, r#"input[name="username"]"#);
        assert_eq!(config.selectors.message_rows, ".message-row");
        assert_eq!(config.selectors.message_text, ".message-text");
    }

    #[test]
    fn test_overrides_are_honored() {
        let config: Config = toml::from_str(
            r#"
            [panel]
            base_url = "https://panel.example.com/login"
            username = "operator"
            password = "hunter2"

            [forwarder]
            endpoint_url = "https://api.example.com/otp-receiver"
            secret_token = "s3cret"

            [monitor]
            poll_interval_ms = 1000

            [selectors]
            message_rows = "tr.sms"
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.poll_interval_ms, 1000);
        // Unset fields inside an overridden table still default.
        assert_eq!(config.monitor.refresh_every, 60);
        assert_eq!(config.selectors.message_rows, "tr.sms");
        assert_eq!(config.selectors.message_text, ".message-text");
    }
}
