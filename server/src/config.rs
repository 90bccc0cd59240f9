use clap::{Parser, ValueEnum};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::i18n::LanguageSet;
use crate::state::Keepalive;

/// Vendor chat relay server
#[derive(Parser, Serialize, Clone, Debug, Default)]
#[command(name = "market-relay", version, about = "Vendor chat relay server")]
pub struct Cli {
    /// Path to TOML config file
    #[arg(long, default_value = "./relay.toml")]
    #[serde(skip)]
    pub config: String,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    #[serde(skip)]
    pub generate_config: bool,

    /// Port to listen on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_logs: bool,

    /// Data directory for the SQLite database
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Storage backend for vendors, presence and chat history
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageBackend>,
}

#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Effective server configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub json_logs: bool,
    pub data_dir: String,
    pub storage: StorageBackend,
    #[serde(default)]
    pub languages: LanguagesConfig,
    #[serde(default)]
    pub ws: WsConfig,
}

/// Languages every chat message is rendered into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagesConfig {
    /// Default language, used when detection is inconclusive and for
    /// vendors without a preference (default: "en")
    #[serde(default = "default_fallback_language")]
    pub fallback: String,

    /// Additional target languages (default: es, fr, pt)
    #[serde(default = "default_target_languages")]
    pub targets: Vec<String>,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback_language(),
            targets: default_target_languages(),
        }
    }
}

fn default_fallback_language() -> String {
    "en".to_string()
}

fn default_target_languages() -> Vec<String> {
    vec!["es".to_string(), "fr".to_string(), "pt".to_string()]
}

/// WebSocket keepalive settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsConfig {
    /// Seconds between server pings (default: 30)
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a pong before closing (default: 10)
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_secs: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval(),
            pong_timeout_secs: default_pong_timeout(),
        }
    }
}

fn default_ping_interval() -> u64 {
    30
}

fn default_pong_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            json_logs: false,
            data_dir: "./data".to_string(),
            storage: StorageBackend::Sqlite,
            languages: LanguagesConfig::default(),
            ws: WsConfig::default(),
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (RELAY_*) < CLI args
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }

    pub fn figment(cli: &Cli) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed("RELAY_").split("__"))
            .merge(Serialized::defaults(cli))
    }

    pub fn language_set(&self) -> LanguageSet {
        LanguageSet::new(&self.languages.fallback, &self.languages.targets)
    }

    pub fn keepalive(&self) -> Keepalive {
        Keepalive {
            ping_interval: Duration::from_secs(self.ws.ping_interval_secs.max(1)),
            pong_timeout: Duration::from_secs(self.ws.pong_timeout_secs.max(1)),
        }
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Vendor Chat Relay Configuration
# Place this file at ./relay.toml or specify with --config <path>
# All settings can be overridden via environment variables (RELAY_PORT,
# RELAY_LANGUAGES__FALLBACK, etc.) or CLI flags (--port, etc.)

# Server port (default: 5000)
# port = 5000

# Bind address (default: 0.0.0.0, all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the SQLite database
# data_dir = "./data"

# Storage backend: "sqlite" or "memory" (memory loses everything on restart)
# storage = "sqlite"

# ---- Languages ----
# [languages]

# Default language: used when detection is inconclusive and for vendors
# without a preferred language
# fallback = "en"

# Every chat message is translated into each of these
# targets = ["es", "fr", "pt"]

# ---- WebSocket keepalive ----
# [ws]
# ping_interval_secs = 30
# pong_timeout_secs = 10
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figment_with(toml: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
    }

    #[test]
    fn test_defaults() {
        let config: Config = figment_with("").extract().unwrap();
        assert_eq!(config, Config::default());
        let languages = config.language_set();
        let codes: Vec<&str> = languages.iter().collect();
        assert_eq!(codes, vec!["en", "es", "fr", "pt"]);
    }

    #[test]
    fn test_toml_overrides_sections() {
        let config: Config = figment_with(
            r#"
port = 8080
storage = "memory"

[languages]
fallback = "es"
targets = ["en"]

[ws]
pong_timeout_secs = 3
"#,
        )
        .extract()
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.language_set().fallback(), "es");
        assert_eq!(config.ws.ping_interval_secs, 30);
        assert_eq!(config.keepalive().pong_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_cli_flags_win_only_when_given() {
        let cli = Cli {
            config: "/nonexistent/relay.toml".to_string(),
            port: Some(9001),
            ..Cli::default()
        };
        let config: Config = figment_with("bind_address = \"127.0.0.1\"\nport = 7000")
            .merge(Serialized::defaults(&cli))
            .extract()
            .unwrap();

        assert_eq!(config.port, 9001);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_template_is_valid_toml() {
        let config: Config = figment_with(&generate_config_template()).extract().unwrap();
        assert_eq!(config, Config::default());
    }
}
