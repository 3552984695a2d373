// src/core/config_manager.rs
//! Configuration loading - one `config.yaml` with a section per environment

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_SEND_PATH: &str = "/api/send-referral-mail";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigManager {
    #[serde(default)]
    pub server: ServerSettings,
    pub mail_service: MailServiceConfig,
    #[serde(default)]
    pub message: MessageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_address")]
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailServiceConfig {
    pub base_url: String,
    #[serde(default = "default_send_path")]
    pub send_path: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageConfig {
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_sender_pitch")]
    pub sender_pitch: String,
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    /// Refuse to send while any row failed email derivation
    #[serde(default)]
    pub require_all_valid: bool,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: ConfigManager,
    production: Option<ConfigManager>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            sender_name: default_sender_name(),
            sender_pitch: default_sender_pitch(),
            template_path: None,
        }
    }
}

fn default_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_send_path() -> String {
    DEFAULT_SEND_PATH.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_sender_name() -> String {
    "Your Name".to_string()
}

fn default_sender_pitch() -> String {
    "proficient in problem solving, data structures and algorithms coupled with handy communication and people handling skills".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("out")
}

impl ConfigManager {
    /// Load `config.yaml` from the working directory
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        info!(
            "Loading configuration for environment: {} from {}",
            environment,
            path.display()
        );

        if !path.exists() {
            anyhow::bail!(
                "{} not found. The application cannot start without configuration.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_yaml(&content, &environment)
    }

    /// Parse a configuration document and pick the section for `environment`
    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse configuration")?;

        let mut config = match (environment, file.production) {
            ("production", Some(production)) => production,
            ("production", None) => {
                anyhow::bail!("Configuration has no 'production' section")
            }
            _ => file.local,
        };

        config.output_path = Self::resolve_path(&config.output_path)?;
        if let Some(template) = &config.message.template_path {
            config.message.template_path = Some(Self::resolve_path(template)?);
        }

        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("REFERRAL_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Full URL of the mail send endpoint
    pub fn send_url(&self) -> String {
        format!(
            "{}{}",
            self.mail_service.base_url.trim_end_matches('/'),
            self.mail_service.send_path
        )
    }

    /// Ensure the output directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.output_path.display()
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
local:
  mail_service:
    base_url: "http://127.0.0.1:5555/"
  message:
    sender_name: "Jane Doe"
production:
  server:
    address: "0.0.0.0"
    port: 9000
  mail_service:
    base_url: "https://mail.example.com"
    send_path: "/v2/send"
    timeout_seconds: 10
  ingest:
    require_all_valid: true
  output_path: "/var/lib/referrals"
"#;

    #[test]
    fn test_local_defaults() {
        let config = ConfigManager::from_yaml(SAMPLE, "local").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.mail_service.timeout_seconds, 30);
        assert_eq!(config.send_url(), "http://127.0.0.1:5555/api/send-referral-mail");
        assert_eq!(config.message.sender_name, "Jane Doe");
        assert!(config.message.template_path.is_none());
        assert!(!config.ingest.require_all_valid);
        assert!(config.output_path.is_absolute());
    }

    #[test]
    fn test_production_section() {
        let config = ConfigManager::from_yaml(SAMPLE, "production").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.send_url(), "https://mail.example.com/v2/send");
        assert!(config.ingest.require_all_valid);
        assert_eq!(config.output_path, PathBuf::from("/var/lib/referrals"));
    }

    #[test]
    fn test_unknown_environment_falls_back_to_local() {
        let config = ConfigManager::from_yaml(SAMPLE, "staging").unwrap();
        assert_eq!(config.mail_service.base_url, "http://127.0.0.1:5555/");
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        let yaml = "local:\n  mail_service:\n    send_path: /x\n";
        assert!(ConfigManager::from_yaml(yaml, "local").is_err());
    }
}
