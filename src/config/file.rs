//! Optional TOML configuration file
//!
//! Every section and key is optional; anything missing keeps the built-in
//! default (or whatever an earlier layer set).
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [completion]
//! api_url = "https://example.trycloudflare.com/v1/chat/completions"
//! timeout_secs = 30
//! accept_invalid_certs = false
//!
//! [session]
//! user_name = "Bruce"
//! tone = "Formal"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Config, Tone};

/// Root of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub completion: CompletionSection,

    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionSection {
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub accept_invalid_certs: Option<bool>,
}

/// Initial values for the per-run session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub tone: Option<Tone>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file)
    }

    /// Overlay the values present in this file onto `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref host) = self.server.host {
            config.host = host.clone();
        }
        if let Some(port) = self.server.port {
            config.port = port;
        }
        if let Some(ref url) = self.completion.api_url {
            config.completion.api_url = url.clone();
        }
        if let Some(secs) = self.completion.timeout_secs {
            config.completion.timeout_secs = secs;
        }
        if let Some(flag) = self.completion.accept_invalid_certs {
            config.completion.accept_invalid_certs = flag;
        }
        if let Some(ref name) = self.session.user_name {
            config.user_name = name.clone();
        }
        if let Some(tone) = self.session.tone {
            config.tone = tone;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 8080

[completion]
api_url = "https://tunnel.example.com/v1/chat/completions"
timeout_secs = 30
accept_invalid_certs = false

[session]
user_name = "Bruce"
tone = "Formal"
"#;

    #[test]
    fn test_parse_config() {
        let file = ConfigFile::from_str(SAMPLE_CONFIG).unwrap();
        let mut config = Config::default();
        file.apply(&mut config);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.completion.api_url,
            "https://tunnel.example.com/v1/chat/completions"
        );
        assert_eq!(config.completion.timeout_secs, 30);
        assert!(!config.completion.accept_invalid_certs);
        assert_eq!(config.user_name, "Bruce");
        assert_eq!(config.tone, Tone::Formal);
    }

    #[test]
    fn test_minimal_config() {
        let minimal = r#"
[session]
user_name = "Test"
"#;

        let file = ConfigFile::from_str(minimal).unwrap();
        let mut config = Config::default();
        file.apply(&mut config);

        assert_eq!(config.user_name, "Test");
        assert_eq!(config.port, 3000); // Default
        assert_eq!(config.tone, Tone::Neutral);
    }

    #[test]
    fn test_unknown_tone_is_parse_error() {
        let bad = r#"
[session]
tone = "Grumpy"
"#;
        assert!(matches!(
            ConfigFile::from_str(bad),
            Err(ConfigError::Toml(_))
        ));
    }
}
