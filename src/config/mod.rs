//! Application configuration

pub mod file;
pub mod prompts;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use file::{ConfigError, ConfigFile};
pub use prompts::{builtin as prompts_builtin, Tone};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/v1/chat/completions";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub completion: CompletionSettings,
    pub user_name: String,
    pub tone: Tone,
}

/// Settings for the remote completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Initial endpoint URL; editable per session at runtime
    pub api_url: String,

    /// Whole-request timeout in seconds. There is exactly one attempt.
    pub timeout_secs: u64,

    /// Skip TLS certificate verification. Needed for self-signed or
    /// ephemeral tunnel endpoints.
    pub accept_invalid_certs: bool,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            completion: CompletionSettings::default(),
            user_name: String::new(),
            tone: Tone::Neutral,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file named by `ALFRED_CONFIG`, then environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = env::var("ALFRED_CONFIG") {
            let file = ConfigFile::from_file(&PathBuf::from(path))?;
            file.apply(&mut config);
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.host = host;
        }
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Ok(url) = env::var("ALFRED_API_URL") {
            self.completion.api_url = url;
        }
        if let Ok(secs) = env::var("ALFRED_TIMEOUT_SECS") {
            self.completion.timeout_secs = secs
                .parse()
                .map_err(|_| ConfigError::Validation(format!("invalid timeout: {}", secs)))?;
        }
        if let Ok(flag) = env::var("ALFRED_ACCEPT_INVALID_CERTS") {
            self.completion.accept_invalid_certs = parse_flag(&flag)?;
        }
        if let Ok(name) = env::var("ALFRED_USER_NAME") {
            self.user_name = name;
        }
        if let Ok(tone) = env::var("ALFRED_TONE") {
            self.tone = tone
                .parse()
                .map_err(|e: prompts::UnknownTone| ConfigError::Validation(e.to_string()))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "completion timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Validation(format!("invalid flag: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.tone, Tone::Neutral);
        assert_eq!(config.completion.timeout_secs, 60);
        assert!(config.completion.accept_invalid_certs);
        assert!(config.user_name.is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.completion.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
