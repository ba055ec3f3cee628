//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use crate::services::client_pool::{normalize_base_url, SelectionStrategy};
use crate::services::gemini::{GEMINI_API_BASE, GEMINI_API_VERSION};
use crate::schemas::gemini::models::GEMINI_2_0_FLASH;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// Gemini search tool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiSearchConfig {
    /// API keys rotated across requests
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,
    /// Key selection strategy
    pub strategy: SelectionStrategy,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// REST API version segment
    pub api_version: String,
    /// Model name
    pub model: String,
    /// Generation temperature
    pub temperature: f32,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for GeminiSearchConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            strategy: SelectionStrategy::RoundRobin,
            base_url: GEMINI_API_BASE.to_string(),
            api_version: GEMINI_API_VERSION.to_string(),
            model: GEMINI_2_0_FLASH.to_string(),
            temperature: 0.2,
            timeout_seconds: 120,
        }
    }
}

impl GeminiSearchConfig {
    fn validate(&self) -> Result<()> {
        if self.api_keys.is_empty() {
            anyhow::bail!("No Gemini API key configured: set GEMINI_API_KEYS or GEMINI_API_KEY");
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("GEMINI_MODEL cannot be empty");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!("GEMINI_TEMPERATURE must be within 0.0..=2.0");
        }
        if self.timeout_seconds == 0 {
            anyhow::bail!("GEMINI_TIMEOUT_SECONDS must be > 0");
        }
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid GEMINI_API_BASE_URL: {}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("GEMINI_API_BASE_URL must use http or https");
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // Search tool
    pub gemini: GeminiSearchConfig,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mut api_keys = parse_key_list(&var_or("GEMINI_API_KEYS", ""));
        if let Some(key) = lookup("GEMINI_API_KEY") {
            let key = key.trim().to_string();
            if !key.is_empty() && !api_keys.contains(&key) {
                api_keys.push(key);
            }
        }

        let random_flag = parse_bool(&var_or("GEMINI_RANDOM_KEY_SELECTION", "false"));
        let strategy = if random_flag {
            SelectionStrategy::Random
        } else {
            SelectionStrategy::from_str(&var_or("GEMINI_KEY_STRATEGY", "round_robin"))
        };

        let settings = Self {
            app_name: var_or("APP_NAME", "gemini-search-tool"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: var_or("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: var_or("LOG_LEVEL", "info"),

            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            gemini: GeminiSearchConfig {
                api_keys,
                strategy,
                base_url: normalize_base_url(&var_or("GEMINI_API_BASE_URL", GEMINI_API_BASE)),
                api_version: var_or("GEMINI_API_VERSION", GEMINI_API_VERSION),
                model: var_or("GEMINI_MODEL", GEMINI_2_0_FLASH),
                temperature: var_or("GEMINI_TEMPERATURE", "0.2")
                    .parse()
                    .context("Invalid GEMINI_TEMPERATURE value")?,
                timeout_seconds: var_or("GEMINI_TIMEOUT_SECONDS", "120")
                    .parse()
                    .context("Invalid GEMINI_TIMEOUT_SECONDS value")?,
            },
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        self.gemini.validate()
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "gemini-search-tool".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            gemini: GeminiSearchConfig::default(),
        }
    }
}

/// Split a comma/newline separated key list, dropping blanks and duplicates
fn parse_key_list(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in raw.split([',', '\n']).map(str::trim).filter(|k| !k.is_empty()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "gemini-search-tool");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.gemini.model, "gemini-2.0-flash");
        assert_eq!(settings.gemini.base_url, "https://generativelanguage.googleapis.com");
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_load_requires_a_key() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("No Gemini API key"));

        assert!(load(&[("GEMINI_API_KEYS", " , ,")]).is_err());
    }

    #[test]
    fn test_load_key_list() {
        let settings = load(&[
            ("GEMINI_API_KEYS", "key-a, key-b,,key-a\nkey-c"),
            ("GEMINI_API_KEY", "key-d"),
        ])
        .unwrap();

        assert_eq!(settings.gemini.api_keys, vec!["key-a", "key-b", "key-c", "key-d"]);
        assert_eq!(settings.gemini.strategy, SelectionStrategy::RoundRobin);
    }

    #[test]
    fn test_load_strategy() {
        let settings = load(&[("GEMINI_API_KEY", "k"), ("GEMINI_KEY_STRATEGY", "random")]).unwrap();
        assert_eq!(settings.gemini.strategy, SelectionStrategy::Random);

        let settings = load(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_KEY_STRATEGY", "round_robin"),
            ("GEMINI_RANDOM_KEY_SELECTION", "true"),
        ])
        .unwrap();
        assert_eq!(settings.gemini.strategy, SelectionStrategy::Random);
    }

    #[test]
    fn test_load_strips_trailing_slash() {
        let settings = load(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_API_BASE_URL", "https://proxy.example.com/gemini/"),
        ])
        .unwrap();
        assert_eq!(settings.gemini.base_url, "https://proxy.example.com/gemini");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        assert!(load(&[("GEMINI_API_KEY", "k"), ("PORT", "0")]).is_err());
        assert!(load(&[("GEMINI_API_KEY", "k"), ("PORT", "http")]).is_err());
        assert!(load(&[("GEMINI_API_KEY", "k"), ("GEMINI_TEMPERATURE", "3.5")]).is_err());
        assert!(load(&[("GEMINI_API_KEY", "k"), ("GEMINI_TIMEOUT_SECONDS", "0")]).is_err());
        assert!(load(&[("GEMINI_API_KEY", "k"), ("GEMINI_API_BASE_URL", "localhost")]).is_err());
    }

    #[test]
    fn test_api_keys_not_serialized() {
        let settings = load(&[("GEMINI_API_KEY", "super-secret-key")]).unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("super-secret-key"));
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:8000");
    }
}
