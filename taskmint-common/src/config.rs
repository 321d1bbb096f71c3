//! Bootstrap configuration
//!
//! Settings are resolved in this order (highest priority first):
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`TASKMINT_*`)
//! 3. TOML config file
//! 4. Built-in defaults
//!
//! Configuration is read once at startup; a restart picks up changes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_HOST: &str = "TASKMINT_HOST";
pub const ENV_PORT: &str = "TASKMINT_PORT";
pub const ENV_DATABASE_PATH: &str = "TASKMINT_DATABASE_PATH";
pub const ENV_LOG_LEVEL: &str = "TASKMINT_LOG_LEVEL";
pub const ENV_LLM_PROVIDER: &str = "TASKMINT_LLM_PROVIDER";
pub const ENV_LLM_BASE_URL: &str = "TASKMINT_LLM_BASE_URL";
pub const ENV_LLM_MODEL: &str = "TASKMINT_LLM_MODEL";
pub const ENV_LLM_API_KEY: &str = "TASKMINT_LLM_API_KEY";
pub const ENV_JWT_SECRET: &str = "TASKMINT_JWT_SECRET";
pub const ENV_CORS_ORIGIN: &str = "TASKMINT_CORS_ORIGIN";

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENAI_DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_DEFAULT_MODEL: &str = "gemini-pro";

/// Longest accepted bearer-token lifetime (10 years)
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365 * 10;

/// Configuration loaded from the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP server port
    pub port: u16,

    /// Path to SQLite database file; OS data directory when unset
    pub database_path: Option<PathBuf>,

    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: None,
            logging: LoggingConfig::default(),
            llm: LlmConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error); RUST_LOG wins
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Hosted model API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// OpenAI-compatible chat completions (Groq, OpenAI, Ollama, ...)
    #[default]
    OpenAi,
    /// Google Generative Language `generateContent`
    Gemini,
}

impl std::str::FromStr for LlmProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProviderKind::OpenAi),
            "gemini" => Ok(LlmProviderKind::Gemini),
            other => Err(Error::Config(format!("Unknown LLM provider: {}", other))),
        }
    }
}

/// Language model endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Request timeout for the model call
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::OpenAi,
            base_url: None,
            model: None,
            api_key: None,
            timeout_secs: 60,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl LlmConfig {
    pub fn effective_base_url(&self) -> String {
        let url = match (&self.base_url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, LlmProviderKind::OpenAi) => OPENAI_DEFAULT_BASE_URL,
            (None, LlmProviderKind::Gemini) => GEMINI_DEFAULT_BASE_URL,
        };
        url.trim_end_matches('/').to_string()
    }

    pub fn effective_model(&self) -> String {
        match (&self.model, self.provider) {
            (Some(model), _) => model.clone(),
            (None, LlmProviderKind::OpenAi) => OPENAI_DEFAULT_MODEL.to_string(),
            (None, LlmProviderKind::Gemini) => GEMINI_DEFAULT_MODEL.to_string(),
        }
    }
}

/// Bearer-token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: Option<String>,
    /// Token lifetime
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24 * 7,
        }
    }
}

/// Cross-origin configuration for a separately hosted front end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origin; any origin when unset
    pub allowed_origin: Option<String>,
}

impl TomlConfig {
    /// Load configuration from an explicit path, the default location, or defaults
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return load_toml_config(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => load_toml_config(&path),
            _ => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Overlay `TASKMINT_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup (empty values are ignored)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("Invalid {}: {}", ENV_PORT, e)))?;
        }
        if let Some(path) = get(ENV_DATABASE_PATH) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(provider) = get(ENV_LLM_PROVIDER) {
            self.llm.provider = provider.parse()?;
        }
        if let Some(url) = get(ENV_LLM_BASE_URL) {
            self.llm.base_url = Some(url);
        }
        if let Some(model) = get(ENV_LLM_MODEL) {
            self.llm.model = Some(model);
        }
        if let Some(key) = get(ENV_LLM_API_KEY) {
            if self.llm.api_key.is_some() {
                warn!("LLM API key set in both TOML and environment; using environment");
            }
            self.llm.api_key = Some(key);
        }
        if let Some(secret) = get(ENV_JWT_SECRET) {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(origin) = get(ENV_CORS_ORIGIN) {
            self.cors.allowed_origin = Some(origin);
        }
        Ok(())
    }

    /// Effective database location
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    /// Bearer-token lifetime, validated for startup
    pub fn token_ttl_hours(&self) -> Result<u64> {
        match self.auth.token_ttl_hours {
            hours @ 1..=MAX_TOKEN_TTL_HOURS => Ok(hours),
            other => Err(Error::Config(format!(
                "[auth] token_ttl_hours must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS, other
            ))),
        }
    }

    /// JWT secret, required for startup
    pub fn jwt_secret(&self) -> Result<&str> {
        match self.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ => Err(Error::Config(format!(
                "JWT secret not configured. Set {} or [auth] jwt_secret in the config file",
                ENV_JWT_SECRET
            ))),
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// `<config dir>/taskmint/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("taskmint").join("config.toml"))
}

/// `<local data dir>/taskmint/taskmint.db`, or `./taskmint_data/taskmint.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("taskmint"))
        .unwrap_or_else(|| PathBuf::from("./taskmint_data"))
        .join("taskmint.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.llm.provider, LlmProviderKind::OpenAi);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert!(config.jwt_secret().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 8080

            [llm]
            provider = "gemini"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.llm.provider, LlmProviderKind::Gemini);
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_provider_defaults() {
        let mut llm = LlmConfig::default();
        assert_eq!(llm.effective_base_url(), OPENAI_DEFAULT_BASE_URL);
        assert_eq!(llm.effective_model(), OPENAI_DEFAULT_MODEL);

        llm.provider = LlmProviderKind::Gemini;
        assert_eq!(llm.effective_model(), GEMINI_DEFAULT_MODEL);

        llm.base_url = Some("http://localhost:11434/v1/".to_string());
        assert_eq!(llm.effective_base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_overrides_win_over_toml() {
        let mut config: TomlConfig = toml::from_str(
            r#"
            port = 8080
            [auth]
            jwt_secret = "from-toml"
            "#,
        )
        .unwrap();

        config
            .apply_overrides_from(lookup(&[
                (ENV_PORT, "9000"),
                (ENV_JWT_SECRET, "from-env"),
                (ENV_LLM_PROVIDER, "gemini"),
                (ENV_LLM_MODEL, ""),
            ]))
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.jwt_secret().unwrap(), "from-env");
        assert_eq!(config.llm.provider, LlmProviderKind::Gemini);
        assert!(config.llm.model.is_none(), "empty values are ignored");
    }

    #[test]
    fn test_invalid_port_override_is_config_error() {
        let mut config = TomlConfig::default();
        let result = config.apply_overrides_from(lookup(&[(ENV_PORT, "not-a-port")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = TomlConfig::load(Some(Path::new("/definitely/not/here/config.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = TomlConfig::default();
        assert_eq!(config.token_ttl_hours().unwrap(), 168);

        config.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert_eq!(config.token_ttl_hours().unwrap(), MAX_TOKEN_TTL_HOURS);

        for bad in [0, MAX_TOKEN_TTL_HOURS + 1, u64::MAX] {
            config.auth.token_ttl_hours = bad;
            assert!(matches!(config.token_ttl_hours(), Err(Error::Config(_))), "{}", bad);
        }
    }

    #[test]
    fn test_huge_token_ttl_in_toml_is_config_error() {
        let config: TomlConfig = toml::from_str(
            r#"
            [auth]
            token_ttl_hours = 18446744073709551615
            "#,
        )
        .unwrap();
        assert!(matches!(config.token_ttl_hours(), Err(Error::Config(_))));
    }

    #[test]
    fn test_database_path_fallback() {
        let config = TomlConfig::default();
        assert!(config.database_path().ends_with("taskmint.db"));
    }
}
