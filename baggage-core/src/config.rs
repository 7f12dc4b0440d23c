use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::BaggageError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BaggageConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Completion endpoint settings. The API key is never read from the file;
/// it comes from `OPENROUTER_API_KEY` and may be absent until first use.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub referer: Option<String>,
    pub title: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "anthropic/claude-3.5-sonnet".to_string(),
            max_tokens: 500,
            temperature: 0.1,
            timeout_seconds: 30,
            max_retries: 0,
            retry_delay_ms: 500,
            referer: None,
            title: "TSA Item Checker".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Rest,
    Postgres,
    Disabled,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Base URL of the REST store, or a Postgres connection string.
    pub url: Option<String>,
    pub table: String,
    pub timeout_seconds: u64,
    pub max_connections: u32,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Rest,
            url: None,
            table: "tsa_responses".to_string(),
            timeout_seconds: 10,
            max_connections: 5,
            api_key: None,
        }
    }
}

impl BaggageConfig {
    /// Load from an optional TOML file layered under `BAGGAGE__*` env vars,
    /// then pull in the conventional secret variables.
    pub fn load(path: &str) -> Result<Self, BaggageError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("BAGGAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let mut config: Self = s.try_deserialize()?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML document without touching the process environment.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), BaggageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENROUTER_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(port) = non_empty("PORT") {
            self.http.port = port.trim().parse::<u16>().map_err(|_| {
                BaggageError::InvalidConfig(format!("PORT must be a port number, got {:?}", port))
            })?;
        }

        match self.storage.backend {
            StorageBackend::Rest => {
                if let Some(url) = non_empty("SUPABASE_URL") {
                    self.storage.url = Some(url);
                }
                if let Some(key) = non_empty("SUPABASE_KEY") {
                    self.storage.api_key = Some(key);
                }
            }
            StorageBackend::Postgres => {
                if let Some(url) = non_empty("DATABASE_URL") {
                    self.storage.url = Some(url);
                }
            }
            StorageBackend::Disabled => {}
        }
        Ok(())
    }

    /// Persistence settings have no built-in defaults: a configured backend
    /// must carry its own endpoint and credentials.
    pub fn validate(&self) -> Result<(), BaggageError> {
        if self.completion.timeout_seconds == 0 {
            return Err(BaggageError::InvalidConfig(
                "completion.timeout_seconds must be positive".to_string(),
            ));
        }
        let table = &self.storage.table;
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(BaggageError::InvalidConfig(format!(
                "storage.table must be a plain identifier, got {:?}",
                table
            )));
        }

        match self.storage.backend {
            StorageBackend::Rest => {
                if self.storage.url.is_none() {
                    return Err(BaggageError::MissingConfig(
                        "SUPABASE_URL (or storage.url) is required for the rest backend".to_string(),
                    ));
                }
                if self.storage.api_key.is_none() {
                    return Err(BaggageError::MissingConfig(
                        "SUPABASE_KEY is required for the rest backend".to_string(),
                    ));
                }
            }
            StorageBackend::Postgres => {
                if self.storage.url.is_none() {
                    return Err(BaggageError::MissingConfig(
                        "DATABASE_URL (or storage.url) is required for the postgres backend"
                            .to_string(),
                    ));
                }
            }
            StorageBackend::Disabled => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_service_contract() {
        let config = BaggageConfig::from_toml("").unwrap();
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.completion.timeout_seconds, 30);
        assert_eq!(config.completion.max_tokens, 500);
        assert_eq!(config.storage.timeout_seconds, 10);
        assert_eq!(config.storage.table, "tsa_responses");
        assert_eq!(config.storage.backend, StorageBackend::Rest);
        assert!(config.storage.url.is_none(), "no embedded store URL");
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn test_toml_overrides() {
        let config = BaggageConfig::from_toml(
            r#"
            [http]
            host = "127.0.0.1"
            port = 9000

            [completion]
            model = "openai/gpt-4o-mini"
            temperature = 0.0

            [storage]
            backend = "postgres"
            max_connections = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.completion.model, "openai/gpt-4o-mini");
        assert_eq!(config.completion.max_tokens, 500, "unset keys keep defaults");
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.storage.max_connections, 2);
    }

    #[test]
    fn test_apply_env_reads_secrets_and_port() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENROUTER_API_KEY", "sk-test"),
            ("SUPABASE_URL", "https://example.supabase.co"),
            ("SUPABASE_KEY", "anon-key"),
            ("PORT", "8080"),
        ]);
        let mut config = BaggageConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.storage.url.as_deref(), Some("https://example.supabase.co"));
        assert_eq!(config.storage.api_key.as_deref(), Some("anon-key"));
        assert_eq!(config.http.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_secret_is_treated_as_missing() {
        let mut config = BaggageConfig::default();
        config
            .apply_env(|k| (k == "OPENROUTER_API_KEY").then(|| "   ".to_string()))
            .unwrap();
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn test_apply_env_rejects_unparsable_port() {
        let mut config = BaggageConfig::default();
        let result = config.apply_env(|k| (k == "PORT").then(|| "80a0".to_string()));
        match result {
            Err(BaggageError::InvalidConfig(msg)) => assert!(msg.contains("80a0")),
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
        assert_eq!(config.http.port, 8000);
    }

    #[test]
    fn test_validate_rejects_rest_backend_without_credentials() {
        let mut config = BaggageConfig::default();
        config.storage.url = Some("https://example.supabase.co".to_string());

        match config.validate() {
            Err(BaggageError::MissingConfig(msg)) => assert!(msg.contains("SUPABASE_KEY")),
            other => panic!("Expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_postgres_uses_database_url() {
        let mut config = BaggageConfig::from_toml("[storage]\nbackend = \"postgres\"").unwrap();
        assert!(config.validate().is_err());

        config
            .apply_env(|k| (k == "DATABASE_URL").then(|| "postgres://localhost/tsa".to_string()))
            .unwrap();
        assert_eq!(config.storage.url.as_deref(), Some("postgres://localhost/tsa"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_odd_table_names() {
        let config =
            BaggageConfig::from_toml("[storage]\nbackend = \"disabled\"\ntable = \"x; DROP\"")
                .unwrap();
        assert!(matches!(config.validate(), Err(BaggageError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_disabled_needs_nothing() {
        let config = BaggageConfig::from_toml("[storage]\nbackend = \"disabled\"").unwrap();
        assert!(config.validate().is_ok());
    }
}
