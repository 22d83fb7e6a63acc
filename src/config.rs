use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::CopilotError;
use crate::errors::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub directory: String,
    #[serde(default = "default_file_output")]
    pub file_output: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_file_output() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_dir(),
            file_output: default_file_output(),
        }
    }
}

/// Wire flavour of the OpenAI-compatible endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Deployment-scoped URLs, `api-key` header, `api-version` query parameter
    Azure,
    /// `/v1`-style URLs with a bearer token and a `model` field
    OpenAI,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: LlmProvider,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub chat_deployment: String,
    #[serde(default)]
    pub embedding_deployment: String,
}

fn default_llm_provider() -> LlmProvider {
    LlmProvider::Azure
}

fn default_openai_api_version() -> String {
    "2024-02-15-preview".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            endpoint: String::new(),
            api_key: String::new(),
            api_version: default_openai_api_version(),
            chat_deployment: String::new(),
            embedding_deployment: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub index_name: String,
    #[serde(default = "default_search_api_version")]
    pub api_version: String,
    #[serde(default = "default_vector_field")]
    pub vector_field: String,
}

fn default_search_api_version() -> String {
    "2023-11-01".to_string()
}

fn default_vector_field() -> String {
    "contentVector".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            index_name: String::new(),
            api_version: default_search_api_version(),
            vector_field: default_vector_field(),
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotConfig {
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,
    #[serde(default = "default_max_tokens")]
    pub intent_max_tokens: u32,
    #[serde(default = "default_max_tokens")]
    pub reply_max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Applied to every blocking upstream call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_retrieval_limit() -> usize {
    3
}

fn default_max_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            retrieval_limit: default_retrieval_limit(),
            intent_max_tokens: default_max_tokens(),
            reply_max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: false,
        }
    }
}

/// Every section is optional; endpoints and keys may come from the environment alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub copilot: CopilotConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from the working directory
    pub fn load() -> Result<Self> {
        Self::load_from_dir(Path::new("."))
    }

    /// Load `config.toml` from `dir`, then `config.example.toml`, then built-in defaults
    ///
    /// With no file at all, every upstream setting has to come from the environment.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");
        let example_path = dir.join("config.example.toml");

        if config_path.exists() {
            Self::from_file(config_path)
        } else if example_path.exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file(example_path)
        } else {
            tracing::warn!("No config file found, using defaults and environment variables");
            Ok(Self::default())
        }
    }

    /// Overlay settings from a key lookup.
    ///
    /// Only keys that are present and non-empty replace file values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.llm.endpoint = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.llm.api_version = v;
        }
        if let Some(v) = get("AZURE_OPENAI_CHAT_DEPLOYMENT") {
            self.llm.chat_deployment = v;
        }
        if let Some(v) = get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT") {
            self.llm.embedding_deployment = v;
        }
        if let Some(v) = get("AZURE_SEARCH_ENDPOINT") {
            self.search.endpoint = v;
        }
        if let Some(v) = get("AZURE_SEARCH_KEY") {
            self.search.api_key = v;
        }
        if let Some(v) = get("AZUREAI_SEARCH_INDEX_NAME") {
            self.search.index_name = v;
        }
    }

    /// Overlay settings from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Check that every setting needed to reach the upstream services is present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        let required = [
            ("llm.endpoint", &self.llm.endpoint),
            ("llm.api_key", &self.llm.api_key),
            ("llm.chat_deployment", &self.llm.chat_deployment),
            ("llm.embedding_deployment", &self.llm.embedding_deployment),
            ("search.endpoint", &self.search.endpoint),
            ("search.api_key", &self.search.api_key),
            ("search.index_name", &self.search.index_name),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(CopilotError::ConfigError(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        for (name, value) in [
            ("llm.endpoint", &self.llm.endpoint),
            ("search.endpoint", &self.search.endpoint),
        ] {
            url::Url::parse(value).map_err(|e| {
                CopilotError::ConfigError(format!("{name} is not a valid URL ({value}): {e}"))
            })?;
        }

        if self.copilot.retrieval_limit == 0 {
            return Err(CopilotError::ConfigError(
                "copilot.retrieval_limit must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.copilot.temperature) {
            return Err(CopilotError::ConfigError(format!(
                "copilot.temperature must be within 0.0..=2.0, got {}",
                self.copilot.temperature
            )));
        }

        Ok(())
    }

    /// Copy of this configuration with API keys masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.llm.api_key = redact(&config.llm.api_key);
        config.search.api_key = redact(&config.search.api_key);
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.copilot.request_timeout_secs)
    }
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}
