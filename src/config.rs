use std::path::Path;

use config::Config;
use config::Environment;
use config::File;
use config::FileFormat;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::PortfolioChatError;
use crate::vector::pinecone::normalize_host;

/// Prefix for environment overrides, e.g. `PORTFOLIO_CHAT_RAG__TOP_K=5`
pub const ENV_PREFIX: &str = "PORTFOLIO_CHAT";

/// Key shared by the Gemini embedding and generation endpoints
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["https://mrigank.is-a.dev".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: GEMINI_ENDPOINT.to_string(),
            api_key: String::new(),
            model: "gemini-embedding-001".to_string(),
            dimension: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: GEMINI_ENDPOINT.to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash-lite".to_string(),
            temperature: 0.7,
            max_output_tokens: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub api_key: String,
    pub index_name: String,
    /// Data-plane host of the index; resolved through the control plane when unset
    pub index_host: Option<String>,
    pub control_plane_endpoint: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: "portfolio-chat".to_string(),
            index_host: None,
            control_plane_endpoint: "https://api.pinecone.io".to_string(),
        }
    }
}

/// User-facing texts for the degraded pipeline outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub embedding_unavailable: String,
    pub no_context_found: String,
    pub knowledge_base_unavailable: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            embedding_unavailable:
                "I'm having a little trouble accessing my brain right now. Please try again!"
                    .to_string(),
            no_context_found: "I couldn't find any specific details about that in Mrigank's portfolio, but feel free to ask about his patents, DASES, or other projects!".to_string(),
            knowledge_base_unavailable: "I'm encountering a temporary issue connecting to the knowledge base. Please try again in a moment.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    /// Replaces the built-in persona template; must contain `{{context}}`
    pub prompt_template_path: Option<String>,
    pub fallbacks: FallbackConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            prompt_template_path: None,
            fallbacks: FallbackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub knowledge_base_path: String,
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            knowledge_base_path: "data/knowledge_base.txt".to_string(),
            batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl HttpConfig {
    /// Per-request timeout for outbound calls
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    pub vector_store: VectorStoreConfig,
    pub rag: RagConfig,
    pub ingest: IngestConfig,
    pub http: HttpConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(PortfolioChatError::Io)?;

        let config: AppConfig = toml::from_str(&content).map_err(PortfolioChatError::TomlParsing)?;

        Ok(config)
    }

    /// Load configuration from `config.toml` (if present) layered with environment overrides
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file plus environment overrides.
    ///
    /// Priority, lowest first: built-in defaults, the TOML file,
    /// `PORTFOLIO_CHAT_*` variables, then `GOOGLE_API_KEY` / `PINECONE_API_KEY`.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let file_source = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::with_name("config.toml")
                .format(FileFormat::Toml)
                .required(false),
        };

        let google_key = std::env::var(GOOGLE_API_KEY_VAR).ok();
        let pinecone_key = std::env::var(PINECONE_API_KEY_VAR).ok();

        let config: AppConfig = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .set_override_option("embeddings.api_key", google_key.clone())?
            .set_override_option("llm.api_key", google_key)?
            .set_override_option("vector_store.api_key", pinecone_key)?
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Check the values every command relies on
    pub fn validate(&self) -> crate::Result<()> {
        if self.embeddings.api_key.trim().is_empty() {
            return Err(PortfolioChatError::ConfigError(format!(
                "embeddings.api_key is empty (set {GOOGLE_API_KEY_VAR})"
            )));
        }
        self.validate_llm_access()?;
        if self.vector_store.api_key.trim().is_empty() {
            return Err(PortfolioChatError::ConfigError(format!(
                "vector_store.api_key is empty (set {PINECONE_API_KEY_VAR})"
            )));
        }
        if self.embeddings.dimension == 0 {
            return Err(PortfolioChatError::ConfigError(
                "embeddings.dimension must be greater than 0".to_string(),
            ));
        }
        if self.rag.top_k == 0 {
            return Err(PortfolioChatError::ConfigError(
                "rag.top_k must be greater than 0".to_string(),
            ));
        }
        if self.ingest.batch_size == 0 {
            return Err(PortfolioChatError::ConfigError(
                "ingest.batch_size must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(PortfolioChatError::ConfigError(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_output_tokens == 0 {
            return Err(PortfolioChatError::ConfigError(
                "llm.max_output_tokens must be greater than 0".to_string(),
            ));
        }

        let mut endpoints = vec![
            ("embeddings.endpoint", self.embeddings.endpoint.as_str()),
            ("llm.endpoint", self.llm.endpoint.as_str()),
            (
                "vector_store.control_plane_endpoint",
                self.vector_store.control_plane_endpoint.as_str(),
            ),
        ];
        // Index hosts are checked in the form the client will use
        let index_host = self.vector_store.index_host.as_deref().map(normalize_host);
        if let Some(host) = &index_host {
            endpoints.push(("vector_store.index_host", host.as_str()));
        }
        for (key, value) in endpoints {
            url::Url::parse(value).map_err(|e| {
                PortfolioChatError::ConfigError(format!("{key} is not a valid URL ({value}): {e}"))
            })?;
        }

        Ok(())
    }

    /// Check what a bare Gemini call (model listing) needs
    pub fn validate_llm_access(&self) -> crate::Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(PortfolioChatError::ConfigError(format!(
                "llm.api_key is empty (set {GOOGLE_API_KEY_VAR})"
            )));
        }
        url::Url::parse(&self.llm.endpoint).map_err(|e| {
            PortfolioChatError::ConfigError(format!(
                "llm.endpoint is not a valid URL ({}): {e}",
                self.llm.endpoint
            ))
        })?;
        Ok(())
    }

    /// Copy safe to print: API keys are masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.embeddings.api_key = mask_secret(&config.embeddings.api_key);
        config.llm.api_key = mask_secret(&config.llm.api_key);
        config.vector_store.api_key = mask_secret(&config.vector_store.api_key);
        config
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.model
    }

    /// Get number of passages retrieved per query
    pub fn top_k(&self) -> usize {
        self.rag.top_k
    }

    /// Get the socket address the API server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}
