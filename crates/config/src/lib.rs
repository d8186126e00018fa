//! Configuration management
//!
//! Loads and saves the assistant's settings as JSON under `~/.concierge`,
//! with environment variables taking precedence for credentials.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, conversations_dir, data_dir};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Language model endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

/// Vector knowledge store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_host: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: default_index_name(),
            index_host: None,
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            top_k: default_top_k(),
            max_context_length: default_max_context_length(),
        }
    }
}

fn default_index_name() -> String {
    "business-knowledge".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    512
}

fn default_top_k() -> usize {
    3
}

fn default_max_context_length() -> usize {
    2000
}

/// Assistant behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_prompt_variant")]
    pub prompt_variant: String,
    #[serde(default = "default_true")]
    pub use_tools: bool,
    #[serde(default)]
    pub use_rag: bool,
    #[serde(default)]
    pub seed_sample_booking: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            prompt_variant: default_prompt_variant(),
            use_tools: true,
            use_rag: false,
            seed_sample_booking: false,
        }
    }
}

fn default_prompt_variant() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// Conversation store
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversationsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub conversations: ConversationsConfig,
}

impl Config {
    /// Load from the default location and apply environment overrides
    pub async fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path()).await?;
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific file; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(&config_path()).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.model.api_key = key;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.model.model = model;
        }
        if let Some(base) = get("OPENAI_API_BASE") {
            self.model.api_base = Some(base);
        }
        if let Some(key) = get("PINECONE_API_KEY") {
            self.retrieval.api_key = key;
        }
        if let Some(name) = get("PINECONE_INDEX_NAME") {
            self.retrieval.index_name = name;
        }
        if let Some(host) = get("PINECONE_INDEX_HOST") {
            self.retrieval.index_host = Some(host);
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.model.api_key.is_empty()
    }

    /// Retrieval needs both the vector store key and the model key for embeddings
    pub fn retrieval_configured(&self) -> bool {
        !self.retrieval.api_key.is_empty() && self.has_api_key()
    }

    pub fn conversations_dir(&self) -> PathBuf {
        match &self.conversations.dir {
            Some(dir) => expand_home(dir),
            None => conversations_dir(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Write the default config (if absent) and create the data directories
pub async fn init() -> Result<Config> {
    let path = config_path();

    if path.exists() {
        warn!("config already exists at {:?}", path);
    } else {
        Config::default().save().await?;
        info!("config written to {:?}", path);
    }

    let config = Config::load().await?;
    paths::ensure_dir(&config.conversations_dir()).await?;
    Ok(config)
}
