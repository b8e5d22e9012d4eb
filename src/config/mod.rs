
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub ollama: OllamaConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the input complaints CSV.
    pub path: PathBuf,
    /// Column holding the (cleaned) complaint narrative.
    pub narrative_column: String,
    /// Path prefix the corpus artifacts are persisted under.
    pub vector_store_path: PathBuf,
}

impl Default for DataConfig {
    #[inline]
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/filtered_complaints.csv"),
            narrative_column: "cleaned_narrative".to_string(),
            vector_store_path: PathBuf::from("vector_store/complaints"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 300,
            chunk_overlap: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Embedding model identity. Must match the model the corpus was built with.
    pub embedding_model: String,
    pub batch_size: u32,
}

impl Default for OllamaConfig {
    #[inline]
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            embedding_model: "nomic-embed-text:latest".to_string(),
            batch_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generation model identity.
    pub model: String,
    /// Maximum tokens to generate per answer.
    pub max_length: u32,
    pub temperature: f32,
    /// Penalty applied to repeated tokens.
    pub repeat_penalty: f32,
    /// Lookback window for the repeat penalty.
    pub repeat_window: u32,
}

impl Default for GenerationConfig {
    #[inline]
    fn default() -> Self {
        Self {
            model: "llama3.2:latest".to_string(),
            max_length: 500,
            temperature: 0.3,
            repeat_penalty: 1.3,
            repeat_window: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            chunking: ChunkingConfig::default(),
            ollama: OllamaConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid chunk size: {0} (must be between 50 and 4096)")]
    InvalidChunkSize(usize),
    #[error("Invalid chunk overlap: {0} (must be smaller than chunk size {1})")]
    InvalidChunkOverlap(usize, usize),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid max generation length: {0} (must be between 16 and 4096)")]
    InvalidMaxLength(u32),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid top-k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvValue(&'static str, String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    /// Load configuration: defaults, overlaid by an optional TOML file,
    /// overlaid by environment variables.
    #[inline]
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = default_config_path();
                match default_path {
                    Some(path) if path.exists() => Self::from_file(&path)?,
                    _ => Self::default(),
                }
            }
        };

        config
            .apply_env_overrides()
            .context("Failed to apply environment overrides")?;

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Environment variables recognized as overrides for the config surface.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_parse::<usize>("CHUNK_SIZE")? {
            self.chunking.chunk_size = v;
        }
        if let Some(v) = env_parse::<usize>("CHUNK_OVERLAP")? {
            self.chunking.chunk_overlap = v;
        }
        if let Some(v) = env::var_os("EMBEDDING_MODEL_NAME") {
            self.ollama.embedding_model = v.to_string_lossy().into_owned();
        }
        if let Some(v) = env::var_os("LLM_MODEL_NAME") {
            self.generation.model = v.to_string_lossy().into_owned();
        }
        if let Some(v) = env::var_os("VECTOR_STORE_PATH") {
            self.data.vector_store_path = PathBuf::from(v);
        }
        if let Some(v) = env::var_os("DATA_PATH") {
            self.data.path = PathBuf::from(v);
        }
        if let Some(v) = env_parse::<u32>("MAX_GENERATION_LENGTH")? {
            self.generation.max_length = v;
        }
        if let Some(v) = env_parse::<f32>("TEMPERATURE")? {
            self.generation.temperature = v;
        }
        if let Some(v) = env_parse::<usize>("TOP_K_RETRIEVAL")? {
            self.retrieval.top_k = v;
        }
        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(50..=4096).contains(&self.chunking.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(self.chunking.chunk_size));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::InvalidChunkOverlap(
                self.chunking.chunk_overlap,
                self.chunking.chunk_size,
            ));
        }

        self.ollama.validate()?;

        if self.generation.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.generation.model.clone()));
        }

        if !(16..=4096).contains(&self.generation.max_length) {
            return Err(ConfigError::InvalidMaxLength(self.generation.max_length));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidTemperature(self.generation.temperature));
        }

        if !(1..=100).contains(&self.retrieval.top_k) {
            return Err(ConfigError::InvalidTopK(self.retrieval.top_k));
        }

        Ok(())
    }

    /// Path of the persisted vector index artifact.
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        artifact_path(&self.data.vector_store_path, ".index")
    }

    /// Path of the persisted chunk metadata artifact.
    #[inline]
    pub fn metadata_path(&self) -> PathBuf {
        artifact_path(&self.data.vector_store_path, "_meta.json")
    }
}

impl OllamaConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    #[inline]
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }
}

/// Append a suffix to the final path component of the store prefix.
fn artifact_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    name.push_str(suffix);
    prefix.with_file_name(name)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("complaint-insights").join("config.toml"))
}

fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue(key, raw)),
        Err(_) => Ok(None),
    }
}
