//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_RETRIEVAL__RRF_K=60`). Provides
//! typed [`Settings`] with defaults for every key, plus helpers to expand `~`
//! and `${VAR}` and to resolve relative paths against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::GenerationConfig;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load from the current working directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_in(Path::new("."))
    }

    /// Load `config.toml` and the env-specific overlay from `base_dir`.
    pub fn load_in(base_dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => tracing::debug!(env = %env_name, "no config overlay for environment"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir: base_dir.to_path_buf() })
    }

    /// Wrap an existing figment, e.g. one built from an inline TOML string.
    pub fn from_figment(figment: Figment, base_dir: &Path) -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment),
            base_dir: base_dir.to_path_buf(),
        }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings, Error> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a configured path against the directory the config was loaded from.
    pub fn resolve_path<S: AsRef<str>>(&self, p: S) -> PathBuf {
        resolve_with_base(&self.base_dir, p)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub dense: DenseSettings,
    pub sparse: SparseSettings,
    pub embedding: EmbeddingSettings,
    pub reranker: RerankerSettings,
    pub generation: GenerationSettings,
    pub batch: BatchSettings,
    pub http: HttpSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.retrieval.rrf_k == 0 {
            return Err(Error::InvalidConfig("retrieval.rrf_k must be at least 1".into()));
        }
        if self.batch.concurrency == 0 {
            return Err(Error::InvalidConfig("batch.concurrency must be at least 1".into()));
        }
        if self.dense.backend == DenseBackend::Pinecone && self.dense.pinecone_host.is_none() {
            return Err(Error::InvalidConfig("dense.pinecone_host is required for the pinecone backend".into()));
        }
        if self.sparse.backend == SparseBackend::OpenSearch && self.sparse.opensearch_url.is_none() {
            return Err(Error::InvalidConfig("sparse.opensearch_url is required for the opensearch backend".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Final number of documents handed to generation.
    pub top_k: usize,
    /// Per-source fetch size, RRF constant and fused-set bound.
    pub rrf_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5, rrf_k: 100 }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DenseBackend {
    #[default]
    Lancedb,
    Pinecone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseSettings {
    pub backend: DenseBackend,
    pub lancedb_dir: String,
    pub table: String,
    pub pinecone_host: Option<String>,
    pub pinecone_namespace: String,
    pub api_key: Option<String>,
}

impl Default for DenseSettings {
    fn default() -> Self {
        Self {
            backend: DenseBackend::Lancedb,
            lancedb_dir: "data/indexes/lancedb".to_string(),
            table: "chunks".to_string(),
            pinecone_host: None,
            pinecone_namespace: "default".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SparseBackend {
    #[default]
    Tantivy,
    OpenSearch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SparseSettings {
    pub backend: SparseBackend,
    pub tantivy_index_dir: String,
    pub opensearch_url: Option<String>,
    pub index: String,
}

impl Default for SparseSettings {
    fn default() -> Self {
        Self {
            backend: SparseBackend::Tantivy,
            tantivy_index_dir: "data/indexes/tantivy".to_string(),
            opensearch_url: None,
            index: "chunks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub query_prefix: String,
    pub max_len: usize,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/e5-base-v2".to_string(),
            query_prefix: "query: ".to_string(),
            max_len: 512,
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    pub model_dir: String,
    pub max_len: usize,
    pub use_fake: bool,
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self { model_dir: "models/bge-reranker-base".to_string(), max_len: 512, use_fake: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Token budget stated in the synthesis prompt.
    pub answer_token_budget: u32,
    pub extraction: GenerationConfig,
    pub answer: GenerationConfig,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/v1".to_string(),
            model: "tiiuae/falcon3-10b-instruct".to_string(),
            api_key: None,
            timeout_secs: 60,
            answer_token_budget: 300,
            extraction: GenerationConfig::extraction(),
            answer: GenerationConfig::answer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub concurrency: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { concurrency: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
