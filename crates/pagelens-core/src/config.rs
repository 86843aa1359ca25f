//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (nested keys split on `__`, e.g.
//! `APP_QUERY__TOP_K=5`). Provides a helper to expand `~` and `${VAR}`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;
use crate::types::QueryParams;

pub const DEFAULT_CHUNK_SIZE: usize = 420;
pub const DEFAULT_OVERLAP: usize = 60;
pub const DEFAULT_HASHING_DIM: usize = 384;
pub const DEFAULT_MAX_LEN: usize = 256;
pub const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";
/// Widest accepted smoothing sigma. Far beyond any document length, the
/// kernel is already flat.
pub const MAX_SMOOTHING: f32 = 10_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub query: QueryParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP }
    }
}

/// Which backend to try first.
///
/// `Auto` tries the transformer and falls back to hashing; `Transformer`
/// refuses to fall back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    #[default]
    Auto,
    Hashing,
    Transformer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub backend: BackendPreference,
    pub model_dir: String,
    pub hashing_dim: usize,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            model_dir: DEFAULT_MODEL_DIR.to_string(),
            hashing_dim: DEFAULT_HASHING_DIM,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl EmbeddingSettings {
    pub fn model_path(&self) -> PathBuf {
        expand_path(&self.model_dir)
    }
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        let ChunkingSettings { chunk_size, overlap } = self.chunking;
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::InvalidChunking { chunk_size, overlap });
        }
        if self.embedding.hashing_dim == 0 {
            return Err(Error::InvalidConfig("embedding.hashing_dim must be positive".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be positive".into()));
        }
        if self.query.top_k == 0 {
            return Err(Error::InvalidConfig("query.top_k must be positive".into()));
        }
        if !self.query.threshold.is_finite() {
            return Err(Error::InvalidConfig("query.threshold must be finite".into()));
        }
        check_smoothing(self.query.smoothing)
    }
}

/// Sigma must be finite and no wider than [`MAX_SMOOTHING`]. Zero or
/// negative values are fine and disable smoothing.
pub fn check_smoothing(sigma: f32) -> crate::error::Result<()> {
    if !sigma.is_finite() || sigma > MAX_SMOOTHING {
        return Err(Error::InvalidSmoothing(sigma));
    }
    Ok(())
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::debug!(env = other, "no environment-specific config file"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the typed settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
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
