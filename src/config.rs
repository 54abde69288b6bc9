use crate::core::onnx_model::DEFAULT_REPO;
use crate::core::{EmbeddingBackend, EngineOptions, OnnxModelSpec};
use crate::error::MatchError;
use crate::models::{DomainBoosts, LexicalMode, ModifierConfig, ProviderToggles, ScoringConfig, WeightConfig};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub semantic: SemanticSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSettings {
    pub pool_size: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub default_top_k: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, f64>,
    #[serde(default = "default_domain_boosts")]
    pub domain_boosts: BTreeMap<String, f64>,
    #[serde(default)]
    pub modifiers: ModifierSettings,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            domain_boosts: default_domain_boosts(),
            modifiers: ModifierSettings::default(),
        }
    }
}

fn default_weights() -> BTreeMap<String, f64> {
    WeightConfig::default().into()
}

fn default_domain_boosts() -> BTreeMap<String, f64> {
    DomainBoosts::default().into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifierSettings {
    #[serde(default = "default_max_shift")]
    pub max_shift: f64,
    #[serde(default = "default_citation_weight")]
    pub citation_weight: f64,
    #[serde(default = "default_funding_weight")]
    pub funding_weight: f64,
    #[serde(default = "default_awards_weight")]
    pub awards_weight: f64,
}

impl Default for ModifierSettings {
    fn default() -> Self {
        Self {
            max_shift: default_max_shift(),
            citation_weight: default_citation_weight(),
            funding_weight: default_funding_weight(),
            awards_weight: default_awards_weight(),
        }
    }
}

fn default_max_shift() -> f64 { 0.12 }
fn default_citation_weight() -> f64 { 0.5 }
fn default_funding_weight() -> f64 { 0.3 }
fn default_awards_weight() -> f64 { 0.2 }

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_enabled")]
    pub lexical: bool,
    #[serde(default = "default_enabled")]
    pub semantic: bool,
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    /// "tfidf" or "bm25"
    #[serde(default)]
    pub lexical_mode: LexicalMode,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            lexical: default_enabled(),
            semantic: default_enabled(),
            max_keywords: default_max_keywords(),
            lexical_mode: LexicalMode::default(),
        }
    }
}

fn default_enabled() -> bool { true }
fn default_max_keywords() -> usize { 24 }

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticSettings {
    /// "onnx", "word_vectors" or "hashed"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// HuggingFace repository of the ONNX model
    #[serde(default = "default_model")]
    pub model: String,
    pub model_path: Option<PathBuf>,
    pub tokenizer_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Hashed backend only
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    pub vectors_path: Option<PathBuf>,
}

impl Default for SemanticSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            model_path: None,
            tokenizer_path: None,
            cache_dir: None,
            max_length: default_max_length(),
            dimensions: default_dimensions(),
            vectors_path: None,
        }
    }
}

fn default_backend() -> String { "onnx".to_string() }
fn default_model() -> String { DEFAULT_REPO.to_string() }
fn default_max_length() -> usize { 256 }
fn default_dimensions() -> usize { 256 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

/// Scoring threads when none are configured: available cores, at most 8
fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(8)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FACMATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FACMATCH__ENGINE__POOL_SIZE -> engine.pool_size
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Validated scoring configuration; rejects bad weights before any scoring runs
    pub fn scoring_config(&self) -> Result<ScoringConfig, MatchError> {
        let config = ScoringConfig {
            weights: WeightConfig::from_named(&self.scoring.weights)?,
            boosts: DomainBoosts::new(self.scoring.domain_boosts.clone())?,
            modifiers: ModifierConfig {
                max_shift: self.scoring.modifiers.max_shift,
                citation_weight: self.scoring.modifiers.citation_weight,
                funding_weight: self.scoring.modifiers.funding_weight,
                awards_weight: self.scoring.modifiers.awards_weight,
            },
            providers: ProviderToggles {
                lexical: self.providers.lexical,
                semantic: self.providers.semantic,
            },
            max_keywords: self.providers.max_keywords,
            lexical_mode: self.providers.lexical_mode,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn embedding_backend(&self) -> Result<EmbeddingBackend, MatchError> {
        match self.semantic.backend.trim().to_lowercase().as_str() {
            "onnx" => Ok(EmbeddingBackend::Onnx(OnnxModelSpec {
                repo: self.semantic.model.clone(),
                model_path: self.semantic.model_path.clone(),
                tokenizer_path: self.semantic.tokenizer_path.clone(),
                cache_dir: self.semantic.cache_dir.clone(),
                max_length: self.semantic.max_length,
            })),
            "hashed" => Ok(EmbeddingBackend::Hashed {
                dimensions: self.semantic.dimensions,
            }),
            "word_vectors" => self
                .semantic
                .vectors_path
                .clone()
                .map(|path| EmbeddingBackend::WordVectors { path })
                .ok_or_else(|| {
                    MatchError::Config("semantic.vectors_path is required for the word_vectors backend".to_string())
                }),
            other => Err(MatchError::Config(format!("unknown semantic backend '{}'", other))),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            pool_size: Some(self.engine.pool_size.unwrap_or_else(default_pool_size)),
            timeout: self.engine.timeout_ms.map(Duration::from_millis),
            default_top_k: self.engine.default_top_k,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("FACMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
