use crate::error::MatchError;
use crate::models::signals::Signal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base weight per signal
///
/// Weights need not sum to one; the weight resolver renormalizes them for
/// each pair. Every signal always has an entry, possibly zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightConfig {
    weights: BTreeMap<Signal, f64>,
}

impl WeightConfig {
    /// Build a config from explicit signal weights; missing signals get zero
    pub fn new(weights: impl IntoIterator<Item = (Signal, f64)>) -> Result<Self, MatchError> {
        let mut map: BTreeMap<Signal, f64> = Signal::ALL.iter().map(|s| (*s, 0.0)).collect();
        for (signal, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::Config(format!(
                    "weight for '{}' must be a non-negative number, got {}",
                    signal, weight
                )));
            }
            map.insert(signal, weight);
        }
        Ok(Self { weights: map })
    }

    /// Build a config from signal names, rejecting unknown names
    pub fn from_named(weights: &BTreeMap<String, f64>) -> Result<Self, MatchError> {
        let parsed = weights
            .iter()
            .map(|(name, weight)| Ok((name.parse::<Signal>()?, *weight)))
            .collect::<Result<Vec<_>, MatchError>>()?;
        Self::new(parsed)
    }

    pub fn get(&self, signal: Signal) -> f64 {
        self.weights.get(&signal).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        self.weights.iter().map(|(s, w)| (*s, *w))
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (Signal::Lexical, 0.30),
                (Signal::Semantic, 0.20),
                (Signal::Keyword, 0.20),
                (Signal::Structured, 0.30),
            ]),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightConfig {
    type Error = MatchError;

    fn try_from(value: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_named(&value)
    }
}

impl From<WeightConfig> for BTreeMap<String, f64> {
    fn from(value: WeightConfig) -> Self {
        value
            .weights
            .into_iter()
            .map(|(s, w)| (s.as_str().to_string(), w))
            .collect()
    }
}

/// Research-area keyword to multiplicative boost on the interest signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct DomainBoosts {
    entries: BTreeMap<String, f64>,
}

impl DomainBoosts {
    pub fn new(entries: BTreeMap<String, f64>) -> Result<Self, MatchError> {
        let mut normalized = BTreeMap::new();
        for (keyword, factor) in entries {
            let keyword = keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(MatchError::Config("domain boost keyword must not be empty".to_string()));
            }
            if !factor.is_finite() || factor <= 0.0 {
                return Err(MatchError::Config(format!(
                    "domain boost for '{}' must be a positive number, got {}",
                    keyword, factor
                )));
            }
            normalized.insert(keyword, factor);
        }
        Ok(Self { entries: normalized })
    }

    pub fn empty() -> Self {
        Self { entries: BTreeMap::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DomainBoosts {
    /// High-demand research areas
    fn default() -> Self {
        let entries = [
            ("machine learning", 1.2),
            ("artificial intelligence", 1.2),
            ("deep learning", 1.2),
            ("quantum computing", 1.2),
            ("natural language processing", 1.15),
            ("computer vision", 1.15),
            ("reinforcement learning", 1.15),
            ("robotics", 1.1),
            ("data mining", 1.1),
            ("data science", 1.1),
            ("cybersecurity", 1.1),
            ("blockchain", 1.1),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for DomainBoosts {
    type Error = MatchError;

    fn try_from(value: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DomainBoosts> for BTreeMap<String, f64> {
    fn from(value: DomainBoosts) -> Self {
        value.entries
    }
}

/// Independent switches for the expensive providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderToggles {
    #[serde(default = "default_true")]
    pub lexical: bool,
    #[serde(default = "default_true")]
    pub semantic: bool,
}

impl Default for ProviderToggles {
    fn default() -> Self {
        Self {
            lexical: true,
            semantic: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// How the lexical signal scores a pair against the faculty batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexicalMode {
    /// Cosine similarity of smoothed TF-IDF vectors
    #[default]
    TfIdf,
    /// Okapi BM25 of the resume terms, divided by the best score in the batch
    Bm25,
}

/// Bounds for the profile-quality modifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierConfig {
    /// Largest fraction of the base score the combined modifiers may add
    pub max_shift: f64,
    pub citation_weight: f64,
    pub funding_weight: f64,
    pub awards_weight: f64,
}

impl ModifierConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.max_shift.is_finite() || !(0.0..=1.0).contains(&self.max_shift) {
            return Err(MatchError::Config(format!(
                "modifier max_shift must be within [0, 1], got {}",
                self.max_shift
            )));
        }
        for (name, weight) in [
            ("citation_weight", self.citation_weight),
            ("funding_weight", self.funding_weight),
            ("awards_weight", self.awards_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::Config(format!(
                    "modifier {} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            max_shift: 0.12,
            citation_weight: 0.5,
            funding_weight: 0.3,
            awards_weight: 0.2,
        }
    }
}

/// Complete, validated scoring configuration for one matching run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: WeightConfig,
    pub boosts: DomainBoosts,
    pub modifiers: ModifierConfig,
    pub providers: ProviderToggles,
    pub lexical_mode: LexicalMode,
    pub max_keywords: usize,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        self.modifiers.validate()?;
        if self.max_keywords == 0 {
            return Err(MatchError::Config("max_keywords must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Copy of this config with request-time overrides applied
    pub fn with_overrides(&self, weights: Option<&WeightConfig>, providers: Option<ProviderToggles>) -> Self {
        let mut config = self.clone();
        if let Some(weights) = weights {
            config.weights = weights.clone();
        }
        if let Some(providers) = providers {
            config.providers = providers;
        }
        config
    }
}

/// Partial scoring configuration layered over a base config
///
/// Lets the evaluation harness compare whole aggregator setups (boosts and
/// modifiers on or off, another lexical mode) rather than weights alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverlay {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub weights: Option<WeightConfig>,
    #[serde(default)]
    pub domain_boosts: Option<DomainBoosts>,
    #[serde(default)]
    pub modifiers: Option<ModifierConfig>,
    #[serde(default)]
    pub providers: Option<ProviderToggles>,
    #[serde(default)]
    pub lexical_mode: Option<LexicalMode>,
}

impl ConfigOverlay {
    /// Copy of `base` with every set field replaced
    pub fn apply(&self, base: &ScoringConfig) -> ScoringConfig {
        let mut config = base.with_overrides(self.weights.as_ref(), self.providers);
        if let Some(boosts) = &self.domain_boosts {
            config.boosts = boosts.clone();
        }
        if let Some(modifiers) = self.modifiers {
            config.modifiers = modifiers;
        }
        if let Some(mode) = self.lexical_mode {
            config.lexical_mode = mode;
        }
        config
    }
}

impl From<WeightConfig> for ConfigOverlay {
    fn from(weights: WeightConfig) -> Self {
        Self {
            weights: Some(weights),
            ..Default::default()
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: WeightConfig::default(),
            boosts: DomainBoosts::default(),
            modifiers: ModifierConfig::default(),
            providers: ProviderToggles::default(),
            lexical_mode: LexicalMode::default(),
            max_keywords: 24,
        }
    }
}
