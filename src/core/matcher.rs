use crate::core::{
    embedding::EmbeddingModel,
    keywords::KeywordExtractor,
    normalizer::normalize,
    providers::{ProfileFeatures, ProviderSet},
    ranker::rank,
    scoring::{aggregate, quality_modifiers},
    weights::{domain_boost, resolve_weights},
};
use crate::error::MatchError;
use crate::models::{
    FacultyId, FacultyProfile, MatchOptions, MatchResponse, MatchResult, ResumeProfile, ScoringConfig, SignalScore,
};
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

/// Main matching orchestrator - runs the scoring pipeline for one request
///
/// # Pipeline Stages
/// 1. Input validation (whole batch, before any scoring)
/// 2. Feature extraction and per-request lexical corpus
/// 3. Parallel per-pair provider scoring and normalization
/// 4. Weight resolution and aggregation
/// 5. Ranking
///
/// Cloning is cheap; the configuration, model and pool are shared.
#[derive(Debug, Clone)]
pub struct Matcher {
    config: Arc<ScoringConfig>,
    model: Option<Arc<dyn EmbeddingModel>>,
    extractor: KeywordExtractor,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Matcher {
    pub fn new(config: ScoringConfig) -> Self {
        let extractor = KeywordExtractor::new(config.max_keywords);
        Self {
            config: Arc::new(config),
            model: None,
            extractor,
            pool: None,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(ScoringConfig::default())
    }

    /// Inject the process-wide embedding model; `None` disables the semantic signal
    pub fn with_model(mut self, model: Option<Arc<dyn EmbeddingModel>>) -> Self {
        self.model = model;
        self
    }

    /// Score pairs on a dedicated pool of `pool_size` threads instead of rayon's global pool
    pub fn with_pool_size(mut self, pool_size: usize) -> Result<Self, MatchError> {
        if pool_size == 0 {
            return Err(MatchError::Config("pool_size must be at least 1".to_string()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size)
            .thread_name(|i| format!("facmatch-score-{}", i))
            .build()
            .map_err(|e| MatchError::Worker(e.to_string()))?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    /// Same model and pool under another configuration
    pub fn with_config(&self, config: ScoringConfig) -> Self {
        Self {
            extractor: KeywordExtractor::new(config.max_keywords),
            config: Arc::new(config),
            model: self.model.clone(),
            pool: self.pool.clone(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Find and rank matches for a resume
    ///
    /// # Arguments
    /// * `resume` - The student's parsed resume
    /// * `faculty` - Every faculty profile to consider
    /// * `options` - Per-request top-k, weight and provider overrides
    /// * `cancel` - Checked before each pair; once raised the call fails with `Cancelled`
    ///
    /// # Returns
    /// The complete ranked response, or the first batch-level error
    pub fn find_matches(
        &self,
        resume: &ResumeProfile,
        faculty: &[FacultyProfile],
        options: &MatchOptions,
        cancel: &AtomicBool,
    ) -> Result<MatchResponse, MatchError> {
        let config = self
            .config
            .with_overrides(options.weights.as_ref(), options.providers);
        config.validate()?;
        validate_batch(resume, faculty)?;

        let total_candidates = faculty.len();
        let matches = if faculty.is_empty() {
            debug!("Empty candidate set, returning no matches");
            vec![]
        } else {
            let scored = self.install(|| self.score_batch(&config, resume, faculty, cancel))?;
            rank(scored, options.top_k)
        };

        Ok(MatchResponse {
            request_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            total_candidates,
            matches,
        })
    }

    fn install<T, F>(&self, op: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn score_batch(
        &self,
        config: &ScoringConfig,
        resume: &ResumeProfile,
        faculty: &[FacultyProfile],
        cancel: &AtomicBool,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let resume_features = ProfileFeatures::from_resume(resume, &self.extractor);
        let faculty_features: Vec<ProfileFeatures> = faculty
            .par_iter()
            .map(|f| ProfileFeatures::from_faculty(f, &self.extractor))
            .collect();

        let providers = ProviderSet::build(config, self.model.as_ref(), &resume_features, &faculty_features);
        let boost = domain_boost(&config.boosts, &resume.research_interests);
        debug!(
            "Scoring {} faculty with signals {:?}, domain boost {}",
            faculty.len(),
            providers.active_signals(),
            boost
        );

        faculty
            .par_iter()
            .zip(faculty_features.par_iter())
            .map(|(profile, features)| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(MatchError::Cancelled);
                }
                Ok(score_pair(config, &providers, boost, profile, features))
            })
            .collect()
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_config()
    }
}

/// Score one (resume, faculty) pair; never fails, missing evidence is recorded as unavailable
fn score_pair(
    config: &ScoringConfig,
    providers: &ProviderSet,
    boost: f64,
    profile: &FacultyProfile,
    features: &ProfileFeatures,
) -> MatchResult {
    let scores: Vec<SignalScore> = providers
        .score_all(features)
        .into_iter()
        .map(|(signal, raw)| normalize(signal, raw))
        .collect();

    let weights = resolve_weights(&config.weights, &scores, boost);
    let modifiers = quality_modifiers(profile, &config.modifiers);
    let aggregate = aggregate(&scores, &weights, &modifiers);

    MatchResult {
        faculty_id: profile.id.clone(),
        name: profile.name.clone(),
        university: profile.university.clone(),
        department: profile.department.clone(),
        rank: 0,
        overall_score: aggregate.overall_score,
        base_score: aggregate.base_score,
        domain_boost: boost,
        fallback: weights.fallback,
        breakdown: aggregate.breakdown,
        modifiers,
    }
}

/// Batch-level input checks; any failure aborts the request before scoring
pub fn validate_batch(resume: &ResumeProfile, faculty: &[FacultyProfile]) -> Result<(), MatchError> {
    resume.validate()?;

    let mut seen: BTreeSet<&FacultyId> = BTreeSet::new();
    for profile in faculty {
        profile
            .validate()
            .map_err(|e| MatchError::Input(format!("faculty {}: {}", profile.id, e)))?;

        if profile.funding.iter().filter_map(|f| f.amount).any(|a| !a.is_finite()) {
            return Err(MatchError::Input(format!(
                "faculty {}: funding amount must be a finite number",
                profile.id
            )));
        }

        if !seen.insert(&profile.id) {
            return Err(MatchError::Input(format!("duplicate faculty id {}", profile.id)));
        }
    }
    Ok(())
}
