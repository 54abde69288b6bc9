use crate::config::Settings;
use crate::core::{embedding::ModelHandle, matcher::Matcher};
use crate::error::MatchError;
use crate::models::{FacultyProfile, MatchOptions, MatchRequest, MatchResponse, ResumeProfile, ScoringConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runtime limits for the async engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Scoring threads; `None` uses rayon's global pool
    pub pool_size: Option<usize>,
    /// Whole-call deadline; the call fails rather than returning partial results
    pub timeout: Option<Duration>,
    /// Applied when a request does not set its own `top_k`
    pub default_top_k: Option<usize>,
}

/// Async front of the matcher
///
/// Owns the lazily loaded embedding model and runs the CPU-bound scoring on
/// the blocking pool, so callers on the tokio runtime never stall.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    matcher: Matcher,
    models: Arc<ModelHandle>,
    options: EngineOptions,
}

/// Raises the cancellation flag when the awaiting future goes away
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl MatchEngine {
    /// Create an engine; the scoring config is validated here, before any request runs
    pub fn new(config: ScoringConfig, models: Arc<ModelHandle>, options: EngineOptions) -> Result<Self, MatchError> {
        config.validate()?;
        let mut matcher = Matcher::new(config);
        if let Some(pool_size) = options.pool_size {
            matcher = matcher.with_pool_size(pool_size)?;
        }
        Ok(Self {
            matcher,
            models,
            options,
        })
    }

    /// Engine configured from loaded settings; the model is loaded on first use
    pub fn from_settings(settings: &Settings) -> Result<Self, MatchError> {
        let models = ModelHandle::new(settings.embedding_backend()?);
        Self::new(settings.scoring_config()?, Arc::new(models), settings.engine_options())
    }

    pub fn config(&self) -> &ScoringConfig {
        self.matcher.config()
    }

    pub fn models(&self) -> &ModelHandle {
        &self.models
    }

    /// Load the embedding model now instead of on the first request
    pub async fn warm_up(&self) -> bool {
        self.models.get().await.is_some()
    }

    /// Rank the faculty batch of a request
    pub async fn rank(&self, request: MatchRequest) -> Result<MatchResponse, MatchError> {
        let MatchRequest {
            resume,
            faculty,
            options,
        } = request;
        self.find_matches(resume, faculty, options).await
    }

    /// Find and rank matches for a resume
    ///
    /// # Arguments
    /// * `resume` - The student's parsed resume
    /// * `faculty` - The full faculty batch for this request
    /// * `options` - Per-request overrides
    ///
    /// # Returns
    /// A complete ranked response, or a single error. On timeout or when the
    /// returned future is dropped, in-flight scoring is abandoned and nothing
    /// partial is returned.
    pub async fn find_matches(
        &self,
        resume: ResumeProfile,
        faculty: Vec<FacultyProfile>,
        mut options: MatchOptions,
    ) -> Result<MatchResponse, MatchError> {
        let started = Instant::now();
        if options.top_k.is_none() {
            options.top_k = self.options.default_top_k;
        }

        let semantic_enabled = options
            .providers
            .map_or(self.config().providers.semantic, |p| p.semantic);

        let cancel = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(Arc::clone(&cancel));
        let flag = Arc::clone(&cancel);

        debug!(
            "Matching resume {:?} against {} faculty",
            resume.name.as_deref().unwrap_or("<unnamed>"),
            faculty.len()
        );

        // The deadline covers the first-use model load as well as scoring
        let work = async {
            let model = if semantic_enabled { self.models.get().await } else { None };
            let matcher = self.matcher.clone().with_model(model);
            tokio::task::spawn_blocking(move || matcher.find_matches(&resume, &faculty, &options, &flag)).await
        };

        let joined = match self.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(joined) => joined,
                Err(_) => {
                    cancel.store(true, Ordering::Relaxed);
                    warn!("Matching timed out after {:?}, discarding partial results", limit);
                    return Err(MatchError::Timeout(limit));
                }
            },
            None => work.await,
        };

        let response = joined.map_err(|e| MatchError::Worker(e.to_string()))??;

        info!(
            "Returning {} matches out of {} candidates in {:?}",
            response.matches.len(),
            response.total_candidates,
            started.elapsed()
        );

        Ok(response)
    }
}
