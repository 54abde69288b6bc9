use crate::models::domain::{FacultyProfile, ResumeProfile};
use crate::models::scoring::{ProviderToggles, WeightConfig};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Per-request knobs; anything left `None` falls back to the engine defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Number of results to return; `None` returns every faculty member
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Personalized base weights, used instead of the configured defaults
    #[serde(default)]
    pub weights: Option<WeightConfig>,
    #[serde(default)]
    pub providers: Option<ProviderToggles>,
}

impl MatchOptions {
    pub fn top_k(k: usize) -> Self {
        Self {
            top_k: Some(k),
            ..Default::default()
        }
    }
}

/// Request to rank a batch of faculty against one resume
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[validate(nested)]
    pub resume: ResumeProfile,
    #[serde(default)]
    #[validate(nested)]
    pub faculty: Vec<FacultyProfile>,
    #[serde(flatten)]
    pub options: MatchOptions,
}

impl MatchRequest {
    pub fn new(resume: ResumeProfile, faculty: Vec<FacultyProfile>) -> Self {
        Self {
            resume,
            faculty,
            options: MatchOptions::default(),
        }
    }
}
