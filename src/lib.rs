//! Faculty Match - explainable resume-to-faculty matching engine
//!
//! Scores a parsed student resume against a batch of faculty profiles with
//! several independent similarity signals, combines them with configurable,
//! self-rebalancing weights and returns a deterministic ranked list with a
//! per-signal breakdown. An offline harness measures ranking quality against
//! labelled data.

pub mod config;
pub mod core;
pub mod error;
pub mod evaluation;
pub mod models;

// Re-export commonly used types
pub use crate::core::{EngineOptions, MatchEngine, Matcher, ModelHandle};
pub use error::MatchError;
pub use evaluation::{evaluate, synthetic_cases, EvaluationReport, GroundTruthCase};
pub use models::{
    FacultyId, FacultyProfile, MatchOptions, MatchRequest, MatchResponse, MatchResult, ResumeProfile, ScoringConfig,
    Signal, WeightConfig,
};
