// Model exports
pub mod domain;
pub mod requests;
pub mod responses;
pub mod scoring;
pub mod signals;

pub use domain::{Award, CitationMetrics, Education, FacultyId, FacultyProfile, Funding, Publication, ResumeProfile};
pub use requests::{MatchOptions, MatchRequest};
pub use responses::{MatchResponse, MatchResult, QualityModifiers, SignalContribution};
pub use scoring::{
    ConfigOverlay, DomainBoosts, LexicalMode, ModifierConfig, ProviderToggles, ScoringConfig, WeightConfig,
};
pub use signals::{RawScore, Signal, SignalScore};
