// Offline ranking-quality evaluation
pub mod harness;
pub mod metrics;
pub mod synthetic;

pub use harness::{evaluate, CaseReport, ConfigReport, EvaluationReport, GroundTruthCase, RelevanceLabel};
pub use metrics::{average_precision, diversity, ndcg_at_k, precision_at_k};
pub use synthetic::{synthetic_cases, synthetic_faculty};
