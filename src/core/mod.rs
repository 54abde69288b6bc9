// Core algorithm exports
pub mod embedding;
pub mod engine;
pub mod keywords;
pub mod matcher;
pub mod normalizer;
pub mod onnx_model;
pub mod providers;
pub mod ranker;
pub mod scoring;
pub mod text;
pub mod weights;

pub use embedding::{cosine_similarity, EmbeddingBackend, EmbeddingModel, HashedNgramModel, ModelHandle, WordVectorModel};
pub use engine::{EngineOptions, MatchEngine};
pub use keywords::{jaccard, KeywordExtractor};
pub use matcher::{validate_batch, Matcher};
pub use normalizer::normalize;
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelSpec};
pub use providers::{LexicalCorpus, ProfileFeatures, Provider, ProviderSet};
pub use ranker::rank;
pub use scoring::{aggregate, quality_modifiers, Aggregate};
pub use weights::{domain_boost, resolve_weights, ResolvedWeights};
