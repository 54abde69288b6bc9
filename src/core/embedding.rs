use crate::core::onnx_model::{resolve_model_paths, OnnxEmbeddingModel, OnnxModelSpec};
use crate::core::text::{tokenize, words};
use crate::error::MatchError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Dense text encoder used by the semantic provider
///
/// Implementations are immutable after construction and shared across
/// scoring threads.
pub trait EmbeddingModel: Send + Sync {
    fn name(&self) -> &str;
    fn dimensions(&self) -> usize;
    /// Encode text into a vector of `dimensions()` values; an all-zero vector
    /// means the text carried nothing the model recognises
    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError>;
}

impl fmt::Debug for dyn EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingModel")
            .field("name", &self.name())
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

pub fn cosine_similarity(vec_a: &[f32], vec_b: &[f32]) -> Option<f64> {
    if vec_a.len() != vec_b.len() || vec_a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (a, b) in vec_a.iter().zip(vec_b) {
        let (a, b) = (*a as f64, *b as f64);
        dot += a * b;
        norm_a += a * a;
        norm_b += b * b;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// 64-bit FNV-1a
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Feature-hashing embedder over word unigrams and character trigrams
///
/// Offline backend for tests and air-gapped runs: it needs no model files but
/// only sees surface overlap, not meaning. Each feature lands in one bucket
/// with a hash-derived sign.
#[derive(Debug, Clone)]
pub struct HashedNgramModel {
    dimensions: usize,
}

impl HashedNgramModel {
    pub const DEFAULT_DIMENSIONS: usize = 256;

    pub fn new(dimensions: usize) -> Result<Self, MatchError> {
        if dimensions == 0 {
            return Err(MatchError::Config("embedding dimensions must be at least 1".to_string()));
        }
        Ok(Self { dimensions })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl EmbeddingModel for HashedNgramModel {
    fn name(&self) -> &str {
        "hashed-ngram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            self.add_feature(&mut vector, &format!("w:{}", token), 1.0);
            let padded: Vec<char> = format!("<{}>", token).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut vector, &format!("c:{}", gram), 0.5);
            }
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

/// Averaged pre-trained word vectors (GloVe text format)
#[derive(Debug, Clone)]
pub struct WordVectorModel {
    name: String,
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordVectorModel {
    /// Parse `word v1 v2 ... vn` lines; every vector must have the same length
    pub fn parse(name: &str, contents: &str) -> Result<Self, MatchError> {
        let mut vectors = HashMap::new();
        let mut dimensions = 0usize;

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let word = match parts.next() {
                Some(word) => word.to_lowercase(),
                None => continue,
            };
            let values = parts
                .map(str::parse::<f32>)
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| {
                    MatchError::ModelUnavailable(format!("{}: line {}: {}", name, line_no + 1, e))
                })?;

            if values.is_empty() {
                return Err(MatchError::ModelUnavailable(format!(
                    "{}: line {}: word '{}' has no vector",
                    name,
                    line_no + 1,
                    word
                )));
            }
            if dimensions == 0 {
                dimensions = values.len();
            } else if values.len() != dimensions {
                return Err(MatchError::ModelUnavailable(format!(
                    "{}: line {}: expected {} dimensions, found {}",
                    name,
                    line_no + 1,
                    dimensions,
                    values.len()
                )));
            }
            vectors.insert(word, values);
        }

        if vectors.is_empty() {
            return Err(MatchError::ModelUnavailable(format!("{}: no word vectors found", name)));
        }

        Ok(Self {
            name: name.to_string(),
            dimensions,
            vectors,
        })
    }

    pub fn load(path: &Path) -> Result<Self, MatchError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MatchError::ModelUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::parse(&path.display().to_string(), &contents)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectors.len()
    }
}

impl EmbeddingModel for WordVectorModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        let mut sum = vec![0.0f32; self.dimensions];
        let mut found = 0usize;
        for word in words(text) {
            if let Some(vector) = self.vectors.get(&word) {
                sum.iter_mut().zip(vector).for_each(|(s, v)| *s += v);
                found += 1;
            }
        }
        if found > 0 {
            sum.iter_mut().for_each(|s| *s /= found as f32);
        }
        Ok(sum)
    }
}

/// Which embedding model to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Transformer sentence embeddings through ONNX Runtime
    Onnx(OnnxModelSpec),
    Hashed { dimensions: usize },
    WordVectors { path: PathBuf },
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        EmbeddingBackend::Onnx(OnnxModelSpec::default())
    }
}

async fn load_backend(backend: &EmbeddingBackend) -> Result<Arc<dyn EmbeddingModel>, MatchError> {
    match backend {
        EmbeddingBackend::Onnx(spec) => {
            let paths = resolve_model_paths(spec).await?;
            let (name, max_length) = (spec.repo.clone(), spec.max_length);
            let model = tokio::task::spawn_blocking(move || OnnxEmbeddingModel::load(&paths, &name, max_length))
                .await
                .map_err(|e| MatchError::ModelUnavailable(format!("model loader panicked: {}", e)))??;
            Ok(Arc::new(model))
        }
        EmbeddingBackend::Hashed { dimensions } => Ok(Arc::new(HashedNgramModel::new(*dimensions)?)),
        EmbeddingBackend::WordVectors { path } => {
            let path = path.clone();
            let model = tokio::task::spawn_blocking(move || WordVectorModel::load(&path))
                .await
                .map_err(|e| MatchError::ModelUnavailable(format!("model loader panicked: {}", e)))??;
            Ok(Arc::new(model))
        }
    }
}

/// Process-wide embedding model slot
///
/// The model is loaded at most once, on first use. Concurrent first callers
/// await the same in-flight load. A failed load is remembered, so the
/// semantic provider stays disabled for the rest of the process and the
/// failure is logged only once.
pub struct ModelHandle {
    backend: EmbeddingBackend,
    model: OnceCell<Option<Arc<dyn EmbeddingModel>>>,
}

impl ModelHandle {
    pub fn new(backend: EmbeddingBackend) -> Self {
        Self {
            backend,
            model: OnceCell::new(),
        }
    }

    /// Handle around an already constructed model
    pub fn preloaded(model: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: OnceCell::new_with(Some(Some(model))),
        }
    }

    /// Handle whose model is known to be unavailable
    pub fn disabled() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: OnceCell::new_with(Some(None)),
        }
    }

    pub fn backend(&self) -> &EmbeddingBackend {
        &self.backend
    }

    /// Load the model if needed; `None` when loading failed
    pub async fn get(&self) -> Option<Arc<dyn EmbeddingModel>> {
        self.model
            .get_or_init(|| async {
                match load_backend(&self.backend).await {
                    Ok(model) => {
                        info!(
                            "Embedding model {} loaded ({} dimensions)",
                            model.name(),
                            model.dimensions()
                        );
                        Some(model)
                    }
                    Err(e) => {
                        warn!("{}; semantic signal disabled for this process", e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Whether a load has been attempted
    pub fn is_initialized(&self) -> bool {
        self.model.initialized()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("backend", &self.backend)
            .field("initialized", &self.model.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0f32, 0.0, 0.0];
        let b = [1.0f32, 0.0, 0.0];
        let c = [-1.0f32, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&a, &c).unwrap() + 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), None);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), None);
    }

    #[test]
    fn test_hashed_model_is_deterministic_and_normalized() {
        let model = HashedNgramModel::new(128).unwrap();
        let first = model.embed("Machine Learning").unwrap();
        let second = model.embed("Machine Learning").unwrap();
        assert_eq!(first, second);
        let norm: f32 = first.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashed_model_prefers_shared_words() {
        let model = HashedNgramModel::new(256).unwrap();
        let resume = model.embed("machine learning computer vision").unwrap();
        let close = model.embed("machine learning ai ethics").unwrap();
        let far = model.embed("databases systems").unwrap();
        let close_sim = cosine_similarity(&resume, &close).unwrap();
        let far_sim = cosine_similarity(&resume, &far).unwrap();
        assert!(close_sim > far_sim);
    }

    #[test]
    fn test_hashed_model_empty_text_is_zero() {
        let model = HashedNgramModel::new(32).unwrap();
        assert!(model.embed("the of").unwrap().iter().all(|x| *x == 0.0));
        assert!(HashedNgramModel::new(0).is_err());
    }

    #[test]
    fn test_word_vectors_parse_and_average() {
        let model = WordVectorModel::parse("inline", "robot 1 0\nvision 0 1\n\n").unwrap();
        assert_eq!(model.dimensions(), 2);
        assert_eq!(model.vocabulary_size(), 2);
        assert_eq!(model.embed("Robot Vision").unwrap(), vec![0.5, 0.5]);
        assert_eq!(model.embed("unknown").unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_word_vectors_reject_ragged_rows() {
        let err = WordVectorModel::parse("inline", "robot 1 0\nvision 0\n").unwrap_err();
        assert!(matches!(err, MatchError::ModelUnavailable(_)));

        let err = WordVectorModel::parse("inline", "robot one two\n").unwrap_err();
        assert!(matches!(err, MatchError::ModelUnavailable(_)));

        let err = WordVectorModel::parse("inline", "").unwrap_err();
        assert!(matches!(err, MatchError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_handle_loads_word_vectors_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "robotics 0.5 0.5 0.0").unwrap();
        let handle = ModelHandle::new(EmbeddingBackend::WordVectors {
            path: file.path().to_path_buf(),
        });

        assert!(!handle.is_initialized());
        let model = handle.get().await.expect("model should load");
        assert_eq!(model.dimensions(), 3);
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_handle_missing_file_disables_model() {
        let handle = ModelHandle::new(EmbeddingBackend::WordVectors {
            path: PathBuf::from("/nonexistent/vectors.txt"),
        });
        assert!(handle.get().await.is_none());
        // second call reuses the cached failure
        assert!(handle.get().await.is_none());
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_onnx_default_with_unreadable_files_disables_model() {
        assert!(matches!(EmbeddingBackend::default(), EmbeddingBackend::Onnx(_)));

        let handle = ModelHandle::new(EmbeddingBackend::Onnx(OnnxModelSpec {
            model_path: Some(PathBuf::from("/nonexistent/model.onnx")),
            tokenizer_path: Some(PathBuf::from("/nonexistent/tokenizer.json")),
            ..Default::default()
        }));
        assert!(handle.get().await.is_none());
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_load() {
        let handle = Arc::new(ModelHandle::new(EmbeddingBackend::Hashed { dimensions: 64 }));
        let (a, b) = tokio::join!(handle.get(), handle.get());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }
}
