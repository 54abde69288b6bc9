// ONNX sentence-embedding model
//
// Runs a sentence-transformers export (all-MiniLM-L6-v2 by default) through
// ONNX Runtime: tokenize, run the session, mean-pool the token states over the
// attention mask, then L2-normalize. Model files come from a local path or are
// fetched once from the HuggingFace Hub into its cache.

use crate::core::embedding::{l2_normalize, EmbeddingModel};
use crate::error::MatchError;
use hf_hub::api::tokio::ApiBuilder;
use ndarray::{Array2, Axis};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

pub const DEFAULT_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";
const MODEL_FILE: &str = "onnx/model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const OUTPUT_NAME: &str = "last_hidden_state";

/// Where to find the ONNX model and its tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnnxModelSpec {
    /// HuggingFace repository holding `onnx/model.onnx` and `tokenizer.json`
    pub repo: String,
    /// Local model file; skips the download when set together with `tokenizer_path`
    pub model_path: Option<PathBuf>,
    pub tokenizer_path: Option<PathBuf>,
    /// Hub cache directory; the hub default when unset
    pub cache_dir: Option<PathBuf>,
    /// Longest token sequence fed to the model
    pub max_length: usize,
}

impl Default for OnnxModelSpec {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.to_string(),
            model_path: None,
            tokenizer_path: None,
            cache_dir: None,
            max_length: 256,
        }
    }
}

/// Paths to the model files on disk
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

/// Resolve the model files, downloading them when no local paths are configured
pub async fn resolve_model_paths(spec: &OnnxModelSpec) -> Result<ModelPaths, MatchError> {
    if let (Some(model), Some(tokenizer)) = (&spec.model_path, &spec.tokenizer_path) {
        return Ok(ModelPaths {
            model: model.clone(),
            tokenizer: tokenizer.clone(),
        });
    }

    let mut builder = ApiBuilder::new();
    if let Some(dir) = &spec.cache_dir {
        builder = builder.with_cache_dir(dir.clone());
    }
    let api = builder
        .build()
        .map_err(|e| MatchError::ModelUnavailable(format!("hub client: {}", e)))?;
    let repo = api.model(spec.repo.clone());

    info!("Fetching embedding model {} (cached after the first run)", spec.repo);
    let model = repo
        .get(MODEL_FILE)
        .await
        .map_err(|e| MatchError::ModelUnavailable(format!("{}/{}: {}", spec.repo, MODEL_FILE, e)))?;
    let tokenizer = repo
        .get(TOKENIZER_FILE)
        .await
        .map_err(|e| MatchError::ModelUnavailable(format!("{}/{}: {}", spec.repo, TOKENIZER_FILE, e)))?;

    Ok(ModelPaths { model, tokenizer })
}

/// Mean-pooled transformer sentence embeddings
pub struct OnnxEmbeddingModel {
    // Session::run needs exclusive access
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    name: String,
    dimensions: usize,
    token_type_ids: bool,
}

impl OnnxEmbeddingModel {
    /// Build the session and tokenizer; any failure is a `ModelUnavailable`
    ///
    /// # Arguments
    /// * `paths` - Model and tokenizer files
    /// * `name` - Name used in logs
    /// * `max_length` - Truncation length in tokens
    pub fn load(paths: &ModelPaths, name: &str, max_length: usize) -> Result<Self, MatchError> {
        let unavailable = |e: String| MatchError::ModelUnavailable(format!("{}: {}", name, e));

        let mut tokenizer = Tokenizer::from_file(&paths.tokenizer)
            .map_err(|e| unavailable(format!("tokenizer {}: {}", paths.tokenizer.display(), e)))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| unavailable(format!("tokenizer truncation: {}", e)))?;

        let session = create_session(&paths.model).map_err(|e| unavailable(e.to_string()))?;
        let token_type_ids = session.inputs.iter().any(|input| input.name == "token_type_ids");

        let mut model = Self {
            session: Mutex::new(session),
            tokenizer,
            name: name.to_string(),
            dimensions: 0,
            token_type_ids,
        };

        // The hidden size is read off a first inference
        let sample = model
            .encode_batch(&["warm up".to_string()])
            .map_err(|e| unavailable(e.to_string()))?;
        model.dimensions = sample.first().map_or(0, Vec::len);
        if model.dimensions == 0 {
            return Err(unavailable("model produced an empty embedding".to_string()));
        }

        info!("ONNX embedding model {} ready ({} dimensions)", name, model.dimensions);
        Ok(model)
    }

    /// Encode a batch of texts into L2-normalized sentence embeddings
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MatchError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let failed = |e: String| MatchError::Worker(format!("{} inference: {}", self.name, e));

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| failed(e.to_string()))?;
        let batch_size = encodings.len();
        let seq_length = encodings.first().map_or(0, |e| e.len());
        debug!("Embedding batch of {} texts, sequence length {}", batch_size, seq_length);

        let mut ids = Vec::with_capacity(batch_size * seq_length);
        let mut mask = Vec::with_capacity(batch_size * seq_length);
        let mut type_ids = Vec::with_capacity(batch_size * seq_length);
        for encoding in &encodings {
            ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));
        }

        let shape = (batch_size, seq_length);
        let to_tensor = |values: Vec<i64>| {
            let array = Array2::from_shape_vec(shape, values).map_err(|e| failed(e.to_string()))?;
            Tensor::from_array(array).map_err(|e| failed(e.to_string()))
        };
        let ids_tensor = to_tensor(ids)?;
        let mask_tensor = to_tensor(mask.clone())?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| failed("session lock poisoned".to_string()))?;
        let outputs = if self.token_type_ids {
            let type_tensor = to_tensor(type_ids)?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])
        }
        .map_err(|e| failed(e.to_string()))?;

        let hidden = outputs[OUTPUT_NAME]
            .try_extract_array::<f32>()
            .map_err(|e| failed(e.to_string()))?;
        if hidden.ndim() != 3 {
            return Err(failed(format!("unexpected output shape {:?}", hidden.shape())));
        }

        let mut embeddings = Vec::with_capacity(batch_size);
        for (i, tokens) in hidden.axis_iter(Axis(0)).enumerate() {
            let mut pooled = vec![0.0f32; tokens.shape()[1]];
            let mut count = 0.0f32;
            for (j, state) in tokens.axis_iter(Axis(0)).enumerate() {
                if mask[i * seq_length + j] == 0 {
                    continue;
                }
                pooled.iter_mut().zip(state.iter()).for_each(|(p, v)| *p += v);
                count += 1.0;
            }
            if count > 0.0 {
                pooled.iter_mut().for_each(|p| *p /= count);
            }
            l2_normalize(&mut pooled);
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

fn create_session(model_path: &Path) -> ort::Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(model_path)
}

impl EmbeddingModel for OnnxEmbeddingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        self.encode_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| MatchError::Worker(format!("{} returned no embedding", self.name)))
    }
}
