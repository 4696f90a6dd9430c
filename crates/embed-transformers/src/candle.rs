//! Candle-based feature-extraction pipeline.
//!
//! Runs a sentence-transformers BERT model (all-MiniLM-L6-v2 by default) on
//! the CPU and pools token outputs into one vector per text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::cache::{default_cache_dir, get_or_download_model, ModelCache};
use crate::error::EmbeddingError;
use crate::pipeline::{
    ExtractionOptions, FeatureExtractionPipeline, ModelInfo, PipelineFactory, PipelineOutput,
    PipelineTask, Pooling,
};

/// Maximum sequence length
pub const MAX_SEQ_LENGTH: usize = 256;

/// Candle pipeline over a BERT-family sentence model.
pub struct CandlePipeline {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    info: ModelInfo,
}

impl CandlePipeline {
    /// Load the model from cache (downloading if needed).
    pub fn load(cache: &ModelCache) -> Result<Self, EmbeddingError> {
        let paths = get_or_download_model(cache)?;
        Self::load_from_paths(&cache.repo_id, &paths.config, &paths.tokenizer, &paths.weights)
    }

    /// Load from explicit file paths
    pub fn load_from_paths(
        name: &str,
        config_path: &Path,
        tokenizer_path: &Path,
        weights_path: &Path,
    ) -> Result<Self, EmbeddingError> {
        info!(model = %name, "Loading embedding model...");

        // GPU support can be added later with feature flags
        let device = Device::Cpu;

        let config_str = std::fs::read_to_string(config_path)?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::configuration(format!("invalid model config: {}", e)))?;
        let (dimension, max_positions) = read_dimensions(&config_str)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path.to_path_buf()], DType::F32, &device)?
        };

        let model = BertModel::load(vb, &config)?;

        let max_sequence_length = max_positions.min(MAX_SEQ_LENGTH);
        info!(
            dim = dimension,
            max_seq = max_sequence_length,
            "Model loaded successfully"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            info: ModelInfo {
                name: name.to_string(),
                dimension,
                max_sequence_length,
            },
        })
    }

    /// Mean pooling over token embeddings (excluding padding)
    fn mean_pooling(&self, embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor, EmbeddingError> {
        let mask = attention_mask
            .unsqueeze(2)?
            .broadcast_as(embeddings.shape())?;
        let mask_f32 = mask.to_dtype(DType::F32)?;

        let masked = embeddings.broadcast_mul(&mask_f32)?;
        let sum = masked.sum(1)?;

        // Divide by the number of real tokens
        let mask_sum = mask_f32.sum(1)?;
        let mask_sum = mask_sum.clamp(1e-9, f64::MAX)?;

        Ok(sum.broadcast_div(&mask_sum)?)
    }

    /// First-token ([CLS]) pooling
    fn cls_pooling(&self, embeddings: &Tensor) -> Result<Tensor, EmbeddingError> {
        Ok(embeddings.narrow(1, 0, 1)?.squeeze(1)?)
    }

    /// Tokenize and pad a batch to a common length.
    fn encode(&self, texts: &[String]) -> Result<(Tensor, Tensor), EmbeddingError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.info.max_sequence_length);

        let mut input_ids: Vec<u32> = Vec::with_capacity(texts.len() * max_len);
        let mut attention_masks: Vec<u32> = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();

            let truncated_len = ids.len().min(max_len);
            let mut padded_ids = ids[..truncated_len].to_vec();
            let mut padded_mask = mask[..truncated_len].to_vec();
            padded_ids.resize(max_len, 0);
            padded_mask.resize(max_len, 0);

            input_ids.extend(padded_ids);
            attention_masks.extend(padded_mask);
        }

        let shape = (texts.len(), max_len);
        let input_ids = Tensor::from_vec(input_ids, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(attention_masks, shape, &self.device)?;
        Ok((input_ids, attention_mask))
    }
}

impl FeatureExtractionPipeline for CandlePipeline {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn extract(
        &self,
        texts: &[String],
        options: &ExtractionOptions,
    ) -> Result<PipelineOutput, EmbeddingError> {
        if texts.is_empty() {
            return Ok(PipelineOutput::new(vec![], vec![0, self.info.dimension]));
        }

        debug!(count = texts.len(), "Embedding batch");

        let (input_ids, attention_mask) = self.encode(texts)?;
        let token_type_ids = input_ids.zeros_like()?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = match options.pooling {
            Pooling::Mean => self.mean_pooling(&output, &attention_mask)?,
            Pooling::Cls => self.cls_pooling(&output)?,
            Pooling::None => output,
        };

        let dims = pooled.dims().to_vec();
        let mut data: Vec<f32> = pooled.flatten_all()?.to_vec1()?;
        if options.normalize {
            if let Some(&dim) = dims.last() {
                data.chunks_mut(dim.max(1)).for_each(l2_normalize);
            }
        }

        debug!(count = texts.len(), dims = ?dims, "Batch complete");

        Ok(PipelineOutput::new(data, dims))
    }
}

/// Scale a vector to unit length. Zero vectors are left as is.
pub fn l2_normalize(values: &mut [f32]) {
    let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Read `hidden_size` and `max_position_embeddings` from a BERT config.
fn read_dimensions(config_str: &str) -> Result<(usize, usize), EmbeddingError> {
    let value: serde_json::Value = serde_json::from_str(config_str)
        .map_err(|e| EmbeddingError::configuration(format!("invalid model config: {}", e)))?;
    let field = |key: &str| {
        value
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize)
            .ok_or_else(|| EmbeddingError::configuration(format!("model config missing {}", key)))
    };
    Ok((field("hidden_size")?, field("max_position_embeddings")?))
}

/// Factory that loads [`CandlePipeline`]s from the local model cache.
#[derive(Debug, Clone)]
pub struct CandlePipelineFactory {
    cache_dir: PathBuf,
}

impl CandlePipelineFactory {
    /// Factory caching models under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Cache directory used for downloads.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl Default for CandlePipelineFactory {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

impl PipelineFactory for CandlePipelineFactory {
    fn create(
        &self,
        task: PipelineTask,
        model_name: &str,
    ) -> Result<Arc<dyn FeatureExtractionPipeline>, EmbeddingError> {
        match task {
            PipelineTask::FeatureExtraction => {
                let cache = ModelCache::for_model(&self.cache_dir, model_name)?;
                debug!(task = %task, repo = %cache.repo_id, "Creating pipeline");
                Ok(Arc::new(CandlePipeline::load(&cache)?))
            }
        }
    }
}
