//! Feature-extraction pipeline interface.
//!
//! A pipeline turns a batch of raw strings into one vector per string.
//! Pipelines are built by a [`PipelineFactory`] keyed by model identifier.
//! Both calls are blocking; the adapter runs them on tokio's blocking pool.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::EmbeddingError;

/// Pipeline task requested from the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineTask {
    /// Per-text feature vectors (embeddings)
    FeatureExtraction,
}

impl PipelineTask {
    /// Task identifier as used by model hubs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineTask::FeatureExtraction => "feature-extraction",
        }
    }
}

impl fmt::Display for PipelineTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduction applied over token-level outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pooling {
    /// Token-level output, one vector per token (`[batch, tokens, dim]`)
    None,
    /// Return the first ([CLS]) token
    Cls,
    /// Mask-aware mean over real tokens
    #[default]
    Mean,
}

/// Options passed with each pipeline call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOptions {
    pub pooling: Pooling,
    /// L2-normalize each pooled vector
    pub normalize: bool,
}

impl ExtractionOptions {
    /// Mean pooling with unit-length output, as used for sentence embeddings.
    pub fn mean_normalized() -> Self {
        Self {
            pooling: Pooling::Mean,
            normalize: true,
        }
    }
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self::mean_normalized()
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model identifier (e.g., "sentence-transformers/all-MiniLM-L6-v2")
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Maximum sequence length in tokens
    pub max_sequence_length: usize,
}

/// Raw pipeline result: a row-major tensor of pooled vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    data: Vec<f32>,
    dims: Vec<usize>,
}

impl PipelineOutput {
    /// Wrap flat data with its dimensions.
    pub fn new(data: Vec<f32>, dims: Vec<usize>) -> Self {
        Self { data, dims }
    }

    /// Build a `[rows, dim]` output from nested rows.
    ///
    /// Rows of unequal length are rejected.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, EmbeddingError> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|row| row.len() != dim) {
            return Err(EmbeddingError::shape(
                format!("rows of length {}", dim),
                format!("row of length {}", bad.len()),
            ));
        }
        let count = rows.len();
        Ok(Self {
            data: rows.into_iter().flatten().collect(),
            dims: vec![count, dim],
        })
    }

    /// Tensor dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Convert into one vector per input, checking the shape is `[expected_rows, d]`
    /// with `d > 0`. Unpooled (rank-3) output is rejected.
    pub fn into_rows(self, expected_rows: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let (rows, dim) = match self.dims.as_slice() {
            [rows, dim] => (*rows, *dim),
            other => {
                return Err(EmbeddingError::shape(
                    format!("[{}, d]", expected_rows),
                    format!("{:?}", other),
                ))
            }
        };

        if rows != expected_rows || dim == 0 {
            return Err(EmbeddingError::shape(
                format!("[{}, d]", expected_rows),
                format!("[{}, {}]", rows, dim),
            ));
        }
        if self.data.len() != rows * dim {
            return Err(EmbeddingError::shape(
                format!("{} values", rows * dim),
                format!("{} values", self.data.len()),
            ));
        }

        Ok(self.data.chunks(dim).map(<[f32]>::to_vec).collect())
    }
}

/// A loaded feature-extraction pipeline.
///
/// Implementations must be thread-safe (Send + Sync) for concurrent use.
pub trait FeatureExtractionPipeline: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Embed a batch of texts. The output has one row per input, in order.
    fn extract(
        &self,
        texts: &[String],
        options: &ExtractionOptions,
    ) -> Result<PipelineOutput, EmbeddingError>;
}

/// Builds pipelines for a task and model identifier.
pub trait PipelineFactory: Send + Sync {
    /// Construct (load) a pipeline. Invalid identifiers fail with
    /// [`EmbeddingError::Configuration`].
    fn create(
        &self,
        task: PipelineTask,
        model_name: &str,
    ) -> Result<Arc<dyn FeatureExtractionPipeline>, EmbeddingError>;
}
