//! # embed-transformers
//!
//! Document and query embeddings from a local transformer model.
//!
//! Texts are split into batches, run through a feature-extraction pipeline
//! with mean pooling and L2 normalization, and returned as plain `Vec<f32>`
//! vectors in input order.
//!
//! ## Features
//! - Local inference via Candle (no Python, no API)
//! - all-MiniLM-L6-v2 by default (384 dimensions)
//! - Pipeline loaded once per adapter, on first use
//! - Automatic model file caching
//! - Pluggable [`PipelineFactory`] for other backends
//!
//! ## Usage
//!
//! ```rust,ignore
//! use embed_transformers::{EmbeddingsParams, TransformersEmbeddings};
//!
//! let embeddings = TransformersEmbeddings::new(EmbeddingsParams::default())?;
//! let vectors = embeddings.embed_documents(&["hello\nworld".to_string()]).await?;
//! let query = embeddings.embed_query("greeting").await?;
//! ```

pub mod adapter;
pub mod cache;
pub mod candle;
pub mod chunk;
pub mod embeddings;
pub mod error;
pub mod pipeline;

pub use crate::candle::{CandlePipeline, CandlePipelineFactory};
pub use adapter::{strip_new_lines, TransformersEmbeddings};
pub use cache::{get_or_download_model, resolve_repo_id, ModelCache, ModelPaths, MODEL_FILES};
pub use chunk::{chunk_array, chunk_slices};
pub use embed_types::{EmbeddingsParams, Settings};
pub use embeddings::Embeddings;
pub use error::EmbeddingError;
pub use pipeline::{
    ExtractionOptions, FeatureExtractionPipeline, ModelInfo, PipelineFactory, PipelineOutput,
    PipelineTask, Pooling,
};
