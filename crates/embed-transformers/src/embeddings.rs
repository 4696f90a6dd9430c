//! Generic embeddings interface.
//!
//! Retrieval components depend on this trait rather than on a concrete model.

use async_trait::async_trait;

use crate::adapter::TransformersEmbeddings;
use crate::error::EmbeddingError;

/// Trait for document and query embedders.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed documents, one vector per text in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[async_trait]
impl Embeddings for TransformersEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        TransformersEmbeddings::embed_documents(self, texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        TransformersEmbeddings::embed_query(self, text).await
    }
}
