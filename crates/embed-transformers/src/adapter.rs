//! Document and query embeddings over a feature-extraction pipeline.
//!
//! [`TransformersEmbeddings`] batches input texts, sends each batch to the
//! pipeline with mean pooling and L2 normalization, and concatenates the
//! resulting vectors in input order.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use embed_types::{EmbeddingsParams, Settings};

use crate::candle::CandlePipelineFactory;
use crate::chunk::chunk_array;
use crate::error::EmbeddingError;
use crate::pipeline::{
    ExtractionOptions, FeatureExtractionPipeline, ModelInfo, PipelineFactory, PipelineTask,
};

/// Embeddings adapter backed by a lazily loaded local model.
///
/// The pipeline is created on first use and shared by every later call.
/// Concurrent first calls wait on the same initialization.
pub struct TransformersEmbeddings {
    params: EmbeddingsParams,
    factory: Arc<dyn PipelineFactory>,
    pipeline: OnceCell<Arc<dyn FeatureExtractionPipeline>>,
}

impl TransformersEmbeddings {
    /// Create an adapter using the candle pipeline and the default model cache.
    pub fn new(params: EmbeddingsParams) -> Result<Self, EmbeddingError> {
        Self::with_factory(params, Arc::new(CandlePipelineFactory::default()))
    }

    /// Create an adapter from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, EmbeddingError> {
        let factory = CandlePipelineFactory::new(settings.cache_path());
        Self::with_factory(settings.embeddings.clone(), Arc::new(factory))
    }

    /// Create an adapter with a custom pipeline factory.
    pub fn with_factory(
        params: EmbeddingsParams,
        factory: Arc<dyn PipelineFactory>,
    ) -> Result<Self, EmbeddingError> {
        params.validate()?;
        Ok(Self {
            params,
            factory,
            pipeline: OnceCell::new(),
        })
    }

    /// Adapter parameters.
    pub fn params(&self) -> &EmbeddingsParams {
        &self.params
    }

    /// Information about the loaded model, if the pipeline has been created.
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.pipeline.get().map(|pipeline| pipeline.info())
    }

    /// Embed documents, returning one vector per text in input order.
    ///
    /// Texts are sent in batches of at most `batch_size`. The first failing
    /// batch fails the whole call.
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let prepared: Vec<String> = if self.params.strip_new_lines {
            texts.iter().map(|text| strip_new_lines(text)).collect()
        } else {
            texts.to_vec()
        };

        let batches = chunk_array(&prepared, self.params.batch_size);
        debug!(
            count = texts.len(),
            batches = batches.len(),
            batch_size = self.params.batch_size,
            "Embedding documents"
        );

        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        let mut dimension: Option<usize> = None;

        for (index, batch) in batches.into_iter().enumerate() {
            let vectors = self.run_embedding(batch).await.inspect_err(|e| {
                warn!(batch = index, error = %e, "Embedding batch failed");
            })?;

            if let Some(first) = vectors.first() {
                let dim = *dimension.get_or_insert(first.len());
                if first.len() != dim {
                    return Err(EmbeddingError::shape(
                        format!("dimension {}", dim),
                        format!("dimension {} in batch {}", first.len(), index),
                    ));
                }
            }

            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Embed a single query text.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::inference("pipeline returned no vector for query"))
    }

    /// Get the shared pipeline, creating it on first use.
    ///
    /// Construction is not bounded by the timeout: an abandoned load would
    /// leave the cell empty while the model keeps loading, and the next
    /// caller would start a second one.
    async fn pipeline(&self) -> Result<Arc<dyn FeatureExtractionPipeline>, EmbeddingError> {
        let pipeline = self
            .pipeline
            .get_or_try_init(|| async {
                let factory = Arc::clone(&self.factory);
                let model_name = self.params.model_name.clone();
                info!(model = %model_name, "Initializing feature-extraction pipeline");
                tokio::task::spawn_blocking(move || {
                    factory.create(PipelineTask::FeatureExtraction, &model_name)
                })
                .await
                .unwrap_or_else(|e| Err(EmbeddingError::from(e)))
            })
            .await?;
        Ok(Arc::clone(pipeline))
    }

    /// Run one batch through the pipeline and validate its shape.
    async fn run_embedding(&self, batch: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let pipeline = self.pipeline().await?;
        let expected = batch.len();
        let output = self
            .run_blocking(move || pipeline.extract(&batch, &ExtractionOptions::mean_normalized()))
            .await?;
        output.into_rows(expected)
    }

    /// Run a blocking pipeline call off the async scheduler, under the
    /// configured deadline if any.
    ///
    /// On timeout the blocking task keeps running; its result is dropped.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T, EmbeddingError>
    where
        F: FnOnce() -> Result<T, EmbeddingError> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);
        match self.params.timeout() {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined?,
                Err(_) => Err(EmbeddingError::Timeout(limit)),
            },
            None => handle.await?,
        }
    }
}

/// Replace newline characters with spaces.
pub fn strip_new_lines(text: &str) -> String {
    text.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineOutput;

    struct UnitPipeline {
        info: ModelInfo,
    }

    impl FeatureExtractionPipeline for UnitPipeline {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn extract(
            &self,
            texts: &[String],
            _options: &ExtractionOptions,
        ) -> Result<PipelineOutput, EmbeddingError> {
            PipelineOutput::from_rows(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct UnitFactory;

    impl PipelineFactory for UnitFactory {
        fn create(
            &self,
            _task: PipelineTask,
            model_name: &str,
        ) -> Result<Arc<dyn FeatureExtractionPipeline>, EmbeddingError> {
            Ok(Arc::new(UnitPipeline {
                info: ModelInfo {
                    name: model_name.to_string(),
                    dimension: 2,
                    max_sequence_length: 16,
                },
            }))
        }
    }

    #[test]
    fn test_strip_new_lines() {
        assert_eq!(strip_new_lines("a\nb\n"), "a b ");
        assert_eq!(strip_new_lines("a\r\nb"), "a\r b");
    }

    #[test]
    fn test_zero_batch_size_is_configuration_error() {
        let params = EmbeddingsParams::default().with_batch_size(0);
        let err = TransformersEmbeddings::with_factory(params, Arc::new(UnitFactory))
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_model_info_after_first_call() {
        let embeddings =
            TransformersEmbeddings::with_factory(EmbeddingsParams::new("unit/model"), Arc::new(UnitFactory))
                .unwrap();
        assert!(embeddings.model_info().is_none());

        let vector = embeddings.embed_query("hello").await.unwrap();
        assert_eq!(vector, vec![1.0, 0.0]);

        let info = embeddings.model_info().unwrap();
        assert_eq!(info.name, "unit/model");
        assert_eq!(info.dimension, 2);
    }
}
