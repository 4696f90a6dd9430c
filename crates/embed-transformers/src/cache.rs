//! Model file caching.
//!
//! Resolves model identifiers to HuggingFace Hub repositories and keeps the
//! files the candle pipeline needs in a local cache directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::EmbeddingError;

/// Required model files
pub const MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Xenova repos ship ONNX weights only.
const ONNX_ONLY_OWNER: &str = "Xenova";

/// Owner of the safetensors originals of the Xenova sentence models.
const SAFETENSORS_OWNER: &str = "sentence-transformers";

/// Map a model identifier onto a Hub repository carrying safetensors weights.
///
/// Bare names (`all-MiniLM-L6-v2`) and `Xenova/<name>` resolve to
/// `sentence-transformers/<name>`; any other `owner/name` is used as is.
///
/// Only the identifier's form is checked here. A Xenova model without a
/// sentence-transformers counterpart resolves fine and then fails at download
/// time with [`EmbeddingError::Download`]. The candle pipeline also loads BERT
/// architectures only, so MPNet or RoBERTa repositories (e.g.
/// `all-mpnet-base-v2`) resolve but are rejected when the weights load.
pub fn resolve_repo_id(model_name: &str) -> Result<String, EmbeddingError> {
    let trimmed = model_name.trim();
    let invalid = || EmbeddingError::configuration(format!("invalid model identifier '{}'", model_name));

    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) || trimmed.contains("..") {
        return Err(invalid());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    match parts.as_slice() {
        [name] if !name.is_empty() => Ok(format!("{}/{}", SAFETENSORS_OWNER, name)),
        [owner, name] if !owner.is_empty() && !name.is_empty() => {
            if *owner == ONNX_ONLY_OWNER {
                Ok(format!("{}/{}", SAFETENSORS_OWNER, name))
            } else {
                Ok(trimmed.to_string())
            }
        }
        _ => Err(invalid()),
    }
}

/// Model cache configuration
#[derive(Debug, Clone)]
pub struct ModelCache {
    /// Cache directory path
    pub cache_dir: PathBuf,
    /// Model repository ID
    pub repo_id: String,
}

/// Default cache root when no directory is configured.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("transformers-embed")
        .join("models")
}

impl ModelCache {
    /// Create a new model cache with custom settings
    pub fn new(cache_dir: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repo_id: repo_id.into(),
        }
    }

    /// Cache for a model identifier, resolving it to its Hub repository.
    pub fn for_model(cache_dir: impl Into<PathBuf>, model_name: &str) -> Result<Self, EmbeddingError> {
        Ok(Self::new(cache_dir, resolve_repo_id(model_name)?))
    }

    /// Get the model directory path
    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir.join(self.repo_id.replace('/', "_"))
    }

    /// Check if all model files are cached
    pub fn is_cached(&self) -> bool {
        let model_dir = self.model_dir();
        MODEL_FILES.iter().all(|f| model_dir.join(f).exists())
    }

    /// Get path to a specific model file
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.model_dir().join(filename)
    }
}

/// Paths to model files
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelPaths {
    fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        }
    }
}

/// Get or download model files.
///
/// Returns paths to config.json, tokenizer.json, and model.safetensors.
pub fn get_or_download_model(cache: &ModelCache) -> Result<ModelPaths, EmbeddingError> {
    let model_dir = cache.model_dir();

    if cache.is_cached() {
        debug!(path = ?model_dir, "Using cached model");
    } else {
        info!(repo = %cache.repo_id, "Downloading model files...");
        download_model_files(cache)?;
    }

    Ok(ModelPaths::in_dir(&model_dir))
}

/// Download model files from HuggingFace Hub
fn download_model_files(cache: &ModelCache) -> Result<(), EmbeddingError> {
    use hf_hub::api::sync::Api;

    let api = Api::new().map_err(|e| EmbeddingError::Download(e.to_string()))?;
    let repo = api.model(cache.repo_id.clone());

    std::fs::create_dir_all(cache.model_dir())?;

    for filename in MODEL_FILES {
        info!(file = filename, "Downloading...");
        let source_path = repo
            .get(filename)
            .map_err(|e| EmbeddingError::Download(format!("{}: {}", filename, e)))?;

        let dest_path = cache.file_path(filename);
        std::fs::copy(&source_path, &dest_path)?;
        debug!(file = filename, "Downloaded to {:?}", dest_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_xenova_to_sentence_transformers() {
        assert_eq!(
            resolve_repo_id("Xenova/all-MiniLM-L6-v2").unwrap(),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn test_resolve_bare_and_custom_owner() {
        assert_eq!(
            resolve_repo_id("all-MiniLM-L12-v2").unwrap(),
            "sentence-transformers/all-MiniLM-L12-v2"
        );
        assert_eq!(resolve_repo_id("BAAI/bge-small-en-v1.5").unwrap(), "BAAI/bge-small-en-v1.5");
    }

    #[test]
    fn test_resolve_rejects_malformed() {
        for bad in ["", "  ", "a/b/c", "/name", "owner/", "has space/x", "../etc"] {
            let err = resolve_repo_id(bad).unwrap_err();
            assert!(err.is_configuration(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_model_dir_layout() {
        let temp = TempDir::new().unwrap();
        let cache = ModelCache::for_model(temp.path(), "Xenova/all-MiniLM-L6-v2").unwrap();
        assert_eq!(
            cache.model_dir(),
            temp.path().join("sentence-transformers_all-MiniLM-L6-v2")
        );
        assert!(default_cache_dir().to_string_lossy().contains("transformers-embed"));
    }

    #[test]
    fn test_is_cached_empty() {
        let temp = TempDir::new().unwrap();
        let cache = ModelCache::new(temp.path(), "test/model");
        assert!(!cache.is_cached());
    }

    #[test]
    fn test_cached_files_skip_download() {
        let temp = TempDir::new().unwrap();
        let cache = ModelCache::new(temp.path(), "test/model");
        std::fs::create_dir_all(cache.model_dir()).unwrap();
        for file in MODEL_FILES {
            std::fs::write(cache.file_path(file), b"{}").unwrap();
        }
        assert!(cache.is_cached());

        let paths = get_or_download_model(&cache).unwrap();
        assert_eq!(paths.tokenizer, cache.file_path("tokenizer.json"));
        assert_eq!(paths.weights, cache.file_path("model.safetensors"));
    }
}
