//! # embed-types
//!
//! Configuration types shared by the transformers-embed crates.
//!
//! - [`EmbeddingsParams`]: construction-time parameters of the embedding adapter
//! - [`Settings`]: layered application settings (defaults, file, env)
//!
//! ## Usage
//!
//! ```rust
//! use embed_types::EmbeddingsParams;
//!
//! let params = EmbeddingsParams::default().with_batch_size(64);
//! assert!(params.validate().is_ok());
//! ```

pub mod config;
pub mod error;

pub use config::{
    EmbeddingsParams, Settings, DEFAULT_BATCH_SIZE, DEFAULT_MODEL_NAME, ENV_PREFIX,
};
pub use error::ConfigError;
