//! # embed-cli
//!
//! Command-line front end for the transformers-embed adapter.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, EmbedOverrides};
pub use commands::{
    apply_overrides, handle_documents, handle_query, init_logging, load_settings, read_documents,
    show_info, write_json,
};
