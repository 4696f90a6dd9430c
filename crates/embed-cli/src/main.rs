//! transformers-embed
//!
//! Embeds documents or a query with a local sentence-transformers model.
//!
//! # Usage
//!
//! ```bash
//! transformers-embed documents "first text" "second text"
//! cat corpus.txt | transformers-embed --batch-size 64 documents
//! transformers-embed query "what is ownership?"
//! transformers-embed info
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/transformers-embed/config.toml)
//! 3. Environment variables (EMBED_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use embed_cli::{
    handle_documents, handle_query, init_logging, load_settings, show_info, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref(), &cli.overrides)?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Documents { texts, pretty } => {
            handle_documents(&settings, texts, pretty).await?;
        }
        Commands::Query { text, pretty } => {
            handle_query(&settings, &text, pretty).await?;
        }
        Commands::Info => {
            show_info(&settings)?;
        }
    }

    Ok(())
}
