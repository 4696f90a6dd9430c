//! CLI argument parsing for transformers-embed.
//!
//! CLI flags override all other config sources.

use clap::{Args, Parser, Subcommand};

/// Local sentence embeddings
///
/// Embeds documents or a query with a local transformer model and prints
/// the vectors as JSON.
#[derive(Parser, Debug)]
#[command(name = "transformers-embed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/transformers-embed/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub overrides: EmbedOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Adapter settings that can be overridden per invocation
#[derive(Args, Debug, Clone, Default)]
pub struct EmbedOverrides {
    /// Model identifier (e.g. Xenova/all-MiniLM-L6-v2)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Maximum documents per pipeline call
    #[arg(short, long, global = true)]
    pub batch_size: Option<usize>,

    /// Keep newlines instead of replacing them with spaces
    #[arg(long, global = true)]
    pub keep_newlines: bool,

    /// Deadline for each pipeline call, in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Directory for downloaded model files
    #[arg(long, global = true)]
    pub cache_dir: Option<String>,
}

/// Embedding commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed documents (arguments, or one per stdin line when none given)
    Documents {
        /// Texts to embed
        texts: Vec<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Embed a single query
    Query {
        /// Query text
        text: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show resolved settings and model repository
    Info,
}
