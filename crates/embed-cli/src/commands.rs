//! Command implementations for transformers-embed.
//!
//! Handles:
//! - documents: embed texts from arguments or stdin
//! - query: embed one query text
//! - info: print resolved settings

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use embed_transformers::{resolve_repo_id, TransformersEmbeddings};
use embed_types::Settings;

use crate::cli::EmbedOverrides;

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    overrides: &EmbedOverrides,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    apply_overrides(&mut settings, overrides);
    settings
        .embeddings
        .validate()
        .context("Invalid embedding settings")?;
    Ok(settings)
}

/// Apply per-invocation overrides to loaded settings.
pub fn apply_overrides(settings: &mut Settings, overrides: &EmbedOverrides) {
    if let Some(model) = &overrides.model {
        settings.embeddings.model_name = model.clone();
    }
    if let Some(batch_size) = overrides.batch_size {
        settings.embeddings.batch_size = batch_size;
    }
    if overrides.keep_newlines {
        settings.embeddings.strip_new_lines = false;
    }
    if let Some(timeout_ms) = overrides.timeout_ms {
        settings.embeddings.timeout_ms = Some(timeout_ms);
    }
    if let Some(cache_dir) = &overrides.cache_dir {
        settings.cache_dir = cache_dir.clone();
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout carries only JSON.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Read one document per non-empty line.
pub fn read_documents<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut documents = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        if !line.trim().is_empty() {
            documents.push(line);
        }
    }
    Ok(documents)
}

/// Serialize `value` as JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Embed documents given as arguments, or read from stdin when none are given.
pub async fn handle_documents(settings: &Settings, texts: Vec<String>, pretty: bool) -> Result<()> {
    let texts = if texts.is_empty() {
        read_documents(io::stdin().lock())?
    } else {
        texts
    };

    let embeddings = TransformersEmbeddings::from_settings(settings)?;
    let vectors = embeddings
        .embed_documents(&texts)
        .await
        .context("Failed to embed documents")?;

    info!(count = vectors.len(), "Embedded documents");
    write_json(io::stdout().lock(), &vectors, pretty)
}

/// Embed a single query.
pub async fn handle_query(settings: &Settings, text: &str, pretty: bool) -> Result<()> {
    let embeddings = TransformersEmbeddings::from_settings(settings)?;
    let vector = embeddings
        .embed_query(text)
        .await
        .context("Failed to embed query")?;

    if let Some(model) = embeddings.model_info() {
        info!(model = %model.name, dim = vector.len(), "Embedded query");
    }
    write_json(io::stdout().lock(), &vector, pretty)
}

#[derive(Serialize)]
struct InfoReport<'a> {
    settings: &'a Settings,
    repository: String,
}

/// Print resolved settings and the Hub repository the model maps to.
pub fn show_info(settings: &Settings) -> Result<()> {
    let repository = resolve_repo_id(&settings.embeddings.model_name)?;
    let report = InfoReport {
        settings,
        repository,
    };
    write_json(io::stdout().lock(), &report, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut settings = Settings::default();
        let overrides = EmbedOverrides {
            model: Some("BAAI/bge-small-en-v1.5".to_string()),
            batch_size: Some(16),
            keep_newlines: true,
            timeout_ms: Some(1500),
            cache_dir: Some("/tmp/models".to_string()),
        };

        apply_overrides(&mut settings, &overrides);

        assert_eq!(settings.embeddings.model_name, "BAAI/bge-small-en-v1.5");
        assert_eq!(settings.embeddings.batch_size, 16);
        assert!(!settings.embeddings.strip_new_lines);
        assert_eq!(settings.embeddings.timeout_ms, Some(1500));
        assert_eq!(settings.cache_dir, "/tmp/models");
    }

    #[test]
    fn test_empty_overrides_keep_settings() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &EmbedOverrides::default());
        assert_eq!(settings.embeddings, Settings::default().embeddings);
    }

    #[test]
    fn test_read_documents_skips_blank_lines() {
        let input = "first doc\n\n   \nsecond doc\n";
        let docs = read_documents(input.as_bytes()).unwrap();
        assert_eq!(docs, vec!["first doc".to_string(), "second doc".to_string()]);
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_json(&mut out, &vec![vec![0.5f32, 1.0], vec![0.25, 0.0]], false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[[0.5,1.0],[0.25,0.0]]\n");
    }
}
