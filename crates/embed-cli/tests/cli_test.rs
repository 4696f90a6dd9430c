//! CLI parsing and settings resolution tests.

use std::io::Write;

use clap::Parser;

use embed_cli::{load_settings, Cli, Commands};

#[test]
fn test_parse_documents_with_global_overrides() {
    let cli = Cli::try_parse_from([
        "transformers-embed",
        "documents",
        "first",
        "second",
        "--batch-size",
        "8",
        "--keep-newlines",
        "--model",
        "Xenova/all-MiniLM-L6-v2",
    ])
    .unwrap();

    assert_eq!(cli.overrides.batch_size, Some(8));
    assert!(cli.overrides.keep_newlines);
    assert_eq!(cli.overrides.model.as_deref(), Some("Xenova/all-MiniLM-L6-v2"));
    match cli.command {
        Commands::Documents { texts, pretty } => {
            assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
            assert!(!pretty);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_parse_documents_without_texts_reads_stdin() {
    let cli = Cli::try_parse_from(["transformers-embed", "documents"]).unwrap();
    assert!(matches!(cli.command, Commands::Documents { ref texts, .. } if texts.is_empty()));
}

#[test]
fn test_parse_query() {
    let cli = Cli::try_parse_from([
        "transformers-embed",
        "-l",
        "debug",
        "query",
        "what is a lifetime?",
        "--pretty",
        "--timeout-ms",
        "500",
    ])
    .unwrap();

    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert_eq!(cli.overrides.timeout_ms, Some(500));
    assert!(matches!(
        cli.command,
        Commands::Query { ref text, pretty: true } if text == "what is a lifetime?"
    ));
}

#[test]
fn test_query_requires_text() {
    assert!(Cli::try_parse_from(["transformers-embed", "query"]).is_err());
}

#[test]
fn test_load_settings_applies_cli_over_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "log_level = \"warn\"\n\n[embeddings]\nbatch_size = 64").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let cli = Cli::try_parse_from([
        "transformers-embed",
        "--config",
        path.as_str(),
        "--batch-size",
        "4",
        "info",
    ])
    .unwrap();

    let settings = load_settings(cli.config.as_deref(), Some("trace"), &cli.overrides).unwrap();
    assert_eq!(settings.embeddings.batch_size, 4);
    assert_eq!(settings.log_level, "trace");
}

#[test]
fn test_load_settings_rejects_zero_batch_override() {
    let cli = Cli::try_parse_from(["transformers-embed", "--batch-size", "0", "info"]).unwrap();
    assert!(load_settings(None, None, &cli.overrides).is_err());
}

#[test]
fn test_batch_size_flag_repairs_invalid_file_value() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[embeddings]\nbatch_size = 0").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let cli = Cli::try_parse_from([
        "transformers-embed",
        "--config",
        path.as_str(),
        "--batch-size",
        "4",
        "info",
    ])
    .unwrap();
    let settings = load_settings(cli.config.as_deref(), None, &cli.overrides).unwrap();
    assert_eq!(settings.embeddings.batch_size, 4);

    let cli = Cli::try_parse_from(["transformers-embed", "--config", path.as_str(), "info"]).unwrap();
    assert!(load_settings(cli.config.as_deref(), None, &cli.overrides).is_err());
}
