//! CLI entry point for the document index.
//!
//! Provides commands for adding, ingesting, searching and maintaining a
//! persistent TF-IDF index. Every command that reads the index opens it from
//! the configured directory, so each invocation sees what the last one saved.

use anyhow::{Context, anyhow};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use docvec::coordinator::{DocumentIndex, LoadReport};
use docvec::display::{
    THEME, TableBuilder, create_documents_table, create_progress_bar, create_results_table,
    create_stats_table, with_spinner,
};
use docvec::ingest::{IngestEvent, IngestQueue, collect_files};
use docvec::io::{ExitCode, OutputFormat, OutputManager};
use docvec::store::{Document, Metadata, MetadataValue};
use docvec::{IndexError, Settings, logging};
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize)]
struct IngestReport {
    indexed: Vec<IngestedFile>,
    failed: Vec<SkippedFile>,
    missing: Vec<PathBuf>,
    not_durable: usize,
}

#[derive(Debug, Serialize)]
struct IngestedFile {
    path: PathBuf,
    id: String,
}

#[derive(Debug, Serialize)]
struct SkippedFile {
    path: PathBuf,
    reason: String,
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Persistent TF-IDF document index
#[derive(Parser)]
#[command(
    name = "docvec",
    version = env!("CARGO_PKG_VERSION"),
    about = "Persistent TF-IDF document index with cosine search",
    long_about = "Store text documents, index them with TF-IDF, and find the most similar ones to a query.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ docvec init\n  $ docvec add \"Cats are small furry pets\"\n  $ docvec ingest notes/\n  $ docvec search \"furry pets\" -n 3"
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show how the index was loaded
    #[arg(long, global = true)]
    info: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .docvec directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Add one document from the command line
    #[command(
        about = "Add a document",
        after_help = "Examples:\n  docvec add \"Dogs are loyal companions\"\n  docvec add \"Quarterly results\" --id q3 --meta source=report --meta year=2024"
    )]
    Add {
        /// Document text
        text: String,

        /// Document id (generated as doc_<n> when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Metadata entry as key=value, repeatable
        #[arg(short, long = "meta", value_parser = parse_metadata_pair)]
        meta: Vec<(String, MetadataValue)>,
    },

    /// Ingest files or directories
    #[command(
        about = "Index text files from disk",
        long_about = "Index text files. Directories are walked recursively, honoring .gitignore and .docvecignore, and filtered by ingest.extensions."
    )]
    Ingest {
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Find documents similar to a query
    #[command(
        about = "Search documents by similarity",
        after_help = "JSON paths:\n  search   .data[].id\n  search   .data[].score"
    )]
    Search {
        /// Query text
        query: String,

        /// Maximum number of results (defaults to search.default_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// List stored documents
    #[command(about = "List every stored document")]
    List,

    /// Show one document
    #[command(about = "Show a document by id")]
    Get {
        /// Document id
        id: String,
    },

    /// Delete a document
    #[command(about = "Delete a document by id")]
    Delete {
        /// Document id
        id: String,
    },

    /// Show index statistics
    #[command(about = "Display index statistics")]
    Stats,

    /// Rebuild the vectorizer and index
    #[command(about = "Recompute the vectorizer and index from stored documents")]
    Rebuild,

    /// Show current configuration settings
    #[command(about = "Display active settings from .docvec/settings.toml")]
    Config,
}

fn parse_metadata_pair(raw: &str) -> Result<(String, MetadataValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("metadata key is empty in '{raw}'"));
    }
    Ok((key.to_string(), MetadataValue::parse(value.trim())))
}

fn main() {
    let cli = Cli::parse();
    let mut output = OutputManager::new(OutputFormat::from_json_flag(cli.json));

    let code = match run(cli, &mut output) {
        Ok(code) => code,
        Err(e) => report_failure(&mut output, &e),
    };
    debug!("Exiting with code {}: {}", code as u8, code.description());
    std::process::exit(code.into());
}

fn report_failure(output: &mut OutputManager, error: &anyhow::Error) -> ExitCode {
    let written = match error.downcast_ref::<IndexError>() {
        Some(index_error) => output.error(index_error),
        None => output.failure(ExitCode::GeneralError, &format!("{error:#}")),
    };
    written.unwrap_or(ExitCode::GeneralError)
}

fn run(cli: Cli, output: &mut OutputManager) -> anyhow::Result<ExitCode> {
    if let Commands::Init { force } = cli.command {
        let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;
        return Ok(output.success(path, |path| {
            format!(
                "{}\nEdit this file to customize your settings.",
                THEME.success_with_icon(&format!(
                    "Created configuration file at: {}",
                    path.display()
                ))
            )
        })?);
    }

    // Commands that write to the index set up the project on first use
    let mutating = matches!(cli.command, Commands::Add { .. } | Commands::Ingest { .. });
    if mutating && cli.config.is_none() && Settings::check_init().is_err() {
        match Settings::init_config_file(false) {
            Ok(path) => {
                output.progress(&format!("Created configuration file at: {}", path.display()))?
            }
            Err(e) => output.warning(&format!(
                "Could not create config file: {e}. Using default configuration."
            ))?,
        }
    }

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Configuration error loading from {}", path.display()))?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };
    settings.debug |= cli.debug;
    logging::init(&settings.logging, settings.debug)?;

    if let Commands::Config = cli.command {
        let rendered = toml::to_string_pretty(&settings)?;
        return Ok(output.success(&settings, |_| {
            format!("Current Configuration:\n{}\n{rendered}", "=".repeat(50))
        })?);
    }

    let settings = Arc::new(settings);
    let index = Arc::new(DocumentIndex::with_settings(Arc::clone(&settings))?);
    report_load(&index, cli.info, output)?;

    let code = match cli.command {
        Commands::Add { text, id, meta } => {
            let metadata: Metadata = meta.into_iter().collect();
            let outcome = index.add_document(text, metadata, id)?;
            output.mutation(&outcome, &outcome.durability, |outcome| {
                THEME.success_with_icon(&format!("Added {}", outcome.ids.join(", ")))
            })?
        }
        Commands::Ingest { paths } => ingest(&index, &settings, &paths, output)?,
        Commands::Search { query, limit } => {
            let limit = limit.unwrap_or(settings.search.default_limit);
            let results = index.query(&query, limit)?;
            output.collection(results, "results", create_results_table)?
        }
        Commands::List => {
            output.collection(index.list_documents(), "documents", create_documents_table)?
        }
        Commands::Get { id } => {
            output.item(index.get_document(&id), "Document", &id, render_document)?
        }
        Commands::Delete { id } => {
            let outcome = index.delete_by_id(&id)?;
            match outcome.durability.as_ref() {
                Some(durability) => output.mutation(&outcome, durability, |_| {
                    THEME.success_with_icon(&format!("Deleted {id}"))
                })?,
                None => output.not_found("Document", &id)?,
            }
        }
        Commands::Stats => output.success(index.get_stats(), create_stats_table)?,
        Commands::Rebuild => {
            let durability = if output.format().is_json() {
                index.rebuild()?
            } else {
                with_spinner("Rebuilding index", || index.rebuild())?
            };
            output.mutation(index.get_stats(), &durability, |stats| {
                THEME.success_with_icon(&format!(
                    "Rebuilt index over {} documents ({} terms)",
                    stats.document_count, stats.vocabulary_size
                ))
            })?
        }
        Commands::Init { .. } | Commands::Config => ExitCode::Success,
    };
    Ok(code)
}

fn report_load(index: &DocumentIndex, info: bool, output: &mut OutputManager) -> anyhow::Result<()> {
    let report = index.load_report();
    match report {
        LoadReport::Reset { .. } => output.warning(&report.to_string())?,
        LoadReport::Rebuilt { durability, .. } if !durability.is_durable() => {
            output.warning(&report.to_string())?
        }
        _ if info => output.progress(&report.to_string())?,
        _ => {}
    }
    Ok(())
}

fn render_document(document: &Document) -> String {
    let mut text = format!("{}\n", THEME.apply(&THEME.id, &document.id));
    for (key, value) in &document.metadata {
        text.push_str(&format!("  {}: {value}\n", THEME.apply(&THEME.dim, key)));
    }
    text.push('\n');
    text.push_str(&document.text);
    text
}

fn ingest(
    index: &Arc<DocumentIndex>,
    settings: &Settings,
    paths: &[PathBuf],
    output: &mut OutputManager,
) -> anyhow::Result<ExitCode> {
    let (files, missing) = collect_files(paths, &settings.ingest.extensions);
    for path in &missing {
        output.warning(&format!("Path not found: {}", path.display()))?;
    }
    debug!("Collected {} files to ingest", files.len());

    let progress = if output.format().is_json() {
        ProgressBar::hidden()
    } else {
        create_progress_bar(files.len() as u64, "Ingesting")
    };
    let observer = progress.clone();
    let queue = IngestQueue::start_with_observer(
        Arc::clone(index),
        settings.ingest.max_file_size,
        move |event: &IngestEvent| {
            if let Err(reason) = &event.result {
                observer.println(format!("Skipped {}: {reason}", event.path.display()));
            }
            observer.inc(1);
        },
    );
    for file in files {
        queue.submit(file)?;
    }
    let summary = queue.shutdown()?;
    progress.finish_and_clear();

    let report = IngestReport {
        indexed: summary
            .indexed
            .into_iter()
            .map(|(path, id)| IngestedFile { path, id })
            .collect(),
        failed: summary
            .failed
            .into_iter()
            .map(|(path, reason)| SkippedFile { path, reason })
            .collect(),
        missing,
        not_durable: summary.not_durable,
    };

    let nothing_indexed = report.indexed.is_empty();
    let had_failures = !report.failed.is_empty() || !report.missing.is_empty();
    let not_durable = report.not_durable;

    output.success(&report, render_ingest_report)?;
    if not_durable > 0 {
        output.warning(&format!("{not_durable} documents were indexed but not saved"))?;
        return Ok(ExitCode::NotPersisted);
    }
    if nothing_indexed && had_failures {
        return Ok(ExitCode::GeneralError);
    }
    Ok(ExitCode::Success)
}

fn render_ingest_report(report: &&IngestReport) -> String {
    let mut text = THEME.success_with_icon(&format!(
        "Indexed {} files ({} skipped)",
        report.indexed.len(),
        report.failed.len() + report.missing.len()
    ));
    if !report.indexed.is_empty() {
        let mut builder = TableBuilder::new().set_headers(vec!["Id", "File"]);
        for file in &report.indexed {
            builder = builder.add_row(vec![file.id.clone(), file.path.display().to_string()]);
        }
        text.push('\n');
        text.push_str(&builder.build());
    }
    text
}
