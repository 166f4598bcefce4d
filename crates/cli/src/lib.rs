//! # `stockmeta_cli` Library Crate
//!
//! The logic behind the `stockmeta` binary: it reads image files, runs each
//! through a `MetadataClient` and writes an Adobe Stock upload CSV.

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::{self, StreamExt};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use stockmeta::{
    csv_export::{write_csv, CsvRow},
    providers::ai::{
        local::LocalAiProvider,
        openai::{
            OpenAiProvider, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_OPENAI_API_URL,
            DEFAULT_OPENAI_MODEL,
        },
        AiProvider,
    },
    AnalysisConfig, AnalyzeImageOptions, Category, MetadataClient, MetadataClientBuilder,
    MetadataRecord,
};
use tracing::{error, info};

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate title, keywords and category for images and write a CSV
    Analyze(AnalyzeArgs),
    /// Print the Adobe Stock category codes
    Categories,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// The OpenAI Responses API.
    Openai,
    /// Any OpenAI-compatible chat-completions server with vision support.
    Local,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Image files to analyze.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Where to write the CSV. Defaults to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// How many images are analyzed at the same time.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,
    #[arg(long, value_enum, default_value_t = ProviderKind::Openai)]
    pub provider: ProviderKind,
    /// The provider endpoint. Required for `--provider local`.
    #[arg(long, env = "STOCKMETA_API_URL")]
    pub api_url: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "STOCKMETA_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    pub model: String,
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
    pub max_output_tokens: u32,
    /// Keep the model's own category instead of the rule-based override.
    #[arg(long)]
    pub no_classify: bool,
}

/// The result of analyzing one input file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<MetadataRecord>,
}

// --- Public Entrypoint ---

/// The main entry point for the `stockmeta_cli` library.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze(args) => handle_analyze(args).await,
        Commands::Categories => {
            print!("{}", format_categories());
            Ok(())
        }
    }
}

// --- Command Handlers ---

async fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let client = build_client(&args)?;
    info!(
        files = args.files.len(),
        concurrency = args.concurrency,
        provider = ?args.provider,
        "Starting analysis"
    );

    let reports = analyze_files(&client, &args.files, usize::from(args.concurrency)).await;
    let total = reports.len();
    let (rows, failed) = collect_rows(reports);

    match &args.output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            write_csv(file, &rows)?;
            info!("Wrote {} rows to '{}'", rows.len(), path.display());
        }
        None => write_csv(io::stdout().lock(), &rows)?,
    }

    if failed > 0 {
        bail!("{failed} of {total} images could not be analyzed");
    }
    Ok(())
}

// --- Core Logic ---

/// Builds the AI provider selected on the command line.
pub fn build_provider(args: &AnalyzeArgs) -> Result<Box<dyn AiProvider>> {
    let provider: Box<dyn AiProvider> = match args.provider {
        ProviderKind::Openai => Box::new(OpenAiProvider::new(
            args.api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
            args.api_key.clone(),
            args.model.clone(),
            args.max_output_tokens,
        )?),
        ProviderKind::Local => {
            let api_url = args
                .api_url
                .clone()
                .ok_or_else(|| anyhow!("--api-url is required for the local provider"))?;
            Box::new(LocalAiProvider::new(
                api_url,
                args.api_key.clone(),
                Some(args.model.clone()),
            )?)
        }
    };
    Ok(provider)
}

fn build_client(args: &AnalyzeArgs) -> Result<MetadataClient> {
    let mut config = AnalysisConfig::default();
    config.classifier.enabled = !args.no_classify;
    let client = MetadataClientBuilder::new()
        .ai_provider(build_provider(args)?)
        .config(config)
        .build()?;
    Ok(client)
}

/// Reads an image file and returns its base64 encoding.
pub fn encode_image_file(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read image '{}'", path.display()))?;
    Ok(STANDARD.encode(bytes))
}

/// The name written to the CSV and passed to the prompt: the last path component.
pub fn display_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn analyze_file(client: &MetadataClient, path: &Path) -> Result<MetadataRecord> {
    let image_base64 = encode_image_file(path)?;
    let outcome = client
        .analyze_image(AnalyzeImageOptions {
            image_base64,
            filename: Some(display_filename(path)),
        })
        .await?;
    Ok(outcome.record)
}

/// Analyzes files with at most `concurrency` in flight, in input order.
pub async fn analyze_files(
    client: &MetadataClient,
    files: &[PathBuf],
    concurrency: usize,
) -> Vec<FileReport> {
    stream::iter(files.iter().cloned())
        .map(|path| async move {
            let result = analyze_file(client, &path).await;
            FileReport { path, result }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Splits reports into CSV rows and a failure count, logging each failure.
pub fn collect_rows(reports: Vec<FileReport>) -> (Vec<CsvRow>, usize) {
    let mut rows = Vec::with_capacity(reports.len());
    let mut failed = 0;
    for report in reports {
        match report.result {
            Ok(record) => rows.push(CsvRow::new(display_filename(&report.path), record)),
            Err(e) => {
                error!("Skipping '{}': {:#}", report.path.display(), e);
                failed += 1;
            }
        }
    }
    (rows, failed)
}

/// One `"<code> <name>"` line per category.
pub fn format_categories() -> String {
    Category::ALL
        .iter()
        .map(|category| format!("{category}\n"))
        .collect()
}
