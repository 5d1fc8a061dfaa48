//! SOMS phone lookup CLI
//!
//! Batch-queries the SOMS endpoint for every phone in an input file and
//! writes a results CSV plus a per-request audit log.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use soms_lookup::{
    error::{AppError, Result},
    input,
    models::{Config, ExtractMode, InputKind},
    output::{RequestLog, ResultsWriter},
    pipeline,
    services::SomsClient,
};

/// soms-lookup - batch SOMS customer lookup by phone number
#[derive(Parser, Debug)]
#[command(
    name = "soms-lookup",
    version,
    about = "Query SOMS by phone from a TXT/CSV input and export results to CSV"
)]
struct Cli {
    /// Path to a TOML config file; the flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the lookup endpoint (QA or PROD)
    #[arg(long)]
    base_url: Option<String>,

    /// idUsuario sent as a query parameter with every request
    #[arg(long)]
    id_usuario: Option<String>,

    /// Input file (TXT with one phone per line, or CSV)
    #[arg(short, long)]
    input: PathBuf,

    /// Force the input kind instead of inferring it from the extension
    #[arg(long, value_enum)]
    input_kind: Option<InputKind>,

    /// Column holding the phone value when the input is CSV
    #[arg(long)]
    phone_field: Option<String>,

    /// What to extract from each response
    #[arg(long, value_enum)]
    extract: Option<ExtractMode>,

    /// Results CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Audit log CSV path
    #[arg(long)]
    log: Option<PathBuf>,

    /// Delay between requests in seconds
    #[arg(long)]
    sleep: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable TLS certificate verification (disabled by default)
    #[arg(long)]
    verify_tls: bool,

    /// Process at most N phones (0 = all); useful for testing
    #[arg(long)]
    max: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Layer CLI overrides on top of the (optional) config file.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.endpoint.base_url = base_url.clone();
    }
    if let Some(id_usuario) = &cli.id_usuario {
        config.endpoint.id_usuario = id_usuario.clone();
    }
    if let Some(kind) = cli.input_kind {
        config.input.kind = Some(kind);
    }
    if let Some(phone_field) = &cli.phone_field {
        config.input.phone_column = phone_field.clone();
    }
    if let Some(mode) = cli.extract {
        config.extract = mode;
    }
    if let Some(output) = &cli.output {
        config.output.results_path = output.clone();
    }
    if let Some(log_path) = &cli.log {
        config.output.log_path = log_path.clone();
    }
    if let Some(sleep) = cli.sleep {
        config.runner.sleep_secs = sleep;
    }
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    if cli.verify_tls {
        config.http.verify_tls = true;
    }
    if let Some(max) = cli.max {
        config.runner.max_entries = max;
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    if !cli.input.exists() {
        return Err(AppError::config(format!(
            "input file not found: {}",
            cli.input.display()
        )));
    }

    let kind = input::detect_input_kind(&cli.input, config.input.kind);
    let mut entries = input::read_entries(&cli.input, kind, &config.input.phone_column)?;
    if entries.is_empty() {
        return Err(AppError::config("no phone entries found in the input"));
    }
    if config.runner.max_entries > 0 {
        entries.truncate(config.runner.max_entries);
    }

    log::info!(
        "Loaded {} phone entries from {} ({} mode)",
        entries.len(),
        cli.input.display(),
        match kind {
            InputKind::Txt => "txt",
            InputKind::Csv => "csv",
        }
    );
    if !config.http.verify_tls {
        log::warn!("TLS certificate verification is disabled");
    }

    let soms = SomsClient::new(&config)?;
    let mut results = ResultsWriter::create(&config.output.results_path, config.extract)?;
    let mut audit = RequestLog::create(&config.output.log_path)?;

    let start = Utc::now();
    let stats = pipeline::run_lookup(&config, &soms, &entries, &mut results, &mut audit).await?;
    let elapsed = Utc::now() - start;

    log::info!(
        "Done in {}s: {} entries, {} ok, {} invalid phones, {} failed requests",
        elapsed.num_seconds(),
        stats.entries,
        stats.ok_count(),
        stats.invalid,
        stats.transport_errors + stats.http_errors + stats.invalid_json
    );
    log::info!(
        "Wrote {} result rows to {} | audit log: {}",
        stats.rows_written,
        config.output.results_path.display(),
        config.output.log_path.display()
    );

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
