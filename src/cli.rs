//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_EXTENSION};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_lines_adapter::JsonLinesAdapter;
use crate::adapters::table_adapter::TableAdapter;
use crate::domain::config_validation::{
    parse_date, parse_frequency, reference_sections, validate_pipeline_config, DATA_SECTION,
    PRIMARY_SECTION,
};
use crate::domain::error::PriceStreamError;
use crate::domain::pipeline::PricePipeline;
use crate::domain::record::RawRecord;
use crate::domain::source::{PipelineConfig, SourceDescriptor};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, RecordStream};
use crate::ports::output_port::{write_failed, OutputPort};

#[derive(Parser, Debug)]
#[command(name = "pricestream", about = "Resample and align daily price series")]
pub struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream primary intervals aligned against the configured references
    Intervals {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [primary] ticker
        #[arg(long)]
        ticker: Option<String>,
        /// Override [data] dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a pipeline configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers with a data file
    ListTickers {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show data range for ticker(s)
    Info {
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Plain-text table with period returns
    Table,
}

/// Counts reported once a pipeline run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub unavailable: usize,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Intervals {
            config,
            ticker,
            data_dir,
            format,
            output,
        } => run_intervals(
            &config,
            ticker.as_deref(),
            data_dir.as_ref(),
            format,
            output.as_ref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { data_dir, config } => {
            run_list_tickers(data_dir.as_ref(), config.as_ref())
        }
        Command::Info {
            ticker,
            data_dir,
            config,
        } => run_info(ticker.as_deref(), data_dir.as_ref(), config.as_ref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PriceStreamError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Reads one stream section shaped like `[primary]`.
pub fn build_source_descriptor(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<SourceDescriptor, PriceStreamError> {
    let ticker = config
        .get_string(section, "ticker")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PriceStreamError::config_missing(section, "ticker"))?;

    let mut source = SourceDescriptor::new(ticker)
        .with_frequency(parse_frequency(
            config.get_string(section, "freq").as_deref(),
            section,
        )?)
        .with_flush_partial(config.get_bool(section, "flush_partial", false));
    if let Some(start) = parse_date(config.get_string(section, "start").as_deref(), section, "start")? {
        source = source.with_start(start);
    }
    if let Some(end) = parse_date(config.get_string(section, "end").as_deref(), section, "end")? {
        source = source.with_end(end);
    }

    source.validate(section)?;
    Ok(source)
}

pub fn build_pipeline_config(config: &dyn ConfigPort) -> Result<PipelineConfig, PriceStreamError> {
    let data_dir = config
        .get_string(DATA_SECTION, "dir")
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let extension = config
        .get_string(DATA_SECTION, "extension")
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let primary = build_source_descriptor(config, PRIMARY_SECTION)?;
    let references = reference_sections(config)?
        .iter()
        .map(|section| build_source_descriptor(config, section))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PipelineConfig {
        data_dir,
        extension,
        primary,
        references,
    })
}

/// Drains `pipeline` into `output`. A primary stream error stops the run
/// after everything before it has been written.
pub fn run_pipeline<S>(
    pipeline: PricePipeline<S>,
    output: &mut dyn OutputPort,
) -> Result<RunSummary, PriceStreamError>
where
    S: Iterator<Item = Result<RawRecord, PriceStreamError>>,
{
    let mut summary = RunSummary::default();
    for record in pipeline {
        let record = record?;
        summary.records += 1;
        summary.unavailable += record.refs().iter().filter(|r| !r.is_available()).count();
        output.write_record(&record)?;
    }
    output.finish()?;
    Ok(summary)
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>, PriceStreamError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| PriceStreamError::Output {
                reason: format!("failed to create {}: {}", path.display(), e),
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn run_intervals(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
    data_dir_override: Option<&PathBuf>,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match intervals(&config, ticker_override, data_dir_override, format, output_path) {
        Ok(summary) => {
            info!(
                records = summary.records,
                unavailable = summary.unavailable,
                "pipeline complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn intervals(
    config: &dyn ConfigPort,
    ticker_override: Option<&str>,
    data_dir_override: Option<&PathBuf>,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
) -> Result<RunSummary, PriceStreamError> {
    validate_pipeline_config(config)?;
    let mut pipeline_config = build_pipeline_config(config)?;
    if let Some(ticker) = ticker_override {
        pipeline_config.primary.ticker = ticker.to_string();
    }
    if let Some(dir) = data_dir_override {
        pipeline_config.data_dir = dir.clone();
    }

    info!(
        primary = %pipeline_config.primary.ticker,
        frequency = %pipeline_config.primary.frequency,
        references = pipeline_config.references.len(),
        data_dir = %pipeline_config.data_dir.display(),
        "opening pipeline"
    );

    let adapter = CsvAdapter::with_extension(
        pipeline_config.data_dir.clone(),
        &pipeline_config.extension,
    );
    let pipeline: PricePipeline<RecordStream> = PricePipeline::open(
        &adapter,
        &pipeline_config.primary,
        &pipeline_config.references,
    )?;

    let out = open_output(output_path)?;
    let mut output: Box<dyn OutputPort> = match format {
        OutputFormat::Json => Box::new(JsonLinesAdapter::new(out)),
        OutputFormat::Table => {
            let tickers = pipeline_config
                .references
                .iter()
                .map(|r| r.ticker.clone())
                .collect();
            Box::new(TableAdapter::new(out, tickers))
        }
    };
    run_pipeline(pipeline, output.as_mut())
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating pipeline config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let pipeline_config = match validate_pipeline_config(&config)
        .and_then(|()| build_pipeline_config(&config))
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nData:");
    eprintln!("  dir:       {}", pipeline_config.data_dir.display());
    eprintln!("  extension: {}", pipeline_config.extension);
    eprintln!("\nPrimary:");
    describe_source(&pipeline_config.primary);
    for (i, reference) in pipeline_config.references.iter().enumerate() {
        eprintln!("\nReference {}:", i + 1);
        describe_source(reference);
    }

    eprintln!("\nPipeline configuration is valid.");
    ExitCode::SUCCESS
}

fn describe_source(source: &SourceDescriptor) {
    let bound = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    eprintln!("  ticker:        {}", source.ticker);
    eprintln!("  frequency:     {}", source.frequency);
    eprintln!(
        "  range:         {} .. {}",
        bound(source.start_date),
        bound(source.end_date)
    );
    eprintln!("  flush_partial: {}", source.flush_partial);
}

/// Resolves the data directory from `--data-dir`, falling back to the
/// `[data]` section of `--config`.
fn resolve_data_adapter(
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    command: &str,
) -> Result<CsvAdapter, ExitCode> {
    if let Some(dir) = data_dir {
        return Ok(CsvAdapter::new(dir.clone()));
    }
    let Some(config_path) = config_path else {
        eprintln!("error: --data-dir or --config is required for {command}");
        return Err(ExitCode::from(1));
    };
    let config = load_config(config_path)?;
    let pipeline_config = build_pipeline_config(&config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok(CsvAdapter::with_extension(
        pipeline_config.data_dir,
        &pipeline_config.extension,
    ))
}

fn run_list_tickers(data_dir: Option<&PathBuf>, config_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match resolve_data_adapter(data_dir, config_path, "list-tickers") {
        Ok(a) => a,
        Err(code) => return code,
    };

    let tickers = match adapter.list_tickers() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if tickers.is_empty() {
        eprintln!("No tickers found");
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    ExitCode::SUCCESS
}

fn run_info(
    ticker: Option<&str>,
    data_dir: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> ExitCode {
    let adapter = match resolve_data_adapter(data_dir, config_path, "info") {
        Ok(a) => a,
        Err(code) => return code,
    };

    let tickers = match ticker {
        Some(t) => vec![t.to_string()],
        None => match adapter.list_tickers() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    let mut stdout = io::stdout().lock();
    match write_info(&adapter, &tickers, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Writes one line per ticker: first date, last date and row count.
pub fn write_info(
    port: &dyn DataPort,
    tickers: &[String],
    out: &mut dyn Write,
) -> Result<(), PriceStreamError> {
    for ticker in tickers {
        let line = match port.get_data_range(ticker)? {
            Some((first, last, count)) => format!("{ticker}: {first} to {last} ({count} rows)"),
            None => format!("{ticker}: no data"),
        };
        writeln!(out, "{}", line).map_err(write_failed)?;
    }
    Ok(())
}

/// Default log filter when `RUST_LOG` is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "pricestream=debug"
    } else {
        "pricestream=info"
    }
}
