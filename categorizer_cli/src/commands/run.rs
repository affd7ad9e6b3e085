//! The `run` subcommand: categorize every company in an input CSV.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use categorizer_lib::{
    BrregRegistry, CategorizerConfig, CategorizerError, CategoryMap, Orchestrator,
    RegistrySettings, RunSummary,
};
use chrono::{DateTime, Local};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::input::read_companies;
use crate::output::{print_summary, write_csv, write_json, CsvOptions, OutputFormat};

/// Arguments for the `run` subcommand.
#[derive(Args)]
pub struct RunArgs {
    /// Input CSV: company name in column 1, revenue in column 2
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Output file (default: output/<input>_categorized_<timestamp>.<ext>)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Include match diagnostics columns
    #[arg(long)]
    pub metadata: bool,

    /// Concurrent registry lookups (1-32)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Registry calls between shared cooldown pauses
    #[arg(long)]
    pub cooldown_every: Option<u64>,

    /// Cooldown length in milliseconds
    #[arg(long)]
    pub cooldown_ms: Option<u64>,

    /// Category table YAML replacing the built-in one
    #[arg(long)]
    pub categories: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Write CSV without the UTF-8 byte order mark
    #[arg(long)]
    pub no_bom: bool,

    /// Field delimiter for input and output CSV
    #[arg(long, default_value = ",")]
    pub delimiter: char,
}

pub async fn run(args: &RunArgs) -> Result<()> {
    if !args.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let delimiter = args.delimiter as u8;

    let map = Arc::new(load_category_map(args.categories.as_deref())?);
    let config = build_config(args)?;

    let inputs = read_companies(&args.input, delimiter)?;
    if inputs.is_empty() {
        bail!("No companies found in {}", args.input.display());
    }

    let settings = RegistrySettings::from_env();
    let registry = BrregRegistry::from_settings(&settings, config.search_size)
        .map_err(|e| anyhow!("Failed to create registry client: {}", e))?;
    tracing::info!("Registry: {}", registry.base_url());

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
        )?,
    );
    pb.set_message("categorizing...");

    let pb_progress = pb.clone();
    let orchestrator = Orchestrator::new(Arc::new(registry), Arc::clone(&map), config)?
        .with_progress(move |p| {
            pb_progress.set_position(p.completed as u64);
            pb_progress.set_message(format!("{} cache hits", p.cache_hits));
        });

    let stop = orchestrator.stop_handle();
    let pb_signal = pb.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            pb_signal.println("Interrupted, finishing in-flight lookups...");
            stop.stop();
        }
    });

    let names: Vec<String> = inputs.iter().map(|row| row.company_name.clone()).collect();
    let results = match orchestrator.process_all(&names).await {
        Ok(results) => results,
        Err(CategorizerError::Cancelled { completed, total }) => {
            pb.abandon_with_message("cancelled");
            bail!("Cancelled after {} of {} companies; no output written", completed, total);
        }
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };
    pb.finish_with_message("done");

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, args.format, Local::now()));
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let writer = std::io::BufWriter::new(file);

    match args.format {
        OutputFormat::Csv => write_csv(
            writer,
            &inputs,
            &results,
            CsvOptions {
                metadata: args.metadata,
                bom: !args.no_bom,
                delimiter,
            },
        )?,
        OutputFormat::Json => write_json(writer, &inputs, &results)?,
    }
    eprintln!("Results saved to: {}", output_path.display());

    let summary = RunSummary::from_rows(&results)
        .with_cache(orchestrator.cache())
        .with_requests(orchestrator.request_summary());
    print_summary(&summary);

    Ok(())
}

fn load_category_map(path: Option<&Path>) -> Result<CategoryMap> {
    let map = match path {
        Some(path) => CategoryMap::from_path(path)?,
        None => CategoryMap::load_default()?,
    };
    tracing::info!("Loaded {} categories", map.categories().len());
    Ok(map)
}

/// Environment configuration with command-line overrides applied.
fn build_config(args: &RunArgs) -> Result<CategorizerConfig> {
    let mut config = CategorizerConfig::from_env();
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(every) = args.cooldown_every {
        config.cooldown_every = every;
    }
    if let Some(ms) = args.cooldown_ms {
        config.cooldown = Duration::from_millis(ms);
    }
    config.validate()?;
    Ok(config)
}

fn default_output_path(input: &Path, format: OutputFormat, now: DateTime<Local>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "companies".to_string());
    PathBuf::from("output").join(format!(
        "{}_categorized_{}.{}",
        stem,
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}
