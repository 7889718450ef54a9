//! Batch converter - runs the sweeper pipeline over files on disk

use anyhow::{Context, Result};
use clap::Parser;
use data_sweeper::downloader::{self, ConversionTarget};
use data_sweeper::pipeline::{self, PipelineOptions, UploadedFile};
use log::{error, info};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sweep")]
#[command(version, about = "Clean and convert CSV and Excel files")]
struct Cli {
    /// Input files (csv, xlsx, xls)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ConversionTarget::Csv)]
    to: ConversionTarget,

    /// Drop rows that repeat an earlier row
    #[arg(long)]
    remove_duplicates: bool,

    /// Fill missing numeric values with the column mean
    #[arg(long)]
    fill_missing: bool,

    /// Columns to keep, comma separated (default: all)
    #[arg(short, long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Directory for converted files (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let options = PipelineOptions {
        remove_duplicates: cli.remove_duplicates,
        fill_missing: cli.fill_missing,
        columns: cli.columns.clone(),
    };

    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut guard = OverwriteGuard::new(&cli.inputs);
    let mut failed = 0;
    for input in &cli.inputs {
        match sweep_file(input, &options, cli.to, cli.output_dir.as_deref(), &mut guard) {
            Ok(written) => info!("{} -> {}", input.display(), written.display()),
            Err(e) => {
                error!("{}: {:#}", input.display(), e);
                failed += 1;
            }
        }
    }

    info!(
        "{} of {} files converted",
        cli.inputs.len() - failed,
        cli.inputs.len()
    );
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Tracks paths a run must not write to: every input, and every output
/// already written by this run
struct OverwriteGuard {
    inputs: HashSet<PathBuf>,
    written: HashSet<PathBuf>,
}

impl OverwriteGuard {
    fn new(inputs: &[PathBuf]) -> Self {
        Self {
            inputs: inputs.iter().map(|p| normalize(p)).collect(),
            written: HashSet::new(),
        }
    }

    fn check(&self, output: &Path) -> Result<()> {
        let key = normalize(output);
        if self.inputs.contains(&key) {
            anyhow::bail!("Output {} would overwrite an input file", output.display());
        }
        if self.written.contains(&key) {
            anyhow::bail!(
                "Output {} was already written by another input",
                output.display()
            );
        }
        Ok(())
    }

    fn record(&mut self, output: &Path) {
        self.written.insert(normalize(output));
    }
}

/// Absolute form of `path`, resolved through its parent when the file
/// does not exist yet
fn normalize(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn sweep_file(
    input: &Path,
    options: &PipelineOptions,
    target: ConversionTarget,
    output_dir: Option<&Path>,
    guard: &mut OverwriteGuard,
) -> Result<PathBuf> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .context("Input path has no usable file name")?;

    let file = UploadedFile::new(name, bytes);
    let processed = pipeline::process(&file, options)?;
    if let Some(removed) = processed.report.duplicates_removed {
        info!("{}: {} duplicates removed", name, removed);
    }

    let converted = downloader::convert(&processed.frame, name, target)?;
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let output = dir.join(&converted.file_name);
    guard.check(&output)?;

    fs::write(&output, &converted.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    guard.record(&output);
    Ok(output)
}
