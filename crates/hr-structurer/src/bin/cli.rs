//! HR structurer command line tool
//!
//! Run with: cargo run -p hr-structurer --features cli --bin hr-structurer -- process docs/

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use walkdir::WalkDir;

use hr_structurer::{
    config::{LlmBackend, StructurerConfig},
    logging::init_tracing,
    output::ArchiveBuilder,
    processing::{BatchPipeline, CancellationFlag, ProgressReporter, ProgressUpdate},
    providers::build_provider,
    types::{BatchSummary, FileOutcome, MediaType, UploadedFile},
};

#[derive(Parser)]
#[command(name = "hr-structurer", version, about = "Structure Norwegian HR documents into JSON records")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "HR_STRUCTURER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Structure files and directories into a ZIP archive of JSON records
    Process {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Archive path (defaults to the configured archive name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only read the top level of directories
        #[arg(long)]
        no_recursive: bool,
    },
    /// Print the effective configuration
    Config,
    /// Check that the inference provider is reachable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = StructurerConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Process {
            paths,
            output,
            no_recursive,
        } => process(config, &paths, output, !no_recursive).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Check => check(config).await,
    }
}

/// Progress bar driven by batch events
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn file_started(&self, update: &ProgressUpdate) {
        self.bar.set_message(update.status.clone());
    }

    fn file_finished(&self, update: &ProgressUpdate, outcome: &FileOutcome) {
        self.bar.set_position(update.attempted as u64);
        if !outcome.status.is_success() {
            self.bar.println(format!(
                "{} {}: {}",
                style("✗").red(),
                outcome.filename,
                outcome.message.as_deref().unwrap_or(outcome.status.label())
            ));
        } else if !outcome.degraded_fields.is_empty() {
            self.bar.println(format!(
                "{} {}: defaults used for {}",
                style("!").yellow(),
                outcome.filename,
                outcome.degraded_fields.join(", ")
            ));
        }
        if let Some(eta) = update.eta_display() {
            self.bar.set_message(format!("about {} remaining", eta));
        }
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        self.bar.finish_with_message(summary.to_string());
    }
}

/// A file to upload and the name its record is stored under
struct Candidate {
    path: PathBuf,
    name: String,
}

/// Collect supported files from the given paths
///
/// Files found in a directory are named by their path relative to that
/// directory, so equal basenames in different subdirectories stay distinct.
fn collect_files(paths: &[PathBuf], recursive: bool) -> anyhow::Result<Vec<Candidate>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            bail!("No such file or directory: {}", path.display());
        }
        if path.is_file() {
            // Explicitly named files are passed through so the pipeline reports them
            files.push(Candidate {
                name: display_name(path, None),
                path: path.clone(),
            });
            continue;
        }

        let walker = WalkDir::new(path).sort_by_file_name();
        let walker = if recursive { walker } else { walker.max_depth(1) };
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && is_supported(entry.path()) {
                files.push(Candidate {
                    name: display_name(entry.path(), Some(path)),
                    path: entry.into_path(),
                });
            }
        }
    }
    Ok(files)
}

/// Upload name: relative to `root` with `/` separators, else the basename
fn display_name(path: &Path, root: Option<&Path>) -> String {
    let relative = root
        .and_then(|root| path.strip_prefix(root).ok())
        .filter(|rel| !rel.as_os_str().is_empty());
    match relative {
        Some(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        None => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

fn is_supported(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(MediaType::from_filename)
        .is_some()
}

async fn load_upload(candidate: &Candidate) -> anyhow::Result<UploadedFile> {
    let data = tokio::fs::read(&candidate.path)
        .await
        .with_context(|| format!("Failed to read {}", candidate.path.display()))?;
    Ok(UploadedFile::guessed(candidate.name.clone(), data))
}

async fn process(
    config: StructurerConfig,
    paths: &[PathBuf],
    output: Option<PathBuf>,
    recursive: bool,
) -> anyhow::Result<()> {
    if config.llm.backend == LlmBackend::OpenAi && config.llm.api_key.is_none() {
        bail!("No API key configured. Set OPENAI_API_KEY or llm.api_key in the configuration file.");
    }

    let candidates = collect_files(paths, recursive)?;
    if candidates.is_empty() {
        bail!("No supported documents found (accepted: .txt, .pdf, .docx)");
    }

    let mut files = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        files.push(load_upload(candidate).await?);
    }

    println!(
        "{} Structuring {} document(s) with {}",
        style("→").cyan().bold(),
        files.len(),
        config.llm.model
    );

    let providers = build_provider(&config)?;
    let pipeline = BatchPipeline::new(Arc::clone(&providers.llm), &config);

    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let reporter = BarReporter::new(files.len());
    let result = pipeline.run(&files, &reporter, &cancel).await?;
    let summary = result.summary();

    println!("\nProcessed documents:");
    for line in result.display_list() {
        println!("  {}", line);
    }

    if let Some(stats) = providers.cache.as_ref().map(|cache| cache.stats()) {
        tracing::debug!("Completion cache: {} hits, {} misses", stats.hits, stats.misses);
    }

    if result.document_count() == 0 {
        println!("\n{} {}", style("✗").red().bold(), summary);
        bail!("No documents were structured; no archive written");
    }

    let archive = ArchiveBuilder::new(&config.archive).build(result.documents())?;
    let output = output.unwrap_or_else(|| PathBuf::from(&config.archive.file_name));
    tokio::fs::write(&output, &archive.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let mark = if summary.succeeded == summary.total {
        style("✓").green().bold()
    } else {
        style("!").yellow().bold()
    };
    println!(
        "\n{} {} ({:.1}s)",
        mark,
        summary,
        result.elapsed().as_secs_f64()
    );
    println!(
        "  Archive: {} ({} entries)",
        style(output.display()).bold(),
        archive.entries.len()
    );
    for skipped in &archive.skipped {
        println!("  {} skipped malformed record {}", style("!").yellow(), skipped);
    }

    Ok(())
}

async fn check(config: StructurerConfig) -> anyhow::Result<()> {
    let providers = build_provider(&config)?;
    let llm = providers.llm;

    match llm.health_check().await {
        Ok(true) => {
            println!(
                "{} {} is reachable (model: {})",
                style("✓").green().bold(),
                llm.name(),
                llm.model()
            );
            Ok(())
        }
        Ok(false) => bail!("{} responded but reported unhealthy", llm.name()),
        Err(e) => bail!("{} is not reachable: {}", llm.name(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walked_files_named_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["hr", "ledelse"] {
            std::fs::create_dir(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("policy.txt"), "Ferie").unwrap();
        }
        std::fs::write(dir.path().join("notes.md"), "skipped").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()], true).unwrap();
        let names: Vec<_> = files.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["hr/policy.txt", "ledelse/policy.txt"]);
    }

    #[test]
    fn test_explicit_file_keeps_basename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permisjon.txt");
        std::fs::write(&path, "Permisjon").unwrap();

        let files = collect_files(&[path], true).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "permisjon.txt");
    }

    #[test]
    fn test_non_recursive_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("arkiv")).unwrap();
        std::fs::write(dir.path().join("arkiv").join("gammel.txt"), "x").unwrap();
        std::fs::write(dir.path().join("ny.txt"), "y").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()], false).unwrap();
        let names: Vec<_> = files.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ny.txt"]);
    }
}
