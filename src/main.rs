use anyhow::{Context, Result};
use chunkreview::batch::run_batch;
use chunkreview::config::load_config;
use chunkreview::export::write_chunks;
use chunkreview::profile::{path_ext_lower, profile_for_extension};
use chunkreview::review::{annotate_source, parse_review_response};
use chunkreview::scanner::{scan_workspace, ScanOptions};
use chunkreview::walker::{chunk_file, read_source};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "chunkreview")]
#[command(version)]
#[command(about = "Split source files into declaration chunks for LLM code review")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chunk a file or directory into JSON files (one per declaration plus a skeleton)
    Chunk {
        /// File or directory to chunk
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Output directory (defaults to `output_dir` from .chunkreview.json)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Worker threads (0 = one per core)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Print the skeleton of a single file (declaration bodies replaced by <BODY name>)
    Skeleton {
        #[arg(value_name = "FILE_PATH")]
        file: PathBuf,
    },

    /// Print the declarations of a single file as JSON
    Declarations {
        #[arg(value_name = "FILE_PATH")]
        file: PathBuf,
    },

    /// Insert review comments (a JSON object of line -> comment) above their lines
    Annotate {
        #[arg(value_name = "FILE_PATH")]
        file: PathBuf,

        /// JSON file with the review comments
        #[arg(long, value_name = "JSON_PATH")]
        comments: PathBuf,

        /// Write the annotated file here instead of stdout
        #[arg(short, long, value_name = "FILE_PATH")]
        output: Option<PathBuf>,
    },
}

fn absolute(repo_root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        p
    } else {
        repo_root.join(p)
    }
}

fn run_chunk(
    repo_root: &Path,
    input: PathBuf,
    output: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<()> {
    let cfg = load_config(repo_root);
    let input = absolute(repo_root, input);
    let out_dir = absolute(repo_root, output.unwrap_or_else(|| cfg.output_dir.clone()));

    let opts = ScanOptions {
        root: input,
        max_file_bytes: cfg.effective_max_file_bytes(),
        exclude_dir_names: cfg.scan.exclude_dir_names.clone(),
    };
    let entries = scan_workspace(&opts)?;
    if entries.is_empty() {
        eprintln!("No supported source files under {}", opts.root.display());
        return Ok(());
    }

    let progress = ProgressBar::new(entries.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let base_name = cfg.base_chunk_name.as_str();
    let report = run_batch(&entries, workers.unwrap_or(cfg.workers), |entry| {
        progress.set_message(entry.rel_path.to_string_lossy().to_string());
        let written = chunk_file(&entry.abs_path)
            .and_then(|chunked| write_chunks(&chunked, &out_dir, &entry.rel_path, base_name));
        // Failed files still count towards the bar.
        progress.inc(1);
        Ok(written?.len())
    })?;
    progress.finish_and_clear();

    let chunks: usize = report.outcomes.iter().filter_map(|o| o.result.as_ref().ok()).sum();
    eprintln!(
        "Chunked {} files into {} chunks under {} ({} failed)",
        report.succeeded(),
        chunks,
        out_dir.display(),
        report.failed()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let repo_root = std::env::current_dir().context("Failed to get current dir")?;

    match cli.cmd {
        Command::Chunk {
            input,
            output,
            workers,
        } => run_chunk(&repo_root, input, output, workers)?,
        Command::Skeleton { file } => {
            let file = absolute(&repo_root, file);
            let chunked = chunk_file(&file)?;
            if chunked.is_unsupported() {
                eprintln!("Unsupported file extension: {}", file.display());
            }
            print!("{}", chunked.skeleton);
        }
        Command::Declarations { file } => {
            let file = absolute(&repo_root, file);
            let chunked = chunk_file(&file)?;
            println!("{}", serde_json::to_string_pretty(chunked.declarations.records())?);
        }
        Command::Annotate { file, comments, output } => {
            let file = absolute(&repo_root, file);
            let source = read_source(&file)?;
            let raw = std::fs::read_to_string(&comments)
                .with_context(|| format!("Failed to read {}", comments.display()))?;
            let parsed = parse_review_response(&raw)?;
            let sign = profile_for_extension(&path_ext_lower(&file))
                .map(|p| p.comment_sign)
                .unwrap_or("//");
            let annotated = annotate_source(&source, &parsed, sign);
            match output {
                Some(out) => std::fs::write(&out, annotated)
                    .with_context(|| format!("Failed to write {}", out.display()))?,
                None => print!("{}", annotated),
            }
        }
    }

    Ok(())
}
