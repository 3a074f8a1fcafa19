//! qqtpack CLI - Command-line tool for QQ Tang game archive extraction.
//!
//! This is the main entry point for the qqtpack command-line application.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use qqtpack::pkg::EntryFilter;
use qqtpack::prelude::*;

/// Exit status when the index is not a usable IDX file.
const EXIT_FORMAT: u8 = 2;
/// Exit status when one or more entries failed to extract.
const EXIT_ENTRY: u8 = 3;

/// qqtpack - QQ Tang IDX/PKG archive extraction tool
#[derive(Parser)]
#[command(name = "qqtpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ArchivePaths {
    /// Path to the IDX index file
    #[arg(long, env = "QQT_IDX", default_value = "object.idx")]
    idx: PathBuf,

    /// Path to the PKG payload file
    #[arg(long, env = "QQT_PKG", default_value = "object.pkg")]
    pkg: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract files from an IDX/PKG archive
    Extract {
        #[command(flatten)]
        paths: ArchivePaths,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER", default_value = ".")]
        output: PathBuf,

        /// Filter pattern (glob, or a substring when it has no `*`, `?` or `[`)
        #[arg(short, long)]
        filter: Option<String>,

        /// Keep going after an entry fails and report all failures at the end
        #[arg(short, long)]
        keep_going: bool,

        /// Extract entries on all cores
        #[arg(short, long)]
        parallel: bool,
    },

    /// List contents of an IDX index
    List {
        /// Path to the IDX index file
        #[arg(long, env = "QQT_IDX", default_value = "object.idx")]
        idx: PathBuf,

        /// Filter pattern (glob, or a substring when it has no `*`, `?` or `[`)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show offsets, sizes and a per-extension summary
        #[arg(short, long)]
        detailed: bool,
    },

    /// Decompress and size-check entries without writing any files
    Verify {
        #[command(flatten)]
        paths: ArchivePaths,

        /// Filter pattern (glob, or a substring when it has no `*`, `?` or `[`)
        #[arg(short, long)]
        filter: Option<String>,

        /// Keep going after an entry fails and report all failures at the end
        #[arg(short, long)]
        keep_going: bool,

        /// Verify entries on all cores
        #[arg(short, long)]
        parallel: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            paths,
            output,
            filter,
            keep_going,
            parallel,
        } => cmd_extract(&paths, &output, options(filter, keep_going, parallel)),
        Commands::List {
            idx,
            filter,
            detailed,
        } => cmd_list(&idx, filter.as_deref(), detailed).map(|_| ExitCode::SUCCESS),
        Commands::Verify {
            paths,
            filter,
            keep_going,
            parallel,
        } => cmd_verify(&paths, options(filter, keep_going, parallel)),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_status(&err))
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn options(filter: Option<String>, keep_going: bool, parallel: bool) -> ExtractOptions {
    let policy = if keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::FailFast
    };

    ExtractOptions {
        filter,
        policy,
        parallel,
        ..ExtractOptions::default()
    }
}

/// Map a failed run onto the process exit status.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_format_error() => EXIT_FORMAT,
        Some(e) if e.is_entry_error() => EXIT_ENTRY,
        _ => 1,
    }
}

fn open_archive(paths: &ArchivePaths) -> Result<PkgArchive> {
    println!("Opening archive: {}", paths.idx.display());

    let start = Instant::now();
    let archive = PkgArchive::open(&paths.idx, &paths.pkg).context("Failed to open archive")?;

    println!(
        "Loaded {} entries in {:?}",
        archive.entry_count(),
        start.elapsed()
    );

    Ok(archive)
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn cmd_extract(paths: &ArchivePaths, output: &Path, options: ExtractOptions) -> Result<ExitCode> {
    let archive = open_archive(paths)?;

    let selected = archive.select(options.filter.as_deref())?.len();
    println!("Extracting {} entries to {}...", selected, output.display());

    let pb = progress_bar(selected)?;
    let start = Instant::now();
    let report = archive
        .extract_all(output, &options, |_, _| pb.inc(1))
        .context("Extraction failed")?;

    pb.finish_with_message("Done");
    println!(
        "Extracted {} entries ({} bytes) in {:?}",
        report.processed,
        report.bytes,
        start.elapsed()
    );

    Ok(summarize(&report))
}

fn cmd_verify(paths: &ArchivePaths, options: ExtractOptions) -> Result<ExitCode> {
    let archive = open_archive(paths)?;

    let selected = archive.select(options.filter.as_deref())?.len();
    println!("Verifying {} entries...", selected);

    let pb = progress_bar(selected)?;
    let start = Instant::now();
    let report = archive
        .verify_all(&options, |_, _| pb.inc(1))
        .context("Verification failed")?;

    pb.finish_with_message("Done");
    println!(
        "Verified {} entries ({} bytes) in {:?}",
        report.processed,
        report.bytes,
        start.elapsed()
    );

    Ok(summarize(&report))
}

/// Print collected entry failures; any failure makes the run unsuccessful.
fn summarize(report: &ExtractReport) -> ExitCode {
    if report.is_success() {
        return ExitCode::SUCCESS;
    }

    eprintln!("{} entries failed:", report.failures.len());
    for err in &report.failures {
        eprintln!("  {}", err);
    }
    ExitCode::from(EXIT_ENTRY)
}

fn cmd_list(idx: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let file = File::open(idx).with_context(|| format!("Failed to open {}", idx.display()))?;
    let (header, entries) = read_index(BufReader::new(file)).context("Failed to read index")?;
    let filter = filter.map(EntryFilter::new).transpose()?;

    let mut count = 0;
    let mut by_extension: BTreeMap<String, (usize, u64)> = BTreeMap::new();

    for entry in &entries {
        if let Some(filter) = &filter {
            if !filter.matches(&entry.name) {
                continue;
            }
        }

        if detailed {
            println!(
                "{:>10} {:>12} {:>12} {}",
                entry.offset, entry.compressed_size, entry.uncompressed_size, entry.name
            );

            let ext = entry.extension().unwrap_or("").to_lowercase();
            let stats = by_extension.entry(ext).or_default();
            stats.0 += 1;
            stats.1 += u64::from(entry.uncompressed_size);
        } else {
            println!("{}", entry.name);
        }
        count += 1;
    }

    if detailed && !by_extension.is_empty() {
        println!();
        for (ext, (files, bytes)) in &by_extension {
            let ext = if ext.is_empty() { "(none)" } else { ext };
            println!("{:>8} {:>8} files {:>14} bytes", ext, files, bytes);
        }
    }

    println!("\nTotal: {} of {} entries", count, header.entry_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use qqtpack::pkg::{FormatError, IntegrityError};

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::try_parse_from(["qqtpack", "extract", "-k"]).unwrap();
        match cli.command {
            Commands::Extract {
                keep_going,
                parallel,
                ..
            } => {
                assert!(keep_going);
                assert!(!parallel);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_exit_status_distinguishes_failures() {
        let bad_magic = anyhow::Error::from(Error::from(FormatError::BadMagic {
            expected: 100,
            actual: 0,
        }))
        .context("Failed to open archive");
        assert_eq!(exit_status(&bad_magic), EXIT_FORMAT);

        let entry = Error::Entry {
            name: "a/b.txt".to_string(),
            offset: 0,
            stage: qqtpack::pkg::ExtractStage::Validating,
            source: Box::new(Error::from(IntegrityError::SizeMismatch {
                expected: 5,
                actual: 4,
            })),
        };
        let entry = anyhow::Error::from(entry).context("Extraction failed");
        assert_eq!(exit_status(&entry), EXIT_ENTRY);

        let bad_filter = anyhow::Error::from(EntryFilter::new("[a").unwrap_err());
        assert_eq!(exit_status(&bad_filter), 1);

        assert_eq!(exit_status(&anyhow::anyhow!("other")), 1);
    }

    #[test]
    fn test_keep_going_policy() {
        assert_eq!(options(None, true, false).policy, FailurePolicy::Continue);
        assert_eq!(
            options(Some("*.map".into()), false, true).policy,
            FailurePolicy::FailFast
        );
    }
}
