//! Command-line front end: split one CSV file into a zip of balanced partitions.
//!
//! ```bash
//! csv-partitioner split data.csv --rows 100
//! csv-partitioner split data.csv --rows 500 --output out/data.zip --fallback-encoding windows-1252
//! csv-partitioner clean --workspace ./work
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use csv_partitioner::{Encoding, ExecMode, Runner, SplitError, SplitterConfig, Workspace};
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "csv-partitioner", version, about)]
struct Cli {
    /// Logging verbosity (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a CSV file into partitions and write them as one zip archive
    Split(SplitArgs),
    /// Remove every file left in the workspace
    Clean(WorkspaceArgs),
}

#[derive(Args, Debug)]
struct WorkspaceArgs {
    /// Directory holding the intake and scratch areas
    #[arg(long, env = "CSV_PARTITIONER_WORKSPACE", default_value = "./work")]
    workspace: PathBuf,
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// CSV file to split
    input: PathBuf,

    /// Maximum number of data rows per partition (must be positive)
    #[arg(long, short = 'r', env = "CSV_PARTITIONER_ROWS")]
    rows: NonZeroUsize,

    /// Where to deliver the archive
    #[arg(long, short = 'o', default_value = csv_partitioner::DEFAULT_ARCHIVE_NAME)]
    output: PathBuf,

    /// Encoding tried when the input is not valid UTF-8
    #[arg(long, value_enum, default_value_t = Encoding::Latin1)]
    fallback_encoding: Encoding,

    /// Write partitions one after another instead of in parallel
    #[arg(long, conflicts_with = "threads")]
    sequential: bool,

    /// Number of writer threads (defaults to the number of CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Print a JSON summary of the run to stdout
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    workspace: WorkspaceArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let result = match cli.command {
        Command::Split(args) => split(args),
        Command::Clean(args) => clean(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            match e.downcast_ref::<SplitError>() {
                Some(split_err) if split_err.is_user_facing() => {
                    eprintln!("{}", split_err.user_message());
                    ExitCode::from(2)
                }
                Some(split_err) => {
                    eprintln!("{}", split_err.user_message());
                    ExitCode::FAILURE
                }
                None => {
                    eprintln!("{}", csv_partitioner::error::GENERIC_MESSAGE);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn split(args: SplitArgs) -> Result<()> {
    let mode = if args.sequential {
        ExecMode::Sequential
    } else {
        ExecMode::Parallel { threads: args.threads }
    };
    let config = SplitterConfig {
        workspace_root: args.workspace.workspace,
        fallback_encoding: args.fallback_encoding,
        mode,
        ..Default::default()
    };
    let runner = Runner::new(config)?;

    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let output = args.output;
    let outcome = runner.run(&args.input, args.rows, |archive| fs::copy(&archive.path, &output))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    } else {
        println!(
            "{} rows -> {} partitions {:?}, archive written to {}",
            outcome.summary.total_rows,
            outcome.summary.partition_sizes.len(),
            outcome.summary.partition_sizes,
            output.display()
        );
    }
    Ok(())
}

fn clean(args: &WorkspaceArgs) -> Result<()> {
    let report = Workspace::new(&args.workspace).teardown();
    println!("removed {} files", report.removed.len());
    for (path, e) in &report.failed {
        eprintln!("could not remove {}: {e}", path.display());
    }
    Ok(())
}
