use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use extracto_core::StatementError;
use extracto_finance::{ParsedStatement, StatementParser};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod export;
mod input;
mod state;

use export::Format;

#[derive(Parser, Debug)]
#[command(
    name = "extracto",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("EXTRACTO_BUILD_SHA"), ")"),
    about = "Turn extracted bank and card statement text into transaction tables"
)]
struct Cli {
    /// Parser configuration file (default: ~/.extracto/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse statement text files (pdftotext -layout output)
    Parse {
        /// Text files, one statement each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Anchor for date plausibility and year-less dates (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<NaiveDate>,

        /// Allowed running-balance drift, e.g. 0.01
        #[arg(long)]
        tolerance: Option<Decimal>,
    },

    /// Manage the parser configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default configuration (never overwrites)
    Init,
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Parse {
            files,
            out,
            format,
            reference_date,
            tolerance,
        } => {
            let mut cfg = config::load_config(cli.config.as_deref())?;
            if reference_date.is_some() {
                cfg.reference_date = reference_date;
            }
            if let Some(tolerance) = tolerance {
                cfg.balance_tolerance = tolerance;
            }
            let parser = StatementParser::new(&cfg).context("invalid parser configuration")?;
            parse_files(Arc::new(parser), files, out, format).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(cli.config.as_deref())?,
            ConfigCommand::Show => {
                let cfg = config::load_config(cli.config.as_deref())?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => match cli.config {
                Some(p) => println!("{}", p.display()),
                None => println!("{}", config::default_config_path()?.display()),
            },
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// One blocking task per statement. Outputs are written in input order.
async fn parse_files(
    parser: Arc<StatementParser>,
    files: Vec<PathBuf>,
    out: Option<PathBuf>,
    format: Format,
) -> Result<()> {
    if let Some(dir) = &out {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }

    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let parser = Arc::clone(&parser);
            let task_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || -> Result<ParsedStatement> {
                let lines = input::read_statement(&task_path)?;
                Ok(parser.parse_lines(&lines)?)
            });
            (path, handle)
        })
        .collect();

    let mut failed = 0usize;
    for (path, handle) in handles {
        let result = handle
            .await
            .with_context(|| format!("parser task for {} panicked", path.display()))?;

        match result {
            Ok(parsed) => {
                let out_dir = out.clone().unwrap_or_else(|| default_out_dir(&path));
                let written = export::export(&path, &parsed, &out_dir, format)?;
                println!(
                    "{}: {} transactions, {} skipped, {} warnings -> {}",
                    path.display(),
                    parsed.transactions.len(),
                    parsed.skipped_blocks(),
                    parsed.warnings(),
                    written.display()
                );
            }
            Err(err) => {
                failed += 1;
                error!(file = %path.display(), "{err:#}");
                if let Some(StatementError::NoTransactions { diagnostics }) =
                    err.downcast_ref::<StatementError>()
                {
                    for d in diagnostics {
                        info!(file = %path.display(), "{d}");
                    }
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} statement(s) could not be parsed");
    }
    Ok(())
}

fn default_out_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
