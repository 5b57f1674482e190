use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use jemallocator::Jemalloc;
use log::{info, warn};
use simple_logger::SimpleLogger;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use waitlist::{
    derive_row,
    engine::{replay, ClearingRates},
    models::format_timestamp,
    output::{build_chart_data, write_rows, Ledger, Summary},
    sources::{extract_waitlist_file, load_clearing_records, load_snapshot, load_snapshot_dir},
    utils::parse_utc,
    OutputFormat, Settings, WaitlistError,
};

#[derive(Parser)]
#[command(name = "waitlist", about = "IPv4 waitlist snapshot differencing and metrics")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the metrics row for one snapshot
    Derive {
        /// Snapshot to derive the row for
        #[arg(short, long)]
        current: PathBuf,
        /// Previous snapshot to diff against; omit for the first data point
        #[arg(short, long)]
        previous: Option<PathBuf>,
        /// Clearing cache (quarter records JSON or the registry CSV)
        #[arg(long)]
        clearing: Option<PathBuf>,
        /// Observation time, used when the snapshot carries none
        #[arg(long, value_parser = parse_timestamp)]
        as_of: Option<DateTime<Utc>>,
        /// Print the row as CSV instead of the text report
        #[arg(long)]
        csv: bool,
        /// Leave out the CSV header line
        #[arg(long)]
        no_header: bool,
        /// Append the row to the ledger instead of printing it
        #[arg(long)]
        append: bool,
        /// Ledger file to append to
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Rebuild the whole ledger from archived snapshots
    Replay {
        /// Directory of snapshot JSON files
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
        /// Clearing cache (quarter records JSON or the registry CSV)
        #[arg(long)]
        clearing: Option<PathBuf>,
        /// Ledger file to regenerate
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Turn the ledger into chart-ready JSON
    Dashboard {
        /// Ledger file to read
        #[arg(long)]
        ledger: Option<PathBuf>,
        /// Where to write the JSON; `-` for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract waitlist records from an archived registry page
    ExtractHtml {
        /// Saved HTML page
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the snapshot JSON; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Observation time to record in the snapshot envelope
        #[arg(long, value_parser = parse_timestamp)]
        as_of: Option<DateTime<Utc>>,
    },
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_utc(raw).ok_or_else(|| format!("unrecognized timestamp: {raw}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::new()
        .context("Failed to load waitlist.yaml. Please ensure it is valid")?;

    SimpleLogger::new()
        .with_level(settings.level_filter())
        .init()
        .context("Failed to initialize logger")?;

    match cli.cmd {
        Commands::Derive {
            current,
            previous,
            clearing,
            as_of,
            csv,
            no_header,
            append,
            ledger,
        } => {
            let current = load_snapshot(&current, as_of)?.snapshot;
            let previous = previous
                .map(|path| load_snapshot(&path, None).map(|result| result.snapshot))
                .transpose()?;

            if let Some(previous) = &previous {
                if previous.timestamp > current.timestamp {
                    return Err(WaitlistError::OutOfOrder {
                        previous: format_timestamp(&previous.timestamp),
                        current: format_timestamp(&current.timestamp),
                    }
                    .into());
                }
            }

            let rates = load_rates(clearing.or(settings.paths.clearing_cache.clone()).as_deref())?;
            let row = derive_row(&current, previous.as_ref(), &rates);

            if append {
                let ledger = Ledger::new(ledger.unwrap_or(settings.paths.ledger.clone()));
                ledger
                    .append(&row)
                    .with_context(|| format!("Failed to append to {}", ledger.path().display()))?;
            } else if csv || settings.output.format == OutputFormat::Csv {
                let include_header = settings.output.include_header && !no_header;
                write_rows(&mut io::stdout().lock(), &[row], include_header)?;
            } else {
                print!("{}", Summary(&row));
            }
        }
        Commands::Replay {
            snapshot_dir,
            clearing,
            ledger,
        } => {
            let snapshot_dir = snapshot_dir.unwrap_or(settings.paths.snapshot_dir.clone());
            let snapshots = load_snapshot_dir(&snapshot_dir)
                .with_context(|| format!("Failed to load snapshots from {}", snapshot_dir.display()))?;

            let rates = load_rates(clearing.or(settings.paths.clearing_cache.clone()).as_deref())?;
            let rows = replay(&snapshots, &rates)?;

            let ledger = Ledger::new(ledger.unwrap_or(settings.paths.ledger.clone()));
            ledger.replace(&rows)?;
        }
        Commands::Dashboard { ledger, output } => {
            let ledger = Ledger::new(ledger.unwrap_or(settings.paths.ledger.clone()));
            let contents = ledger
                .read()
                .with_context(|| format!("Failed to read {}", ledger.path().display()))?;

            if contents.rows.is_empty() {
                bail!("ledger {} has no rows to chart", ledger.path().display());
            }

            let chart = build_chart_data(&contents);
            let json = serde_json::to_string_pretty(&chart)?;

            let output = output.unwrap_or(settings.paths.dashboard.clone());
            write_output(&output, &json)?;
            info!("Wrote {} panels over {} rows", chart.panels.len(), chart.labels.len());
        }
        Commands::ExtractHtml { input, output, as_of } => {
            let requests = extract_waitlist_file(&input)?;

            let document = match as_of {
                Some(timestamp) => serde_json::json!({
                    "timestamp": format_timestamp(&timestamp),
                    "requests": requests,
                }),
                None => serde_json::to_value(&requests)?,
            };
            let json = serde_json::to_string_pretty(&document)?;

            match output {
                Some(path) => write_output(&path, &json)?,
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

fn load_rates(path: Option<&Path>) -> anyhow::Result<ClearingRates> {
    match path {
        Some(path) => {
            let records = load_clearing_records(path)?;
            Ok(ClearingRates::estimate(&records))
        }
        None => {
            warn!("No clearing cache configured; every size reports a zero rate");
            Ok(ClearingRates::default())
        }
    }
}

fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    if path == Path::new("-") {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{contents}")?;
        return Ok(());
    }

    fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
