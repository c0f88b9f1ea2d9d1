//! Table rates CLI
//!
//! Prints the rate vector one table yields for an issue age, optionally with
//! select reentry applied.

use std::io::{self, Write};
use std::path::PathBuf;

use actuarial_tables::{ActuarialTable, ReentryMethod, TableConfig, TableMetadata};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "table_rates", version, about = "Look up rates in an SOA binary table")]
struct Args {
    /// Table family base path; the index and data files share its stem
    base_path: PathBuf,

    /// Table number within the family
    #[arg(short, long)]
    table: i32,

    /// Issue age
    #[arg(short, long)]
    issue_age: i32,

    /// Number of durations (default: through the table's maximum age)
    #[arg(short, long)]
    length: Option<i32>,

    /// Reentry method: never, inforce or reset
    #[arg(short, long, default_value = "never")]
    method: ReentryMethod,

    /// Inforce duration for reentry
    #[arg(long, default_value_t = 0)]
    inforce: i32,

    /// Duration of the most recent rate reset
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    reset: i32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the table's metadata before the rates (text format)
    #[arg(long)]
    metadata: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    table_number: i32,
    name: &'a str,
    metadata: &'a TableMetadata,
    issue_age: i32,
    method: ReentryMethod,
    rates: &'a [f64],
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TableConfig::from_json_path(path)?,
        None => TableConfig::default(),
    };

    let table = ActuarialTable::open_with(&args.base_path, args.table, &config)
        .with_context(|| format!("loading table {} from {}", args.table, args.base_path.display()))?;
    info!(
        "loaded table {} '{}': {:?}",
        table.table_number(),
        table.name(),
        table.metadata()
    );

    let length = args
        .length
        .unwrap_or_else(|| table.metadata().max_length(args.issue_age).max(0));
    let rates = match args.method {
        ReentryMethod::Never => table.values(args.issue_age, length)?,
        method => table.values_elaborated(args.issue_age, length, method, args.inforce, args.reset)?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => {
            if args.metadata {
                let meta = table.metadata();
                writeln!(out, "table {} '{}'", table.table_number(), table.name())?;
                writeln!(
                    out,
                    "type {} ages {}..={} select period {} max select age {}",
                    meta.table_type.code(),
                    meta.min_age,
                    meta.max_age,
                    meta.select_period,
                    meta.max_select_age
                )?;
            }
            for (duration, rate) in rates.iter().enumerate() {
                writeln!(out, "{:>4} {:.10}", duration, rate)?;
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["duration", "rate"])?;
            for (duration, rate) in rates.iter().enumerate() {
                writer.write_record([duration.to_string(), rate.to_string()])?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let output = JsonOutput {
                table_number: table.table_number(),
                name: table.name(),
                metadata: table.metadata(),
                issue_age: args.issue_age,
                method: args.method,
                rates: &rates,
            };
            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
