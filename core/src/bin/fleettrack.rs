use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use fleettrack_core::ingest::parse_instant;
use fleettrack_core::report::{summaries_json, tracks_json, write_summaries_csv, write_tracks_csv};
use fleettrack_core::{
    load_config, run_shifts, save_config, CsvSampleSource, DateRange, Metrics, ShiftConfig,
    ShiftQuery, ShiftReport, UnitScale,
};

#[derive(Parser)]
#[command(name = "fleettrack", version)]
#[command(about = "Split fleet telemetry into tracks and daily shift summaries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the track table
    Tracks(RunArgs),
    /// Print the per-device daily summary table
    Summary(RunArgs),
    /// Print the effective config as JSON (optionally write it)
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        raw_units: bool,
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Args)]
struct RunArgs {
    /// CSV export with device_id, device_time, speed, latitude, longitude, altitude, event_id
    #[arg(short, long)]
    input: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Window start (inclusive); date or timestamp. Default: 24 hours before --to
    #[arg(long)]
    from: Option<String>,
    /// Window end (exclusive); date or timestamp. Default: now
    #[arg(long)]
    to: Option<String>,
    /// Ignore --from/--to and use every row
    #[arg(long, conflicts_with_all = ["from", "to"])]
    all: bool,
    #[arg(long)]
    device: Option<i64>,
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,
    /// Input columns are raw tracker units (speed / 100, coordinates / 1e7)
    #[arg(long)]
    raw_units: bool,
    /// Print prometheus metrics to stderr after the run
    #[arg(long)]
    metrics: bool,
}

fn instant(s: &str) -> Result<DateTime<Utc>> {
    parse_instant(s).ok_or_else(|| anyhow!("not a date or timestamp: {s:?}"))
}

/// Window and device filter from the flags; `now` closes the default window.
fn query_for(args: &RunArgs, now: DateTime<Utc>) -> Result<ShiftQuery> {
    if args.all {
        return Ok(ShiftQuery {
            device_id: args.device,
            ..ShiftQuery::all_time()
        });
    }
    let end = args.to.as_deref().map(instant).transpose()?.unwrap_or(now);
    let range = match &args.from {
        Some(s) => DateRange::new(instant(s)?, end)?,
        None => DateRange::last_24h(end),
    };
    Ok(ShiftQuery {
        range,
        device_id: args.device,
    })
}

fn effective_config(path: Option<&PathBuf>, raw_units: bool) -> Result<ShiftConfig> {
    let mut cfg = match path {
        Some(p) => load_config(p).with_context(|| format!("loading config {}", p.display()))?,
        None => ShiftConfig::default(),
    };
    if raw_units {
        cfg.units = UnitScale::raw_telematics();
    }
    Ok(cfg)
}

fn run(args: &RunArgs, metrics: &Metrics) -> Result<ShiftReport> {
    let cfg = effective_config(args.config.as_ref(), args.raw_units)?;
    let query = query_for(args, Utc::now())?;
    if !args.all {
        info!("window {} .. {}", query.range.start, query.range.end);
    }
    let source = CsvSampleSource::new(&args.input);
    run_shifts(&source, &cfg, &query, Some(metrics))
        .with_context(|| format!("processing {}", args.input.display()))
}

/// Metrics are only handed back when `--metrics` asked for them.
fn run_with_metrics(args: &RunArgs) -> Result<(ShiftReport, Option<Metrics>)> {
    let metrics = Metrics::new()?;
    let report = run(args, &metrics)?;
    Ok((report, args.metrics.then_some(metrics)))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();

    match cli.command {
        Command::Tracks(args) => {
            let (report, metrics) = run_with_metrics(&args)?;
            match args.format {
                Format::Csv => write_tracks_csv(stdout.lock(), &report.tracks)?,
                Format::Json => writeln!(stdout.lock(), "{}", tracks_json(&report.tracks)?)?,
            }
            if let Some(m) = metrics {
                eprint!("{}", m.render()?);
            }
        }
        Command::Summary(args) => {
            let (report, metrics) = run_with_metrics(&args)?;
            match args.format {
                Format::Csv => write_summaries_csv(stdout.lock(), &report.summaries)?,
                Format::Json => writeln!(stdout.lock(), "{}", summaries_json(&report.summaries)?)?,
            }
            if let Some(m) = metrics {
                eprint!("{}", m.render()?);
            }
        }
        Command::Config {
            config,
            raw_units,
            write,
        } => {
            let cfg = effective_config(config.as_ref(), raw_units)?;
            cfg.validate()?;
            writeln!(stdout.lock(), "{}", serde_json::to_string_pretty(&cfg)?)?;
            if let Some(path) = write {
                save_config(&cfg, &path).with_context(|| format!("writing {}", path.display()))?;
            }
        }
    }
    Ok(())
}
