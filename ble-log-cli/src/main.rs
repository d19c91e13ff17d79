//! BLE Log Reader CLI Application
//!
//! This is the command-line interface for the BLE protocol log analyzer.
//! It uses the ble-log-decoder library and adds:
//! - TOML configuration (dialects, extra knowledge entries, output settings)
//! - Parallel analysis of several capture logs
//! - Artifact persistence (text report, JSON artifact, replay skeleton)

use anyhow::Result;
use ble_log_decoder::{Analyzer, DecoderError, Dialect, ReplayFormat, ReportOptions};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;

mod config;
mod runner;

use config::AppConfig;
use runner::{RunOutcome, RunSettings};

/// BLE Log Reader - Reconstruct device command sequences from capture logs
#[derive(Parser, Debug)]
#[command(name = "ble-log-cli")]
#[command(about = "Reconstruct BLE write-command sequences from capture logs", long_about = None)]
#[command(version)]
struct Args {
    /// Capture log file(s) to analyze
    #[arg(value_name = "LOGS")]
    logs: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for generated artifacts (default: next to each log)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of commands listed in the text report
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Also generate a replay script skeleton (swift | json)
    #[arg(long, value_name = "FORMAT")]
    replay: Option<ReplayFormat>,

    /// Delay between replayed writes
    #[arg(long, value_name = "MS")]
    replay_delay_ms: Option<u64>,

    /// Restrict recognition to these dialects (can be repeated)
    #[arg(long, value_name = "NAME")]
    dialect: Vec<Dialect>,

    /// Print reports only, write no files
    #[arg(long)]
    no_write: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("BLE Log Reader CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", ble_log_decoder::VERSION);

    let mut app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut app_config, &args);

    let logs = app_config.input.files.clone();
    if logs.is_empty() {
        println!("BLE Log Reader - No input specified");
        println!("\nQuick Start:");
        println!("  ble-log-cli capture.log");
        println!("  ble-log-cli capture.log --replay swift -o out/");
        println!("\nWith a configuration file:");
        println!("  ble-log-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let knowledge = app_config.knowledge.build()?;
    let analyzer = Analyzer::with_config(&app_config.decoder, knowledge);
    let stats = analyzer.knowledge_stats();
    log::debug!(
        "Knowledge base: {} signatures, {} categories",
        stats.num_signatures,
        stats.num_categories
    );

    let settings = RunSettings {
        output_dir: app_config.output.output_dir.clone(),
        report: ReportOptions::default().with_limit(app_config.output.limit),
        replay: app_config.output.replay,
        replay_delay_ms: app_config.output.replay_delay_ms,
        write: !args.no_write,
    };

    if let Some(dir) = &settings.output_dir {
        if settings.write {
            std::fs::create_dir_all(dir).map_err(|source| DecoderError::OutputWriteFailed {
                path: dir.clone(),
                source,
            })?;
        }
    }

    let outcomes: Vec<RunOutcome> = logs
        .par_iter()
        .map(|log| runner::process_log(&analyzer, log, &settings))
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    for outcome in &outcomes {
        print_outcome(outcome, args.quiet);
    }

    if failed > 0 {
        anyhow::bail!("{} of {} log(s) had errors", failed, outcomes.len());
    }
    Ok(())
}

/// Command-line flags win over the configuration file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if !args.logs.is_empty() {
        config.input.files = args.logs.clone();
    }
    if !args.dialect.is_empty() {
        config.decoder.dialects = args.dialect.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.output_dir = Some(dir.clone());
    }
    if let Some(limit) = args.limit {
        config.output.limit = limit;
    }
    if let Some(format) = args.replay {
        config.output.replay = Some(format);
    }
    if let Some(delay) = args.replay_delay_ms {
        config.output.replay_delay_ms = delay;
    }
}

fn print_outcome(outcome: &RunOutcome, quiet: bool) {
    match &outcome.report {
        Ok(text) => {
            if !quiet {
                println!("═══════════════════════════════════════════════");
                println!("  {}", outcome.log.display());
                println!("═══════════════════════════════════════════════\n");
                println!("{}", text);
                for path in &outcome.written {
                    println!("💾 {}", path.display());
                }
            }
            for failure in &outcome.failures {
                eprintln!("✗ {}", failure);
            }
        }
        Err(e) => {
            eprintln!("✗ {}: {}", outcome.log.display(), e);
            if let DecoderError::ReadFailed { lines_processed, .. } = e {
                eprintln!("  lines processed before failure: {}", lines_processed);
            }
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
