use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{Sender, bounded};
use rolling_stats::Stats;

use heatflow::HeatflowProcessor;
use heatflow::config::DeviceConfig;
use heatflow::ingest::{Command, spawn_ingest};
use heatflow::output::{OutputFormat, create_formatter, now_seconds};
use heatflow::record::{EnrichedRecord, InboundPacket};

#[derive(Parser, Debug)]
#[command(name = "heatflow")]
#[command(about = "Parse and calibrate heat flow sensor sentences", long_about = None)]
struct Args {
    /// Input file with one sentence per line (stdin if omitted)
    input: Option<PathBuf>,

    /// TOML device configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device name (overrides the configuration)
    #[arg(short, long)]
    device: Option<String>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print value statistics to stderr when the input ends
    #[arg(long)]
    summary: bool,
}

/// Running statistics of the main channels and every derived value
struct ValueSummary {
    names: Vec<String>,
    stats: Vec<Stats<f64>>,
}

impl ValueSummary {
    fn new(derived: &[String]) -> Self {
        let names: Vec<String> = ["hf", "NTC", "VIN"]
            .iter()
            .map(|s| s.to_string())
            .chain(derived.iter().cloned())
            .collect();
        let stats = names.iter().map(|_| Stats::new()).collect();
        Self { names, stats }
    }

    fn update(&mut self, record: &EnrichedRecord) {
        for (name, stats) in self.names.iter().zip(self.stats.iter_mut()) {
            if let Some(v) = record.value(name).filter(|v| v.is_finite()) {
                stats.update(v);
            }
        }
    }

    fn print(&self) {
        eprintln!(
            "{:<16} {:>8} {:>14} {:>14} {:>14} {:>14}",
            "field", "count", "mean", "std_dev", "min", "max"
        );
        for (name, s) in self.names.iter().zip(&self.stats) {
            if s.count == 0 {
                eprintln!("{:<16} {:>8}", name, 0);
                continue;
            }
            eprintln!(
                "{:<16} {:>8} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
                name, s.count, s.mean, s.std_dev, s.min, s.max
            );
        }
    }
}

fn read_lines(reader: Box<dyn BufRead + Send>, tx: Sender<InboundPacket>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(InboundPacket::new(line, now_seconds())).is_err() {
            break;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => DeviceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DeviceConfig::default(),
    };
    if let Some(device) = args.device {
        config.name = device;
    }

    let processor = HeatflowProcessor::from_config(&config).context("Invalid coefficient list")?;
    let derived: Vec<String> = processor
        .calibration()
        .specs()
        .iter()
        .map(|s| s.convname.clone())
        .collect();

    let reader: Box<dyn BufRead + Send> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (in_tx, in_rx) = bounded(64);
    let (out_tx, out_rx) = bounded(64);
    let (ctrl_tx, ctrl_rx) = bounded(1);

    let worker = spawn_ingest(processor, in_rx, out_tx, ctrl_rx)?;
    thread::Builder::new()
        .name("reader".to_string())
        .spawn(move || read_lines(reader, in_tx))?;

    let formatter = create_formatter(args.format, args.verbose > 0, derived.clone());
    let mut summary = args.summary.then(|| ValueSummary::new(&derived));
    let mut stdout = io::stdout().lock();

    if let Some(header) = formatter.header() {
        writeln!(stdout, "{}", header)?;
    }

    for record in out_rx.iter() {
        if let Some(summary) = summary.as_mut() {
            summary.update(&record);
        }
        if let Err(e) = writeln!(stdout, "{}", formatter.format(&record)) {
            log::debug!("Output closed: {}", e);
            let _ = ctrl_tx.send(Command::Stop);
            break;
        }
    }
    drop(out_rx);

    let result = worker
        .join()
        .map_err(|_| anyhow::anyhow!("ingest thread panicked"))?;
    log::info!(
        "{} line(s) received, {} emitted, {} dropped ({:?})",
        result.received,
        result.emitted,
        result.dropped,
        result.reason
    );

    if let Some(summary) = summary {
        summary.print();
    }

    Ok(())
}
