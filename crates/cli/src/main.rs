//! AXI bridge simulator CLI.
//!
//! This binary replays a trace of upstream read/write/flush/fence events through the bridge. It performs:
//! 1. **Setup:** Loads the JSON configuration (or defaults) and the trace file.
//! 2. **Run:** Ticks the engine until every event is answered or the cycle limit is hit.
//! 3. **Report:** Prints each reply and the bridge statistics.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use rtlbridge_core::bridge::UpstreamReply;
use rtlbridge_core::config::Config;
use rtlbridge_core::sim::{Simulator, trace};

#[derive(Parser, Debug)]
#[command(
    name = "bridge-sim",
    author,
    version,
    about = "Cycle-accurate AXI bridge simulator",
    long_about = "Replay a trace of memory events through the AXI bridge and a timed memory model.\n\nTrace lines:\n  R <addr> <len>        read\n  W <addr> <hex bytes>  write\n  X <addr>              flush line\n  F                     fence\n\nExamples:\n  bridge-sim run --trace loads.trace\n  bridge-sim run --trace loads.trace --config paged.json --max-cycles 5000 -v"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace file.
    Run {
        /// Trace of upstream events.
        #[arg(short, long)]
        trace: PathBuf,

        /// JSON configuration; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override `general.max_cycles`.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Log handshakes and splits (`debug` level) unless `RUST_LOG` is set.
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            trace,
            config,
            max_cycles,
            verbose,
        } => {
            init_logging(verbose);
            if let Err(e) = cmd_run(&trace, config.as_deref(), max_cycles) {
                error!("{e}");
                eprintln!("\n[!] FATAL: {e}");
                process::exit(1);
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads config and trace, runs to quiescence, prints replies and statistics.
fn cmd_run(
    trace_path: &std::path::Path,
    config_path: Option<&std::path::Path>,
    max_cycles: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let events = trace::load(trace_path)?;

    let mut sim = Simulator::new(&config)?;
    if let Some(limit) = max_cycles {
        sim.set_max_cycles(limit);
    }

    println!(
        "Configuration: {}",
        config_path.map_or_else(|| "default".to_string(), |p| p.display().to_string())
    );
    println!(
        "  Clock: {}  Line: {} B  Bus: {} B  Manager: {:?}  Interface: {:?}",
        config.general.clock,
        config.bridge.cache_line_size,
        config.bridge.bus_width_bytes,
        config.memory.manager,
        config.memory.interface
    );
    println!("  Trace: {} ({} events)", trace_path.display(), events.len());
    println!();

    for event in events {
        let _ = sim.submit(event)?;
    }
    let outcome = sim.run()?;

    for reply in &outcome.replies {
        match reply {
            UpstreamReply::Ack {
                request,
                data: Some(data),
            } => println!("{request}  ack  {}", hex(data)),
            UpstreamReply::Ack { request, data: None } => println!("{request}  ack"),
            UpstreamReply::Fault { request, vaddr } => println!("{request}  fault  {vaddr}"),
        }
    }
    println!();
    sim.stats().print(sim.clock_hz());

    if !outcome.quiescent {
        return Err(format!(
            "cycle limit reached after {} cycles with {} requests unanswered",
            outcome.cycles, outcome.unanswered
        )
        .into());
    }
    Ok(())
}

fn hex(data: &[u8]) -> String {
    use std::fmt::Write as _;

    data.iter().fold(String::with_capacity(data.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
