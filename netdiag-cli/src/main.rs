#![warn(clippy::all)]

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::thread;
use std::time::Duration as StdDuration;

use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

use libnetdiag_capture::{
    list_interfaces, probe_tcp, CaptureSession, MonitorManager, PacketRecord, PcapSourceProvider,
};
use libnetdiag_tools::{Config, Error};

/// Live network diagnostics tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<String>,

    /// Be verbose
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List capture interfaces
    Interfaces {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Capture packets on an interface for a fixed duration
    Capture {
        /// Interface name
        #[arg(short, long)]
        interface: String,

        /// BPF filter expression
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Capture duration in seconds
        #[arg(short, long, default_value_t = 10)]
        duration: u64,

        /// Maximum packets kept in the rolling history
        #[arg(long)]
        max_packets: Option<usize>,

        /// Print the captured packets as JSON in addition to the stats
        #[arg(long)]
        packets: bool,
    },
    /// Probe TCP connectivity to a host
    Probe {
        host: String,
        port: u16,

        /// Connect timeout in milliseconds
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,
    },
    /// Monitor round-trip time to a target
    Monitor {
        target: String,

        /// Port probed on each tick
        #[arg(long, default_value_t = 80)]
        port: u16,

        /// Probe cadence in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Number of samples to collect
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
}

fn load_config(config: &mut Config, filename: &str) -> Result<(), io::Error> {
    debug!("Loading configuration {filename}");
    let path = Path::new(&filename);
    let file = File::open(path)?;
    config.load_config(file)
}

fn to_io_error(e: Error) -> io::Error {
    io::Error::other(e)
}

fn print_packet_table(packets: &[PacketRecord]) {
    let first_ts = packets.first().map(|p| p.ts).unwrap_or_default();
    for p in packets {
        let rel = p.ts - first_ts;
        println!(
            "{rel} {:5} {}:{} -> {}:{} len {} {}",
            p.protocol, p.src_ip, p.src_port, p.dst_ip, p.dst_port, p.length, p.info
        );
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_env("NETDIAG_LOG").unwrap_or_else(|_| {
        let level = if args.verbose { Level::DEBUG } else { Level::INFO };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .compact()
        .init();

    let mut config = Config::default();
    if let Some(filename) = args.config.as_ref() {
        load_config(&mut config, filename)?;
    }

    match args.command {
        Command::Interfaces { json } => {
            let interfaces = list_interfaces().map_err(to_io_error)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&interfaces)?);
            } else {
                for iface in interfaces {
                    println!("{} ({})", iface.name, iface.description);
                }
            }
        }
        Command::Capture {
            interface,
            filter,
            duration,
            max_packets,
            packets,
        } => {
            if let Some(max) = max_packets {
                config.set("capture.max_packets", max as i64);
            }
            let session = CaptureSession::new(Box::new(PcapSourceProvider), &config);
            session.start(&interface, &filter).map_err(to_io_error)?;
            info!("capturing on {interface} for {duration}s");
            thread::sleep(StdDuration::from_secs(duration));
            let snapshot = session.snapshot();
            let stats = session.stats();
            session.stop().map_err(to_io_error)?;

            if packets {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_packet_table(&snapshot);
            }
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Probe {
            host,
            port,
            timeout_ms,
        } => {
            let outcome = probe_tcp(&host, port, StdDuration::from_millis(timeout_ms));
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Monitor {
            target,
            port,
            interval_ms,
            count,
        } => {
            let manager = MonitorManager::new();
            let interval = StdDuration::from_millis(interval_ms);
            manager
                .start(&target, port, interval, StdDuration::from_millis(2000))
                .map_err(to_io_error)?;
            let mut samples = manager.results(&target);
            while samples.len() < count {
                thread::sleep(interval / 2);
                samples = manager.results(&target);
            }
            manager.stop(&target);
            samples.truncate(count);
            println!("{}", serde_json::to_string_pretty(&samples)?);
        }
    }

    Ok(())
}
