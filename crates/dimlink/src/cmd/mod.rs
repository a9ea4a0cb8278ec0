use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use dimlink_session::SessionConfig;
use dimlink_telemetry::PayloadLayout;
use dimlink_transport::DEFAULT_BAUD_RATE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod monitor;
pub mod ports;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream decoded telemetry from a serial port.
    Monitor(MonitorArgs),
    /// Decode a capture file of raw wire bytes.
    Decode(DecodeArgs),
    /// Generate synthetic wire bytes.
    Simulate(SimulateArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    pub session: SessionConfig,
}

pub fn run(command: Command, ctx: Context) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, ctx),
        Command::Decode(args) => decode::run(args, ctx),
        Command::Simulate(args) => simulate::run(args, ctx),
        Command::Ports(args) => ports::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

/// Device record layout sent by the firmware.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum LayoutArg {
    #[default]
    Standard,
    WithClutchState,
}

impl From<LayoutArg> for PayloadLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Standard => PayloadLayout::Standard,
            LayoutArg::WithClutchState => PayloadLayout::WithClutchState,
        }
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial port (e.g. /dev/ttyACM0, COM3).
    #[arg(env = "DIMLINK_PORT")]
    pub port: String,
    /// Line speed.
    #[arg(long, env = "DIMLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Exit after N snapshots.
    #[arg(long)]
    pub count: Option<usize>,
    /// Print only snapshots that differ from the previous one.
    #[arg(long)]
    pub changes_only: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode; `-` reads stdin.
    pub path: PathBuf,
    /// Feed the decoder at most N bytes per read.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: Option<u64>,
    /// Print decoder counters after the last event.
    #[arg(long)]
    pub stats: bool,
    /// Suppress warning events in the output.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of frames to generate.
    #[arg(long, default_value_t = 10)]
    pub frames: u32,
    /// Output file. Default: stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Give every Kth frame a corrupt trailer.
    #[arg(long, value_name = "K", value_parser = clap::value_parser!(u32).range(1..))]
    pub corrupt_every: Option<u32>,
    /// Send every Kth frame from a foreign source id.
    #[arg(long, value_name = "K", value_parser = clap::value_parser!(u32).range(1..))]
    pub foreign_every: Option<u32>,
    /// Write a burst of line noise before every Kth frame.
    #[arg(long, value_name = "K", value_parser = clap::value_parser!(u32).range(1..))]
    pub noise_every: Option<u32>,
    /// Seed for the noise generator.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {
    /// Only list USB ports.
    #[arg(long)]
    pub usb: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
