mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use dimlink_session::SessionConfig;

use crate::cmd::{Command, Context, LayoutArg};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dimlink", version, about = "Serial telemetry decoder")]
struct Cli {
    /// Output format. Default: table on a terminal, json otherwise.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "DIMLINK_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    /// Device record layout sent by the firmware.
    #[arg(
        long,
        value_name = "LAYOUT",
        env = "DIMLINK_LAYOUT",
        default_value = "standard",
        global = true
    )]
    layout: LayoutArg,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn context(&self) -> Context {
        Context {
            format: self
                .format
                .unwrap_or_else(OutputFormat::default_for_stdout),
            session: SessionConfig {
                layout: self.layout.into(),
                ..SessionConfig::default()
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = cli.context();
    let result = cmd::run(cli.command, ctx);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use dimlink_telemetry::PayloadLayout;

    use super::*;

    #[test]
    fn parses_monitor_subcommand() {
        let cli = Cli::try_parse_from(["dimlink", "monitor", "/dev/ttyACM0", "--baud", "57600"])
            .expect("monitor args should parse");

        match cli.command {
            Command::Monitor(args) => {
                assert_eq!(args.port, "/dev/ttyACM0");
                assert_eq!(args.baud, 57_600);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_layout_flag_reaches_session_config() {
        let cli = Cli::try_parse_from([
            "dimlink",
            "decode",
            "capture.bin",
            "--layout",
            "with-clutch-state",
            "--format",
            "json",
        ])
        .expect("decode args should parse");

        let ctx = cli.context();
        assert_eq!(ctx.session.layout, PayloadLayout::WithClutchState);
        assert_eq!(ctx.session.decoder_config().payload_len, 57);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let err = Cli::try_parse_from(["dimlink", "decode", "capture.bin", "--chunk-size", "0"])
            .expect_err("zero chunk size should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_simulate_subcommand() {
        let cli = Cli::try_parse_from([
            "dimlink",
            "simulate",
            "--frames",
            "5",
            "--corrupt-every",
            "2",
            "--seed",
            "9",
        ])
        .expect("simulate args should parse");
        assert!(matches!(cli.command, Command::Simulate(_)));
    }
}
