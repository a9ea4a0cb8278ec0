use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use dimlink_frame::DecoderStats;
use dimlink_session::{SessionEvent, SessionWarning};
use dimlink_telemetry::{Mode, MotorSlot, TelemetrySnapshot, INPUT_LABELS};
use dimlink_transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventOutput<'a> {
    Snapshot {
        mode: Mode,
        snapshot: &'a TelemetrySnapshot,
        timestamp: u64,
    },
    Warning {
        kind: &'static str,
        message: String,
        timestamp: u64,
    },
}

pub fn print_event(event: &SessionEvent, format: OutputFormat) {
    match event {
        SessionEvent::Snapshot(snapshot) => print_snapshot(snapshot, format),
        SessionEvent::Warning(warning) => print_warning(warning, format),
    }
}

pub fn print_snapshot(snapshot: &TelemetrySnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EventOutput::Snapshot {
            mode: snapshot.mode(),
            snapshot,
            timestamp: now_unix_millis(),
        }),
        OutputFormat::Table => {
            println!("{}", motor_table(snapshot));
            println!("{}", device_table(snapshot));
        }
        OutputFormat::Pretty => {
            let device = &snapshot.device;
            let motors: Vec<String> = MotorSlot::ALL
                .iter()
                .map(|slot| {
                    let motor = snapshot.motor(*slot);
                    format!(
                        "{slot}: {} @ {:.3} (v={:.3}, target={:.3})",
                        motor.state,
                        motor.actual_position,
                        motor.actual_velocity,
                        motor.target_position
                    )
                })
                .collect();
            println!(
                "mode={} loop_state={} operating_mode={} inputs={:#010b} | {}",
                snapshot.mode(),
                device.loop_state,
                device.operating_mode,
                device.inputs.0,
                motors.join(" | ")
            );
        }
    }
}

pub fn print_warning(warning: &SessionWarning, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EventOutput::Warning {
            kind: warning_kind(warning),
            message: warning.to_string(),
            timestamp: now_unix_millis(),
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("warning ({}): {warning}", warning_kind(warning));
        }
    }
}

pub fn warning_kind(warning: &SessionWarning) -> &'static str {
    use dimlink_frame::DecodeWarning;

    match warning {
        SessionWarning::Frame(DecodeWarning::UnexpectedSource { .. }) => "unexpected_source",
        SessionWarning::Frame(DecodeWarning::LengthMismatch { .. }) => "length_mismatch",
        SessionWarning::Frame(DecodeWarning::BufferOverflow { .. }) => "buffer_overflow",
        SessionWarning::Payload(_) => "payload_invalid",
    }
}

fn motor_table(snapshot: &TelemetrySnapshot) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "MOTOR", "STATE", "POSITION", "VELOCITY", "TARGET", "PROCESS", "STEP",
        ]);
    for slot in MotorSlot::ALL {
        let motor = snapshot.motor(slot);
        table.add_row(vec![
            slot.to_string(),
            motor.state.to_string(),
            format!("{:.3}", motor.actual_position),
            format!("{:.3}", motor.actual_velocity),
            format!("{:.3}", motor.target_position),
            motor.active_process.to_string(),
            motor.process_step.to_string(),
        ]);
    }
    table
}

fn device_table(snapshot: &TelemetrySnapshot) -> Table {
    let device = &snapshot.device;
    let active: Vec<&str> = INPUT_LABELS
        .iter()
        .zip(device.inputs.to_array())
        .filter_map(|(label, on)| on.then_some(*label))
        .collect();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["MODE", "LOOP STATE", "OPERATING MODE", "INPUTS"])
        .add_row(vec![
            snapshot.mode().to_string(),
            device.loop_state.to_string(),
            device.operating_mode.to_string(),
            if active.is_empty() {
                "-".to_string()
            } else {
                active.join(", ")
            },
        ]);
    if let Some(state) = device.clutch_device_state {
        table.add_row(vec![
            "CLUTCH DEVICE".to_string(),
            state.to_string(),
            String::new(),
            String::new(),
        ]);
    }
    table
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'static str,
    vid: Option<String>,
    pid: Option<String>,
    manufacturer: Option<&'a str>,
    product: Option<&'a str>,
}

impl<'a> From<&'a PortInfo> for PortOutput<'a> {
    fn from(port: &'a PortInfo) -> Self {
        Self {
            name: &port.name,
            kind: port.kind.as_str(),
            vid: port.usb_id.map(|(vid, _)| format!("{vid:04x}")),
            pid: port.usb_id.map(|(_, pid)| format!("{pid:04x}")),
            manufacturer: port.manufacturer.as_deref(),
            product: port.product.as_deref(),
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    let rows: Vec<PortOutput<'_>> = ports.iter().map(PortOutput::from).collect();
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "VID:PID", "MANUFACTURER", "PRODUCT"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.kind.to_string(),
                    usb_id_label(row),
                    row.manufacturer.unwrap_or("-").to_string(),
                    row.product.unwrap_or("-").to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                println!("{} ({}) {}", row.name, row.kind, usb_id_label(row));
            }
        }
    }
}

fn usb_id_label(row: &PortOutput<'_>) -> String {
    match (&row.vid, &row.pid) {
        (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
        _ => "-".to_string(),
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename = "summary")]
struct SummaryOutput {
    bytes_received: u64,
    frames: u64,
    unexpected_source: u64,
    length_mismatch: u64,
    overflows: u64,
    resync_bytes: u64,
    snapshots: u64,
    payload_invalid: u64,
}

/// Final counters for a finished decode run.
pub fn print_summary(
    stats: &DecoderStats,
    snapshots: u64,
    payload_invalid: u64,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&SummaryOutput {
            bytes_received: stats.bytes_received,
            frames: stats.frames,
            unexpected_source: stats.unexpected_source,
            length_mismatch: stats.length_mismatch,
            overflows: stats.overflows,
            resync_bytes: stats.resync_bytes,
            snapshots,
            payload_invalid,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["BYTES", "FRAMES", "SNAPSHOTS", "WARNINGS", "RESYNC BYTES"])
                .add_row(vec![
                    stats.bytes_received.to_string(),
                    stats.frames.to_string(),
                    snapshots.to_string(),
                    (stats.warnings() + payload_invalid).to_string(),
                    stats.resync_bytes.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "bytes={} frames={} snapshots={} warnings={} resync_bytes={}",
            stats.bytes_received,
            stats.frames,
            snapshots,
            stats.warnings() + payload_invalid,
            stats.resync_bytes
        ),
    }
}

fn print_json(value: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
