use std::ops::ControlFlow;

use dimlink_session::{connect, SessionEnd, SessionEvent, StopHandle};
use dimlink_telemetry::TelemetrySnapshot;
use dimlink_transport::SerialConfig;
use tracing::info;

use crate::cmd::{Context, MonitorArgs};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::print_event;

pub fn run(args: MonitorArgs, ctx: Context) -> CliResult<i32> {
    let serial = SerialConfig::new(&args.port).with_baud_rate(args.baud);
    let mut session =
        connect(&serial, ctx.session).map_err(|err| session_error("connect failed", err))?;

    install_ctrlc_handler(session.stop_handle())?;

    let mut printed = 0usize;
    let mut previous: Option<TelemetrySnapshot> = None;
    let end = session
        .run(|event| {
            if let SessionEvent::Snapshot(snapshot) = event {
                if args.changes_only && previous.as_ref() == Some(snapshot) {
                    return ControlFlow::Continue(());
                }
                previous = Some(*snapshot);
                printed = printed.saturating_add(1);
            }
            print_event(event, ctx.format);

            match args.count {
                Some(count) if printed >= count => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        })
        .map_err(|err| session_error("read failed", err))?;

    match end {
        SessionEnd::EndOfStream => info!(port = session.get_ref().name(), "port closed"),
        SessionEnd::Stopped => info!(snapshots = printed, "monitor stopped"),
    }
    session.close().close();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(stop: StopHandle) -> CliResult<()> {
    ctrlc::set_handler(move || stop.stop())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
