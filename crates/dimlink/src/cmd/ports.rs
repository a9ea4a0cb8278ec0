use dimlink_transport::{available_ports, PortKind};
use tracing::debug;

use crate::cmd::{Context, PortsArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::print_ports;

pub fn run(args: PortsArgs, ctx: Context) -> CliResult<i32> {
    let mut ports = available_ports().map_err(|err| transport_error("port scan failed", err))?;
    if args.usb {
        ports.retain(|port| port.kind == PortKind::Usb);
    }
    debug!(count = ports.len(), "ports found");
    print_ports(&ports, ctx.format);
    Ok(SUCCESS)
}
