use std::io::Read;
use std::ops::ControlFlow;

use dimlink_session::{Session, SessionEvent, SessionWarning};
use dimlink_transport::SerialStream;
use tracing::info;

use crate::cmd::{Context, DecodeArgs};
use crate::exit::{session_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_event, print_summary};

pub fn run(args: DecodeArgs, ctx: Context) -> CliResult<i32> {
    let stream = SerialStream::open_capture(&args.path)
        .map_err(|err| transport_error("open failed", err))?;
    let limit = args
        .chunk_size
        .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
    let mut session = Session::with_config(ChunkedRead::new(stream, limit), ctx.session);

    let mut snapshots = 0u64;
    let mut payload_invalid = 0u64;
    session
        .run(|event| {
            match event {
                SessionEvent::Snapshot(_) => snapshots += 1,
                SessionEvent::Warning(SessionWarning::Payload(_)) => payload_invalid += 1,
                SessionEvent::Warning(_) => {}
            }
            if !(args.quiet && matches!(event, SessionEvent::Warning(_))) {
                print_event(event, ctx.format);
            }
            ControlFlow::Continue(())
        })
        .map_err(|err| session_error("read failed", err))?;

    let stats = *session.stats();
    info!(
        path = %args.path.display(),
        bytes = stats.bytes_received,
        frames = stats.frames,
        warnings = stats.warnings() + payload_invalid,
        resync_bytes = stats.resync_bytes,
        "decode finished"
    );
    if args.stats {
        print_summary(&stats, snapshots, payload_invalid, ctx.format);
    }

    if snapshots == 0 && stats.bytes_received > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no valid frames in {}", args.path.display()),
        ));
    }
    Ok(SUCCESS)
}

/// Caps every read at `limit` bytes so decoding can be replayed with the
/// chunking a slow link would produce.
struct ChunkedRead<R> {
    inner: R,
    limit: usize,
}

impl<R: Read> ChunkedRead<R> {
    fn new(inner: R, limit: usize) -> Self {
        Self { inner, limit }
    }
}

impl<R: Read> Read for ChunkedRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(self.limit);
        self.inner.read(&mut buf[..len])
    }
}
