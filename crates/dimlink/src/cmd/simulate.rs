use std::fs::File;
use std::io::{BufWriter, Write};

use dimlink_frame::{Frame, FrameWriter, END_MARKER, START_MARKER, TERMINATOR};
use dimlink_telemetry::{
    encode_snapshot, DeviceRecord, Inputs, MotorRecord, MotorState, OperatingMode, PayloadLayout,
    TelemetrySnapshot,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::cmd::{Context, SimulateArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};

/// Loop states cycled through, covering exact and banded modes.
const LOOP_STATES: [i16; 8] = [0, 50, 75, 100, 200, 450, 1100, 1250];

const MOTOR_STATES: [MotorState; 5] = [
    MotorState::Idle,
    MotorState::Moving,
    MotorState::Jogging,
    MotorState::HoldPosition,
    MotorState::Stopping,
];

/// Input patterns; none of them encode as the escape byte.
const INPUT_PATTERNS: [u8; 5] = [0b0000_0001, 0b0000_0010, 0b0000_0100, 0b0000_1000, 0b0000_0011];

const FOREIGN_SOURCE_ID: u8 = 1;

const MAX_NOISE_LEN: usize = 12;

pub fn run(args: SimulateArgs, ctx: Context) -> CliResult<i32> {
    let out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|err| io_error("create failed", err))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = FrameWriter::new(out);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let layout = ctx.session.layout;
    let source_id = ctx.session.source_id;

    let mut corrupted = 0u32;
    let mut foreign = 0u32;
    let mut noise_bursts = 0u32;
    for index in 0..args.frames {
        let snapshot = synthetic_snapshot(index, layout, &mut rng);
        let payload = encode_snapshot(&snapshot, layout);
        let nth = index + 1;

        if args.noise_every.is_some_and(|k| nth % k == 0) {
            noise_bursts += 1;
            writer
                .send_raw(&line_noise(&mut rng))
                .map_err(|err| frame_error("write failed", err))?;
        }

        let sent = if args.corrupt_every.is_some_and(|k| nth % k == 0) {
            corrupted += 1;
            writer.send_with_trailer(source_id, &payload, [TERMINATOR, END_MARKER])
        } else if args.foreign_every.is_some_and(|k| nth % k == 0) {
            foreign += 1;
            writer.send(FOREIGN_SOURCE_ID, &payload)
        } else {
            writer.write_frame(&Frame::new(source_id, payload))
        };
        sent.map_err(|err| frame_error("write failed", err))?;
    }

    writer
        .flush()
        .map_err(|err| frame_error("flush failed", err))?;
    info!(
        frames = args.frames,
        corrupted,
        foreign,
        noise_bursts,
        seed = args.seed,
        "simulation written"
    );
    Ok(SUCCESS)
}

/// A short burst of garbage. It never contains a start marker, so it is
/// dropped by the decoder without disturbing the frames around it.
fn line_noise(rng: &mut StdRng) -> Vec<u8> {
    let len = rng.gen_range(1..=MAX_NOISE_LEN);
    (0..len)
        .map(|_| match rng.gen::<u8>() {
            START_MARKER => 0x55,
            byte => byte,
        })
        .collect()
}

fn synthetic_snapshot(index: u32, layout: PayloadLayout, rng: &mut StdRng) -> TelemetrySnapshot {
    let i = index as usize;
    let t = index as f32 * 0.25;

    let motors = std::array::from_fn(|slot| {
        let target = (slot as f32 + 1.0) * 10.0;
        MotorRecord {
            state: MOTOR_STATES[(i + slot) % MOTOR_STATES.len()],
            actual_position: target - 10.0 / (1.0 + t) + rng.gen_range(-0.05..0.05),
            actual_velocity: 10.0 / ((1.0 + t) * (1.0 + t)),
            target_position: target,
            active_process: (slot + 1) as u8,
            process_step: (index % 100) as i16 + 1,
        }
    });

    TelemetrySnapshot {
        motors,
        device: DeviceRecord {
            loop_state: LOOP_STATES[i % LOOP_STATES.len()],
            operating_mode: OperatingMode::from_raw((index % 6) as u8),
            inputs: Inputs(INPUT_PATTERNS[i % INPUT_PATTERNS.len()]),
            clutch_device_state: match layout {
                PayloadLayout::Standard => None,
                PayloadLayout::WithClutchState => Some(0x0100 | (index % 0x100) as u16),
            },
        },
    }
}
