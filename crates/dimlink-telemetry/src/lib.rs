//! Telemetry records carried in a dimlink frame payload.
//!
//! A payload holds three 17-byte motor records (clutch, linear primary,
//! linear secondary) followed by one device record. All multi-byte fields
//! are little-endian. Payloads handed to [`decode_snapshot`] must already be
//! unescaped; the frame layer does that.

pub mod codec;
pub mod error;
pub mod mode;
pub mod types;

pub use codec::{
    decode_snapshot, encode_snapshot, PayloadLayout, DEVICE_RECORD_SIZE,
    EXTENDED_DEVICE_RECORD_SIZE, MOTOR_RECORD_SIZE, NUM_MOTORS, PAYLOAD_SIZE,
};
pub use error::{PayloadError, Result};
pub use mode::{classify, Mode};
pub use types::{
    DeviceRecord, Inputs, MotorRecord, MotorSlot, MotorState, OperatingMode, TelemetrySnapshot,
    INPUT_LABELS,
};
