use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{PayloadError, Result};
use crate::types::{
    DeviceRecord, Inputs, MotorRecord, MotorState, OperatingMode, TelemetrySnapshot,
};

/// Motor records per payload.
pub const NUM_MOTORS: usize = 3;

/// state (2) + three f32 (12) + active process (1) + process step (2).
pub const MOTOR_RECORD_SIZE: usize = 17;

/// loop state (2) + operating mode (1) + inputs (1).
pub const DEVICE_RECORD_SIZE: usize = 4;

/// Standard device record followed by clutch device state (2).
pub const EXTENDED_DEVICE_RECORD_SIZE: usize = DEVICE_RECORD_SIZE + 2;

/// Payload length of the standard layout.
pub const PAYLOAD_SIZE: usize = NUM_MOTORS * MOTOR_RECORD_SIZE + DEVICE_RECORD_SIZE;

/// Which device record the firmware appends after the motor records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadLayout {
    /// Loop state, operating mode, inputs.
    #[default]
    Standard,
    /// Standard fields plus the 16-bit clutch device state.
    WithClutchState,
}

impl PayloadLayout {
    pub fn device_record_size(self) -> usize {
        match self {
            PayloadLayout::Standard => DEVICE_RECORD_SIZE,
            PayloadLayout::WithClutchState => EXTENDED_DEVICE_RECORD_SIZE,
        }
    }

    /// Total payload bytes this layout occupies.
    pub fn payload_len(self) -> usize {
        NUM_MOTORS * MOTOR_RECORD_SIZE + self.device_record_size()
    }
}

/// Decode an unescaped payload.
///
/// Pure: the same bytes always give the same snapshot. Only the slice
/// length is checked; unnamed enumeration values decode to their `Unknown`
/// variants.
pub fn decode_snapshot(payload: &[u8], layout: PayloadLayout) -> Result<TelemetrySnapshot> {
    let expected = layout.payload_len();
    if payload.len() != expected {
        return Err(PayloadError::Length {
            expected,
            actual: payload.len(),
        });
    }

    let (motor_bytes, mut device_bytes) = payload.split_at(NUM_MOTORS * MOTOR_RECORD_SIZE);

    let mut motors = [MotorRecord::default(); NUM_MOTORS];
    for (motor, mut window) in motors
        .iter_mut()
        .zip(motor_bytes.chunks_exact(MOTOR_RECORD_SIZE))
    {
        *motor = decode_motor(&mut window);
    }

    let device = decode_device(&mut device_bytes, layout);
    Ok(TelemetrySnapshot { motors, device })
}

fn decode_motor(buf: &mut &[u8]) -> MotorRecord {
    MotorRecord {
        state: MotorState::from_raw(buf.get_i16_le()),
        actual_position: buf.get_f32_le(),
        actual_velocity: buf.get_f32_le(),
        target_position: buf.get_f32_le(),
        active_process: buf.get_u8(),
        process_step: buf.get_i16_le(),
    }
}

fn decode_device(buf: &mut &[u8], layout: PayloadLayout) -> DeviceRecord {
    let loop_state = buf.get_i16_le();
    let operating_mode = OperatingMode::from_raw(buf.get_u8());
    let inputs = Inputs(buf.get_u8());
    let clutch_device_state = match layout {
        PayloadLayout::Standard => None,
        PayloadLayout::WithClutchState => Some(buf.get_u16_le()),
    };
    DeviceRecord {
        loop_state,
        operating_mode,
        inputs,
        clutch_device_state,
    }
}

/// Encode a snapshot into unescaped payload bytes.
///
/// Inverse of [`decode_snapshot`]. `clutch_device_state` is written only for
/// [`PayloadLayout::WithClutchState`], as `0` when absent.
pub fn encode_snapshot(snapshot: &TelemetrySnapshot, layout: PayloadLayout) -> Bytes {
    let mut buf = BytesMut::with_capacity(layout.payload_len());
    for motor in &snapshot.motors {
        buf.put_i16_le(motor.state.raw());
        buf.put_f32_le(motor.actual_position);
        buf.put_f32_le(motor.actual_velocity);
        buf.put_f32_le(motor.target_position);
        buf.put_u8(motor.active_process);
        buf.put_i16_le(motor.process_step);
    }

    let device = &snapshot.device;
    buf.put_i16_le(device.loop_state);
    buf.put_u8(device.operating_mode.raw());
    buf.put_u8(device.inputs.0);
    if layout == PayloadLayout::WithClutchState {
        buf.put_u16_le(device.clutch_device_state.unwrap_or(0));
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::mode::Mode;
    use crate::types::MotorSlot;

    fn sample() -> TelemetrySnapshot {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.motors[0] = MotorRecord {
            state: MotorState::Moving,
            actual_position: 1.5,
            actual_velocity: -3.25,
            target_position: 10.0,
            active_process: 2,
            process_step: 17,
        };
        snapshot.motors[2].state = MotorState::Unknown(42);
        snapshot.device = DeviceRecord {
            loop_state: 250,
            operating_mode: OperatingMode::ManualLinearS,
            inputs: Inputs(0b0000_0101),
            clutch_device_state: None,
        };
        snapshot
    }

    #[test]
    fn layout_sizes() {
        assert_eq!(PAYLOAD_SIZE, 55);
        assert_eq!(PayloadLayout::Standard.payload_len(), 55);
        assert_eq!(PayloadLayout::WithClutchState.payload_len(), 57);
    }

    #[test]
    fn field_offsets() {
        let mut payload = vec![0u8; PAYLOAD_SIZE];
        // motor 1: state = 3 (jogging), actual position = 2.0
        payload[17..19].copy_from_slice(&3i16.to_le_bytes());
        payload[19..23].copy_from_slice(&2.0f32.to_le_bytes());
        payload[31] = 7;
        payload[32..34].copy_from_slice(&(-5i16).to_le_bytes());
        // device: loop state 1100, mode 4, inputs 0x0C
        payload[51..53].copy_from_slice(&1100i16.to_le_bytes());
        payload[53] = 4;
        payload[54] = 0x0C;

        let snapshot = decode_snapshot(&payload, PayloadLayout::Standard).unwrap();
        let motor = snapshot.motor(MotorSlot::LinearPrimary);
        assert_eq!(motor.state, MotorState::Jogging);
        assert_eq!(motor.actual_position, 2.0);
        assert_eq!(motor.active_process, 7);
        assert_eq!(motor.process_step, -5);
        assert_eq!(snapshot.device.loop_state, 1100);
        assert_eq!(snapshot.device.operating_mode, OperatingMode::IoCheckout);
        assert!(snapshot.device.inputs.clutch_negative_limit());
        assert!(snapshot.device.inputs.clutch_positive_limit());
        assert_eq!(snapshot.device.clutch_device_state, None);
        assert_eq!(snapshot.mode(), Mode::Manual);
    }

    #[test]
    fn zeroed_state_is_idle() {
        // 0x0F 0x00 on the wire arrives here as 0x00 0x00.
        let payload = vec![0u8; PAYLOAD_SIZE];
        let snapshot = decode_snapshot(&payload, PayloadLayout::Standard).unwrap();
        assert_eq!(snapshot.motors[0].state, MotorState::Idle);
        assert_eq!(snapshot.device.mode(), Mode::Inactive);
    }

    #[test]
    fn killed_state() {
        let mut payload = vec![0u8; PAYLOAD_SIZE];
        payload[0..2].copy_from_slice(&(-1i16).to_le_bytes());
        let snapshot = decode_snapshot(&payload, PayloadLayout::Standard).unwrap();
        assert_eq!(snapshot.motors[0].state, MotorState::Killed);
    }

    #[test]
    fn extended_layout_reads_clutch_state() {
        let mut payload = vec![0u8; 57];
        payload[55..57].copy_from_slice(&0xBEEFu16.to_le_bytes());
        let snapshot = decode_snapshot(&payload, PayloadLayout::WithClutchState).unwrap();
        assert_eq!(snapshot.device.clutch_device_state, Some(0xBEEF));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = decode_snapshot(&[0u8; 54], PayloadLayout::Standard).unwrap_err();
        assert_eq!(
            err,
            PayloadError::Length {
                expected: 55,
                actual: 54
            }
        );
        assert!(decode_snapshot(&[0u8; 55], PayloadLayout::WithClutchState).is_err());
    }

    #[test]
    fn encode_matches_decode() {
        let snapshot = sample();
        let bytes = encode_snapshot(&snapshot, PayloadLayout::Standard);
        assert_eq!(bytes.len(), PAYLOAD_SIZE);
        assert_eq!(
            decode_snapshot(&bytes, PayloadLayout::Standard).unwrap(),
            snapshot
        );
    }

    #[test]
    fn unknown_values_survive() {
        let mut snapshot = sample();
        snapshot.device.operating_mode = OperatingMode::Unknown(200);
        let bytes = encode_snapshot(&snapshot, PayloadLayout::Standard);
        let decoded = decode_snapshot(&bytes, PayloadLayout::Standard).unwrap();
        assert_eq!(decoded.motors[2].state, MotorState::Unknown(42));
        assert_eq!(decoded.device.operating_mode, OperatingMode::Unknown(200));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["motors"][0]["state"], "moving");
        assert_eq!(json["motors"][2]["state"]["unknown"], 42);
        assert_eq!(json["device"]["operating_mode"], "manual_linear_s");
        assert_eq!(json["device"]["inputs"], 5);
    }

    fn motor_strategy() -> impl Strategy<Value = MotorRecord> {
        (
            any::<i16>(),
            -1.0e6f32..1.0e6,
            -1.0e4f32..1.0e4,
            -1.0e6f32..1.0e6,
            any::<u8>(),
            any::<i16>(),
        )
            .prop_map(|(state, pos, vel, target, process, step)| MotorRecord {
                state: MotorState::from_raw(state),
                actual_position: pos,
                actual_velocity: vel,
                target_position: target,
                active_process: process,
                process_step: step,
            })
    }

    fn snapshot_strategy() -> impl Strategy<Value = TelemetrySnapshot> {
        (
            proptest::array::uniform3(motor_strategy()),
            any::<i16>(),
            any::<u8>(),
            any::<u8>(),
            proptest::option::of(any::<u16>()),
        )
            .prop_map(|(motors, loop_state, mode, inputs, clutch)| TelemetrySnapshot {
                motors,
                device: DeviceRecord {
                    loop_state,
                    operating_mode: OperatingMode::from_raw(mode),
                    inputs: Inputs(inputs),
                    clutch_device_state: clutch,
                },
            })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(snapshot in snapshot_strategy()) {
            let layout = if snapshot.device.clutch_device_state.is_some() {
                PayloadLayout::WithClutchState
            } else {
                PayloadLayout::Standard
            };
            let bytes = encode_snapshot(&snapshot, layout);
            prop_assert_eq!(bytes.len(), layout.payload_len());
            prop_assert_eq!(decode_snapshot(&bytes, layout).unwrap(), snapshot);
        }

        #[test]
        fn any_payload_decodes(payload in proptest::collection::vec(any::<u8>(), PAYLOAD_SIZE)) {
            prop_assert!(decode_snapshot(&payload, PayloadLayout::Standard).is_ok());
        }
    }
}
