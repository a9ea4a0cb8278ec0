use std::fmt;

use serde::Serialize;

use crate::codec::NUM_MOTORS;
use crate::mode::{classify, Mode};

/// Motor controller state, as reported in the first field of a motor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorState {
    Killed,
    Idle,
    Moving,
    Jogging,
    HoldPosition,
    Stopping,
    /// A value the firmware sent that has no name here. Kept verbatim.
    Unknown(i16),
}

impl MotorState {
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            -1 => MotorState::Killed,
            0 => MotorState::Idle,
            2 => MotorState::Moving,
            3 => MotorState::Jogging,
            4 => MotorState::HoldPosition,
            5 => MotorState::Stopping,
            other => MotorState::Unknown(other),
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            MotorState::Killed => -1,
            MotorState::Idle => 0,
            MotorState::Moving => 2,
            MotorState::Jogging => 3,
            MotorState::HoldPosition => 4,
            MotorState::Stopping => 5,
            MotorState::Unknown(raw) => raw,
        }
    }

    /// True for states in which the motor is actively driven.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            MotorState::Moving | MotorState::Jogging | MotorState::HoldPosition
        )
    }
}

impl fmt::Display for MotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorState::Killed => f.write_str("killed"),
            MotorState::Idle => f.write_str("idle"),
            MotorState::Moving => f.write_str("moving"),
            MotorState::Jogging => f.write_str("jogging"),
            MotorState::HoldPosition => f.write_str("holding position"),
            MotorState::Stopping => f.write_str("stopping"),
            MotorState::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

/// One motor's slice of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotorRecord {
    pub state: MotorState,
    pub actual_position: f32,
    pub actual_velocity: f32,
    pub target_position: f32,
    /// Firmware process driving this motor.
    pub active_process: u8,
    /// Step counter within the active process.
    pub process_step: i16,
}

impl Default for MotorRecord {
    fn default() -> Self {
        Self {
            state: MotorState::Idle,
            actual_position: 0.0,
            actual_velocity: 0.0,
            target_position: 0.0,
            active_process: 0,
            process_step: 0,
        }
    }
}

/// Which physical motor a record slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorSlot {
    Clutch,
    LinearPrimary,
    LinearSecondary,
}

impl MotorSlot {
    /// Slots in payload order.
    pub const ALL: [MotorSlot; NUM_MOTORS] = [
        MotorSlot::Clutch,
        MotorSlot::LinearPrimary,
        MotorSlot::LinearSecondary,
    ];

    pub fn index(self) -> usize {
        match self {
            MotorSlot::Clutch => 0,
            MotorSlot::LinearPrimary => 1,
            MotorSlot::LinearSecondary => 2,
        }
    }
}

impl fmt::Display for MotorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MotorSlot::Clutch => "Clutch",
            MotorSlot::LinearPrimary => "Linear Primary",
            MotorSlot::LinearSecondary => "Linear Secondary",
        })
    }
}

/// Top-level operating mode selected on the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    #[default]
    Auto,
    ManualClutchJogging,
    ManualLinearP,
    ManualLinearS,
    IoCheckout,
    ManualClutchEngage,
    Unknown(u8),
}

impl OperatingMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => OperatingMode::Auto,
            1 => OperatingMode::ManualClutchJogging,
            2 => OperatingMode::ManualLinearP,
            3 => OperatingMode::ManualLinearS,
            4 => OperatingMode::IoCheckout,
            5 => OperatingMode::ManualClutchEngage,
            other => OperatingMode::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            OperatingMode::Auto => 0,
            OperatingMode::ManualClutchJogging => 1,
            OperatingMode::ManualLinearP => 2,
            OperatingMode::ManualLinearS => 3,
            OperatingMode::IoCheckout => 4,
            OperatingMode::ManualClutchEngage => 5,
            OperatingMode::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Auto => f.write_str("AUTO"),
            OperatingMode::ManualClutchJogging => f.write_str("MANUAL CLUTCH JOGGING"),
            OperatingMode::ManualLinearP => f.write_str("MANUAL LINEAR P"),
            OperatingMode::ManualLinearS => f.write_str("MANUAL LINEAR S"),
            OperatingMode::IoCheckout => f.write_str("IO CHECKOUT"),
            OperatingMode::ManualClutchEngage => f.write_str("MANUAL CLUTCH ENGAGE"),
            OperatingMode::Unknown(raw) => write!(f, "UNKNOWN ({raw})"),
        }
    }
}

/// Labels for the eight digital inputs, by bit position.
pub const INPUT_LABELS: [&str; 8] = [
    "Shift Down Switch",
    "Shift Up Switch",
    "Clutch Negative Limit",
    "Clutch Positive Limit",
    "Reserved 4",
    "Reserved 5",
    "Reserved 6",
    "Reserved 7",
];

/// Digital inputs packed one per bit (bit i = input i).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Inputs(pub u8);

impl Inputs {
    pub const SHIFT_DOWN: usize = 0;
    pub const SHIFT_UP: usize = 1;
    pub const CLUTCH_NEGATIVE_LIMIT: usize = 2;
    pub const CLUTCH_POSITIVE_LIMIT: usize = 3;

    /// State of input `index`. Indices past 7 read as off.
    pub fn get(self, index: usize) -> bool {
        index < 8 && self.0 & (1 << index) != 0
    }

    pub fn shift_down(self) -> bool {
        self.get(Self::SHIFT_DOWN)
    }

    pub fn shift_up(self) -> bool {
        self.get(Self::SHIFT_UP)
    }

    pub fn clutch_negative_limit(self) -> bool {
        self.get(Self::CLUTCH_NEGATIVE_LIMIT)
    }

    pub fn clutch_positive_limit(self) -> bool {
        self.get(Self::CLUTCH_POSITIVE_LIMIT)
    }

    /// All eight flags in bit order.
    pub fn to_array(self) -> [bool; 8] {
        std::array::from_fn(|i| self.get(i))
    }
}

/// The device-level tail of the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    /// Raw controller loop state; see [`classify`].
    pub loop_state: i16,
    pub operating_mode: OperatingMode,
    pub inputs: Inputs,
    /// Auxiliary clutch status, only sent by the extended layout.
    pub clutch_device_state: Option<u16>,
}

impl DeviceRecord {
    pub fn mode(&self) -> Mode {
        classify(self.loop_state)
    }
}

/// One decoded frame: every motor plus the device record.
///
/// Produced whole per valid frame and never patched afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub motors: [MotorRecord; NUM_MOTORS],
    pub device: DeviceRecord,
}

impl TelemetrySnapshot {
    pub fn motor(&self, slot: MotorSlot) -> &MotorRecord {
        &self.motors[slot.index()]
    }

    pub fn mode(&self) -> Mode {
        self.device.mode()
    }
}
