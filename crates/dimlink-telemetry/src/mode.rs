//! Coarse controller mode derived from the device loop state.
//!
//! The firmware counts sub-steps inside a band (e.g. 200..1100 while
//! shifting), so only a few values match a named mode exactly. Lookup is
//! done in two phases: an exact table, then ordered range rules.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Aborting,
    Killed,
    Error,
    Inactive,
    Resetting,
    Idle,
    Shifting,
    Manual,
    Unknown,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Aborting => "ABORTING",
            Mode::Killed => "KILLED",
            Mode::Error => "ERROR",
            Mode::Inactive => "INACTIVE",
            Mode::Resetting => "RESETTING",
            Mode::Idle => "IDLE",
            Mode::Shifting => "SHIFTING",
            Mode::Manual => "MANUAL",
            Mode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loop states that name a mode directly.
const EXACT: [(i16, Mode); 8] = [
    (-3, Mode::Aborting),
    (-2, Mode::Killed),
    (-1, Mode::Error),
    (0, Mode::Inactive),
    (50, Mode::Resetting),
    (100, Mode::Idle),
    (200, Mode::Shifting),
    (1100, Mode::Manual),
];

/// Fallback bands, checked top to bottom.
const RANGES: [(RangeInclusive<i16>, Mode); 3] = [
    (200..=1099, Mode::Idle),
    (1100..=i16::MAX, Mode::Manual),
    (50..=99, Mode::Resetting),
];

fn exact(loop_state: i16) -> Option<Mode> {
    EXACT
        .iter()
        .find(|(value, _)| *value == loop_state)
        .map(|(_, mode)| *mode)
}

fn by_range(loop_state: i16) -> Option<Mode> {
    RANGES
        .iter()
        .find(|(range, _)| range.contains(&loop_state))
        .map(|(_, mode)| *mode)
}

/// Classify a raw loop state.
///
/// Values below 50 without an exact match are anomalous; they are logged and
/// reported as [`Mode::Unknown`].
pub fn classify(loop_state: i16) -> Mode {
    if let Some(mode) = exact(loop_state) {
        return mode;
    }
    by_range(loop_state).unwrap_or_else(|| {
        warn!(loop_state, "unrecognized loop state");
        Mode::Unknown
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_values() {
        assert_eq!(classify(-3), Mode::Aborting);
        assert_eq!(classify(-2), Mode::Killed);
        assert_eq!(classify(-1), Mode::Error);
        assert_eq!(classify(0), Mode::Inactive);
        assert_eq!(classify(50), Mode::Resetting);
        assert_eq!(classify(100), Mode::Idle);
        assert_eq!(classify(200), Mode::Shifting);
        assert_eq!(classify(1100), Mode::Manual);
    }

    #[test]
    fn shifting_band_reads_as_idle() {
        assert_eq!(classify(250), Mode::Idle);
        assert_eq!(classify(201), Mode::Idle);
        assert_eq!(classify(1099), Mode::Idle);
    }

    #[test]
    fn manual_band_is_open_ended() {
        assert_eq!(classify(1101), Mode::Manual);
        assert_eq!(classify(i16::MAX), Mode::Manual);
    }

    #[test]
    fn resetting_band() {
        assert_eq!(classify(51), Mode::Resetting);
        assert_eq!(classify(99), Mode::Resetting);
    }

    #[test]
    fn gaps_are_unknown() {
        // 101..200 has neither an exact entry nor a band.
        assert_eq!(classify(150), Mode::Unknown);
        assert_eq!(classify(49), Mode::Unknown);
        assert_eq!(classify(1), Mode::Unknown);
        assert_eq!(classify(-4), Mode::Unknown);
        assert_eq!(classify(i16::MIN), Mode::Unknown);
    }

    #[test]
    fn exact_match_wins_over_band() {
        assert_eq!(exact(200), Some(Mode::Shifting));
        assert_eq!(by_range(200), Some(Mode::Idle));
        assert_eq!(classify(200), Mode::Shifting);
    }

    #[test]
    fn labels() {
        assert_eq!(Mode::Resetting.to_string(), "RESETTING");
        assert_eq!(Mode::Unknown.as_str(), "UNKNOWN");
    }
}
