//! Irrigation decision function.
//!
//! ```text
//! OFF ──[moisture <= threshold]──▶ ON ──[moisture >= 100]──▶ OFF
//! ```
//!
//! Between the two trigger levels the current valve state is kept, so a
//! plant hovering just above its threshold never flaps.

use crate::plant::{ValveStatus, MAX_PERCENT};

/// Next valve state for the given moisture, threshold and current valve.
pub fn decide(moisture: u8, threshold: u8, current: ValveStatus) -> ValveStatus {
    match current {
        ValveStatus::Off if moisture <= threshold => ValveStatus::On,
        ValveStatus::On if moisture >= MAX_PERCENT => ValveStatus::Off,
        _ => current,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::ValveStatus::{Off, On};

    #[test]
    fn off_at_threshold_turns_on() {
        assert_eq!(decide(30, 30, Off), On);
    }

    #[test]
    fn off_below_threshold_turns_on() {
        assert_eq!(decide(12, 30, Off), On);
    }

    #[test]
    fn off_above_threshold_stays_off() {
        assert_eq!(decide(31, 30, Off), Off);
    }

    #[test]
    fn on_just_above_threshold_stays_on() {
        assert_eq!(decide(31, 30, On), On);
    }

    #[test]
    fn on_below_saturation_stays_on() {
        assert_eq!(decide(99, 30, On), On);
    }

    #[test]
    fn on_at_saturation_turns_off() {
        assert_eq!(decide(100, 30, On), Off);
    }

    #[test]
    fn off_at_saturation_with_full_threshold_turns_on() {
        // threshold 100 means "always water"; saturation only stops an open valve.
        assert_eq!(decide(100, 100, Off), On);
    }

    #[test]
    fn zero_threshold_only_triggers_when_bone_dry() {
        assert_eq!(decide(1, 0, Off), Off);
        assert_eq!(decide(0, 0, Off), On);
    }
}
