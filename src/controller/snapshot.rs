//! Controller state types shared by the sampler and the geometry builder.

/// Largest positive value of the horizontal stick axis.
pub const THUMB_MAX: i16 = i16::MAX;

/// XInput-style button bit masks.
///
/// The settings store keeps `throttle_button` / `brake_button` as these raw
/// masks, so the values must stay stable.
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Raw state reported by a controller subsystem for one device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawGamepadState {
    /// Pressed buttons as a bit mask (see [`buttons`])
    pub buttons: u16,
    /// Horizontal axis of the left stick, full signed range
    pub left_stick_x: i16,
}

impl RawGamepadState {
    pub fn is_pressed(&self, mask: u16) -> bool {
        self.buttons & mask != 0
    }
}

/// One tick's worth of sampled controller state.
///
/// The default snapshot is neutral: nothing pressed, stick centered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub throttle_pressed: bool,
    pub brake_pressed: bool,
    pub steer_axis: i16,
}

impl ControllerSnapshot {
    /// Derives a snapshot from raw device state and the configured button masks.
    pub fn from_raw(raw: RawGamepadState, throttle_mask: u16, brake_mask: u16) -> Self {
        Self {
            throttle_pressed: raw.is_pressed(throttle_mask),
            brake_pressed: raw.is_pressed(brake_mask),
            steer_axis: raw.left_stick_x,
        }
    }

    /// Absolute steering deflection, widened so `i16::MIN` does not overflow.
    pub fn steer_magnitude(&self) -> u16 {
        self.steer_axis.unsigned_abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_select_pressed_buttons() {
        let raw = RawGamepadState {
            buttons: buttons::A | buttons::DPAD_UP,
            left_stick_x: -1200,
        };
        let snapshot = ControllerSnapshot::from_raw(raw, buttons::A, buttons::X);

        assert!(snapshot.throttle_pressed);
        assert!(!snapshot.brake_pressed);
        assert_eq!(snapshot.steer_axis, -1200);
    }

    #[test]
    fn zero_mask_never_matches() {
        let raw = RawGamepadState {
            buttons: 0xFFFF,
            left_stick_x: 0,
        };
        let snapshot = ControllerSnapshot::from_raw(raw, 0, 0);
        assert!(!snapshot.throttle_pressed);
        assert!(!snapshot.brake_pressed);
    }

    #[test]
    fn magnitude_handles_full_negative_range() {
        let snapshot = ControllerSnapshot {
            steer_axis: i16::MIN,
            ..Default::default()
        };
        assert_eq!(snapshot.steer_magnitude(), 32768);
    }
}
