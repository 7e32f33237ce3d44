//! Input Sampler - per-tick controller polling
//!
//! Queries one controller slot per tick and condenses the raw device state into a
//! [`ControllerSnapshot`]. The query is a single non-blocking call; when the device
//! cannot be read the previous snapshot stays in place so a disconnect never makes
//! the overlay flicker back to a neutral state.
//!
//! ```text
//! ControllerSubsystem ──get_state(index)──► RawGamepadState ──masks──► ControllerSnapshot
//! ```

use tracing::{debug, info, warn};

use super::snapshot::{ControllerSnapshot, RawGamepadState};
use crate::settings::LayoutConfig;

/// Number of controller slots a subsystem exposes.
pub const MAX_CONTROLLERS: u32 = 4;

/// Errors raised while reading a controller.
///
/// Both variants are non-fatal: the caller keeps its last-known-good state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SamplerError {
    #[error("Controller index {0} is outside 0-3")]
    InvalidIndex(u32),

    #[error("Controller {index} unavailable: {reason}")]
    Unavailable { index: u32, reason: String },
}

impl SamplerError {
    pub fn unavailable(index: u32, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            index,
            reason: reason.into(),
        }
    }

    /// True for every "device cannot be read right now" condition.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::InvalidIndex(_) | Self::Unavailable { .. })
    }
}

/// Source of raw controller state.
///
/// Implementations must answer without blocking; the call happens once per tick.
pub trait ControllerSubsystem {
    fn get_state(&mut self, index: u32) -> Result<RawGamepadState, SamplerError>;
}

impl<T: ControllerSubsystem + ?Sized> ControllerSubsystem for Box<T> {
    fn get_state(&mut self, index: u32) -> Result<RawGamepadState, SamplerError> {
        (**self).get_state(index)
    }
}

/// Reads controller `index` once and derives a snapshot from it.
pub fn sample<C: ControllerSubsystem + ?Sized>(
    subsystem: &mut C,
    index: u32,
    throttle_mask: u16,
    brake_mask: u16,
) -> Result<ControllerSnapshot, SamplerError> {
    if index >= MAX_CONTROLLERS {
        return Err(SamplerError::InvalidIndex(index));
    }

    let raw = subsystem.get_state(index)?;
    Ok(ControllerSnapshot::from_raw(raw, throttle_mask, brake_mask))
}

/// Holds the last-known-good snapshot between ticks.
#[derive(Debug, Default)]
pub struct InputSampler {
    snapshot: ControllerSnapshot,
    connected: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshot
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Samples the configured controller and updates the stored snapshot.
    ///
    /// On error the stored snapshot is left untouched and the error is returned
    /// for the caller to inspect or ignore.
    pub fn tick<C: ControllerSubsystem + ?Sized>(
        &mut self,
        subsystem: &mut C,
        config: &LayoutConfig,
    ) -> Result<ControllerSnapshot, SamplerError> {
        match sample(
            subsystem,
            config.player_id,
            config.throttle_button,
            config.brake_button,
        ) {
            Ok(snapshot) => {
                if !self.connected {
                    info!("Controller {} is available", config.player_id);
                    self.connected = true;
                }
                if snapshot != self.snapshot {
                    debug!("Snapshot changed: {:?} -> {:?}", self.snapshot, snapshot);
                }
                self.snapshot = snapshot;
                Ok(snapshot)
            }
            Err(e) => {
                if self.connected {
                    warn!("Lost controller {}: {}", config.player_id, e);
                    self.connected = false;
                } else {
                    debug!("Controller read failed: {}", e);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::snapshot::buttons;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of results, then reports the device as gone.
    struct Scripted {
        results: VecDeque<Result<RawGamepadState, SamplerError>>,
        queried: Vec<u32>,
    }

    impl Scripted {
        fn new(results: Vec<Result<RawGamepadState, SamplerError>>) -> Self {
            Self {
                results: results.into(),
                queried: Vec::new(),
            }
        }
    }

    impl ControllerSubsystem for Scripted {
        fn get_state(&mut self, index: u32) -> Result<RawGamepadState, SamplerError> {
            self.queried.push(index);
            self.results
                .pop_front()
                .unwrap_or_else(|| Err(SamplerError::unavailable(index, "script exhausted")))
        }
    }

    fn raw(buttons: u16, left_stick_x: i16) -> RawGamepadState {
        RawGamepadState {
            buttons,
            left_stick_x,
        }
    }

    #[test]
    fn sample_derives_flags_and_axis() {
        let mut pad = Scripted::new(vec![Ok(raw(buttons::X | buttons::B, 20000))]);
        let snapshot = sample(&mut pad, 2, buttons::A, buttons::X).unwrap();

        assert_eq!(
            snapshot,
            ControllerSnapshot {
                throttle_pressed: false,
                brake_pressed: true,
                steer_axis: 20000,
            }
        );
        assert_eq!(pad.queried, vec![2]);
    }

    #[test]
    fn invalid_index_is_rejected_without_querying() {
        let mut pad = Scripted::new(vec![Ok(raw(0, 0))]);
        let err = sample(&mut pad, 4, buttons::A, buttons::X).unwrap_err();

        assert_eq!(err, SamplerError::InvalidIndex(4));
        assert!(err.is_unavailable());
        assert!(pad.queried.is_empty());
    }

    #[test]
    fn tick_keeps_last_known_good_snapshot() {
        let config = LayoutConfig::default();
        let mut pad = Scripted::new(vec![
            Ok(raw(buttons::A, -15000)),
            Err(SamplerError::unavailable(0, "unplugged")),
        ]);
        let mut sampler = InputSampler::new();

        sampler.tick(&mut pad, &config).unwrap();
        let before = sampler.snapshot();
        assert!(sampler.is_connected());

        assert!(sampler.tick(&mut pad, &config).is_err());
        assert_eq!(sampler.snapshot(), before);
        assert!(!sampler.is_connected());
        assert!(before.throttle_pressed);
        assert_eq!(before.steer_axis, -15000);
    }

    #[test]
    fn tick_starts_from_neutral_snapshot() {
        let config = LayoutConfig::default();
        let mut pad = Scripted::new(vec![]);
        let mut sampler = InputSampler::new();

        assert!(sampler.tick(&mut pad, &config).is_err());
        assert_eq!(sampler.snapshot(), ControllerSnapshot::default());
    }
}
