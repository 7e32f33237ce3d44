//! Controller subsystem for gamepad input sampling
//!
//! 1. [`snapshot`] - Raw device state and the per-tick snapshot
//! 2. [`sampler`] - Non-blocking polling with last-known-good retention
//! 3. [`gilrs_backend`] - Real controller access through gilrs
//! 4. [`button_wait`] - Blocking button capture for binding throttle/brake
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► GilrsController ──► InputSampler ──► ControllerSnapshot
//!             (RawGamepadState)   (masks, retention)
//! ```

pub mod button_wait;
pub mod gilrs_backend;
pub mod sampler;
pub mod snapshot;

pub use button_wait::{wait_for_button, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
pub use gilrs_backend::GilrsController;
pub use sampler::{sample, ControllerSubsystem, InputSampler, SamplerError, MAX_CONTROLLERS};
pub use snapshot::{buttons, ControllerSnapshot, RawGamepadState, THUMB_MAX};
