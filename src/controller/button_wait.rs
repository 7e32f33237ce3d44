//! Blocking "press a button" helper used while binding throttle/brake buttons.
//!
//! Not part of the per-frame path: it sleeps between polls and may block for the
//! full timeout.

use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::sampler::ControllerSubsystem;

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls controller `index` every `interval` until any button is held.
///
/// Returns the full button mask of the first nonzero read, or `None` once
/// `timeout` has elapsed. Read errors are treated as "nothing pressed".
pub fn wait_for_button<C: ControllerSubsystem + ?Sized>(
    subsystem: &mut C,
    index: u32,
    timeout: Duration,
    interval: Duration,
) -> Option<u16> {
    info!(
        "Waiting up to {:?} for a button on controller {}",
        timeout, index
    );
    let deadline = Instant::now() + timeout;

    loop {
        match subsystem.get_state(index) {
            Ok(state) if state.buttons != 0 => {
                info!("Captured button mask {:#06x}", state.buttons);
                return Some(state.buttons);
            }
            Ok(_) => {}
            Err(e) => debug!("Button wait read failed: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            info!("No button pressed within {:?}", timeout);
            return None;
        }
        thread::sleep(interval.min(deadline - now));
    }
}
