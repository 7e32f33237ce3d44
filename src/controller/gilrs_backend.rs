use gilrs::{Axis, Button, Event, EventType, Gilrs, GilrsBuilder};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use super::sampler::{ControllerSubsystem, SamplerError, MAX_CONTROLLERS};
use super::snapshot::{buttons, RawGamepadState, THUMB_MAX};

// Backend lifecycle states
#[state]
#[derive(Debug, Clone)]
pub enum BackendState {
    Initializing,
    Polling,
}

#[machine]
#[derive(Debug)]
pub struct GilrsController<S: BackendState> {
    // Gilrs context, built without event filters
    gilrs: Gilrs,
}

impl GilrsController<Initializing> {
    pub fn create() -> Result<Self, SamplerError> {
        info!("Initializing gilrs controller interface");
        // Raw axis values: no gilrs deadzone or jitter filter
        let gilrs = match GilrsBuilder::new().with_default_filters(false).build() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SamplerError::unavailable(0, e.to_string()));
            }
        };

        Ok(Self::new(gilrs))
    }

    // List connected gamepads and transition to Polling
    pub fn initialize(self) -> GilrsController<Polling> {
        let count = self.gilrs.gamepads().count();

        if count == 0 {
            warn!("No gamepad connected, overlay keeps its neutral state until one appears");
        } else {
            info!("Found {} gamepads:", count);
            for (slot, (id, gamepad)) in self.gilrs.gamepads().enumerate() {
                info!(
                    "  [{}] ID: {}, Name: {}, UUID: {:?}",
                    slot,
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
            }
        }

        debug!("Gilrs backend ready, transitioning to Polling state");
        self.transition()
    }
}

impl GilrsController<Polling> {
    // Drain queued events so gamepad state reflects the latest input
    fn pump_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Controller {} connected", id),
                EventType::Disconnected => warn!("Controller {} disconnected", id),
                _ => {}
            }
        }
    }
}

impl ControllerSubsystem for GilrsController<Polling> {
    fn get_state(&mut self, index: u32) -> Result<RawGamepadState, SamplerError> {
        if index >= MAX_CONTROLLERS {
            return Err(SamplerError::InvalidIndex(index));
        }
        self.pump_events();

        let (_, gamepad) = self
            .gilrs
            .gamepads()
            .nth(index as usize)
            .ok_or_else(|| SamplerError::unavailable(index, "no gamepad in this slot"))?;

        let buttons = BUTTON_MAP
            .iter()
            .filter(|(button, _)| gamepad.is_pressed(*button))
            .fold(0u16, |mask, (_, bit)| mask | bit);

        Ok(RawGamepadState {
            buttons,
            left_stick_x: axis_to_i16(gamepad.value(Axis::LeftStickX)),
        })
    }
}

// gilrs buttons and their XInput-style bits
const BUTTON_MAP: [(Button, u16); 14] = [
    (Button::DPadUp, buttons::DPAD_UP),
    (Button::DPadDown, buttons::DPAD_DOWN),
    (Button::DPadLeft, buttons::DPAD_LEFT),
    (Button::DPadRight, buttons::DPAD_RIGHT),
    (Button::Start, buttons::START),
    (Button::Select, buttons::BACK),
    (Button::LeftThumb, buttons::LEFT_THUMB),
    (Button::RightThumb, buttons::RIGHT_THUMB),
    (Button::LeftTrigger, buttons::LEFT_SHOULDER),
    (Button::RightTrigger, buttons::RIGHT_SHOULDER),
    (Button::South, buttons::A),
    (Button::East, buttons::B),
    (Button::West, buttons::X),
    (Button::North, buttons::Y),
];

// Scale a normalized gilrs axis (-1.0..=1.0) onto the signed 16-bit range
fn axis_to_i16(value: f32) -> i16 {
    if value < 0.0 {
        (value * -(i16::MIN as f32)).round().max(i16::MIN as f32) as i16
    } else {
        (value * THUMB_MAX as f32).round().min(THUMB_MAX as f32) as i16
    }
}
