//! # Overlay Settings
//!
//! Defines the persisted key/value schema of one overlay instance and the typed
//! [`LayoutConfig`] the core reads every frame.
//!
//! ## Schema
//! | key | meaning | default | range |
//! |---|---|---|---|
//! | `throttle_color` | packed RGBA of a pressed throttle | `0xFF4DEC53` | |
//! | `brake_color` | packed RGBA of a pressed brake | `0xFFEC584D` | |
//! | `steer_color` | packed RGBA of the active fill | `0xFF4DBCEC` | |
//! | `background_color` | packed RGBA of idle shapes | `0xFFE2E2E2` | |
//! | `width` / `height` | overlay size in pixels | 500 / 300 | 0-4096 |
//! | `player_id` | controller slot | 0 | 0-3 |
//! | `throttle_button` / `brake_button` | button masks | A / X | |
//! | `deadzone` | stick threshold | 7000 | 0-32767 |
//!
//! Values read from a store are clamped into these ranges, so a hand-edited
//! settings file cannot push the geometry outside its domain.

pub mod file;

use tracing::warn;

use crate::controller::{buttons, MAX_CONTROLLERS, THUMB_MAX};
use crate::host::SettingsStore;

pub use file::{default_settings_path, load_or_init_settings, load_settings, save_settings};

pub const THROTTLE_COLOR: &str = "throttle_color";
pub const BRAKE_COLOR: &str = "brake_color";
pub const STEER_COLOR: &str = "steer_color";
pub const BACKGROUND_COLOR: &str = "background_color";
pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const PLAYER_ID: &str = "player_id";
pub const THROTTLE_BUTTON: &str = "throttle_button";
pub const BRAKE_BUTTON: &str = "brake_button";
pub const DEADZONE: &str = "deadzone";

pub const MAX_DIMENSION: u32 = 4096;

/// Layout and input settings consumed by the sampler, builder and renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub deadzone: u16,
    pub player_id: u32,
    pub throttle_button: u16,
    pub brake_button: u16,
    pub throttle_color: u32,
    pub brake_color: u32,
    pub steer_color: u32,
    pub background_color: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 300,
            deadzone: 7000,
            player_id: 0,
            throttle_button: buttons::A,
            brake_button: buttons::X,
            throttle_color: 0xFF4DEC53,
            brake_color: 0xFFEC584D,
            steer_color: 0xFF4DBCEC,
            background_color: 0xFFE2E2E2,
        }
    }
}

impl LayoutConfig {
    /// Reads every key, clamping integers into the schema ranges.
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        Self {
            width: clamped(store, WIDTH, 0, MAX_DIMENSION as i64) as u32,
            height: clamped(store, HEIGHT, 0, MAX_DIMENSION as i64) as u32,
            deadzone: clamped(store, DEADZONE, 0, THUMB_MAX as i64) as u16,
            player_id: clamped(store, PLAYER_ID, 0, MAX_CONTROLLERS as i64 - 1) as u32,
            throttle_button: clamped(store, THROTTLE_BUTTON, 0, u16::MAX as i64) as u16,
            brake_button: clamped(store, BRAKE_BUTTON, 0, u16::MAX as i64) as u16,
            throttle_color: store.get_color(THROTTLE_COLOR),
            brake_color: store.get_color(BRAKE_COLOR),
            steer_color: store.get_color(STEER_COLOR),
            background_color: store.get_color(BACKGROUND_COLOR),
        }
    }
}

fn clamped(store: &dyn SettingsStore, key: &str, min: i64, max: i64) -> i64 {
    let value = store.get_int(key);
    if value < min || value > max {
        warn!(
            "Setting {} = {} outside {}..={}, clamping",
            key, value, min, max
        );
    }
    value.clamp(min, max)
}

/// Registers the schema defaults with the host store.
pub fn register_defaults(store: &mut dyn SettingsStore) {
    let defaults = LayoutConfig::default();
    store.set_default_int(THROTTLE_COLOR, defaults.throttle_color as i64);
    store.set_default_int(BRAKE_COLOR, defaults.brake_color as i64);
    store.set_default_int(STEER_COLOR, defaults.steer_color as i64);
    store.set_default_int(BACKGROUND_COLOR, defaults.background_color as i64);
    store.set_default_int(WIDTH, defaults.width as i64);
    store.set_default_int(HEIGHT, defaults.height as i64);
    store.set_default_int(PLAYER_ID, defaults.player_id as i64);
    store.set_default_int(THROTTLE_BUTTON, defaults.throttle_button as i64);
    store.set_default_int(BRAKE_BUTTON, defaults.brake_button as i64);
    store.set_default_int(DEADZONE, defaults.deadzone as i64);
}

/// Editable property shown by the host's property panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertySpec {
    Color {
        key: &'static str,
        label: &'static str,
    },
    IntSlider {
        key: &'static str,
        label: &'static str,
        min: i64,
        max: i64,
        step: i64,
    },
    Int {
        key: &'static str,
        label: &'static str,
        min: i64,
        max: i64,
        step: i64,
    },
}

impl PropertySpec {
    pub fn key(&self) -> &'static str {
        match self {
            PropertySpec::Color { key, .. }
            | PropertySpec::IntSlider { key, .. }
            | PropertySpec::Int { key, .. } => key,
        }
    }
}

/// Property panel layout. Button masks are bound through the runner, not here.
pub fn properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::Color {
            key: THROTTLE_COLOR,
            label: "Throttle color",
        },
        PropertySpec::Color {
            key: BRAKE_COLOR,
            label: "Brake color",
        },
        PropertySpec::Color {
            key: STEER_COLOR,
            label: "Steering color",
        },
        PropertySpec::Color {
            key: BACKGROUND_COLOR,
            label: "Background color",
        },
        PropertySpec::IntSlider {
            key: DEADZONE,
            label: "Deadzone",
            min: 0,
            max: THUMB_MAX as i64,
            step: 1,
        },
        PropertySpec::IntSlider {
            key: PLAYER_ID,
            label: "Controller",
            min: 0,
            max: MAX_CONTROLLERS as i64 - 1,
            step: 1,
        },
        PropertySpec::Int {
            key: WIDTH,
            label: "Width",
            min: 0,
            max: MAX_DIMENSION as i64,
            step: 1,
        },
        PropertySpec::Int {
            key: HEIGHT,
            label: "Height",
            min: 0,
            max: MAX_DIMENSION as i64,
            step: 1,
        },
    ]
}
