//! Color dispatch and draw planning.
//!
//! Every frame issues the same draws in the same order: throttle, brake, left
//! wedge, right wedge, then at most one active fill. Overlap is resolved by paint
//! order, so the order is part of the contract.

use std::ops::Range;

use crate::controller::ControllerSnapshot;
use crate::geometry::{BRAKE, LEFT_FILL, LEFT_WEDGE, RIGHT_FILL, RIGHT_WEDGE, THROTTLE};
use crate::settings::LayoutConfig;

/// Normalized color as consumed by the solid shader.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Unpacks a settings color: red in the low byte, alpha in the high byte.
    pub fn from_packed(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xFF) as f32 / 255.0;
        Self {
            r: channel(0),
            g: channel(8),
            b: channel(16),
            a: channel(24),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    /// Consecutive vertices share edges
    TriangleStrip,
    /// Every three vertices form an independent triangle
    TriangleList,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Throttle,
    Brake,
    LeftWedge,
    RightWedge,
    LeftFill,
    RightFill,
}

impl Shape {
    pub fn vertices(self) -> Range<u32> {
        match self {
            Shape::Throttle => THROTTLE,
            Shape::Brake => BRAKE,
            Shape::LeftWedge => LEFT_WEDGE,
            Shape::RightWedge => RIGHT_WEDGE,
            Shape::LeftFill => LEFT_FILL,
            Shape::RightFill => RIGHT_FILL,
        }
    }

    pub fn mode(self) -> DrawMode {
        match self {
            Shape::LeftWedge | Shape::RightWedge => DrawMode::TriangleList,
            _ => DrawMode::TriangleStrip,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SteerSide {
    Left,
    Right,
}

impl SteerSide {
    /// Side whose fill is drawn, or `None` while the stick is inside the deadzone.
    pub fn select(steer_axis: i16, deadzone: u16) -> Option<Self> {
        if steer_axis.unsigned_abs() <= deadzone {
            None
        } else if steer_axis < 0 {
            Some(SteerSide::Left)
        } else {
            Some(SteerSide::Right)
        }
    }

    pub fn fill(self) -> Shape {
        match self {
            SteerSide::Left => Shape::LeftFill,
            SteerSide::Right => Shape::RightFill,
        }
    }
}

/// One colored draw against the shared vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub shape: Shape,
    pub mode: DrawMode,
    pub start: u32,
    pub count: u32,
    pub color: Rgba,
}

impl DrawCall {
    fn new(shape: Shape, packed_color: u32) -> Self {
        let vertices = shape.vertices();
        Self {
            shape,
            mode: shape.mode(),
            start: vertices.start,
            count: vertices.end - vertices.start,
            color: Rgba::from_packed(packed_color),
        }
    }
}

/// Draws for one frame, in paint order.
pub fn plan_draws(config: &LayoutConfig, snapshot: &ControllerSnapshot) -> Vec<DrawCall> {
    let pressed_or_idle = |pressed: bool, color: u32| {
        if pressed {
            color
        } else {
            config.background_color
        }
    };

    let mut draws = Vec::with_capacity(5);
    draws.push(DrawCall::new(
        Shape::Throttle,
        pressed_or_idle(snapshot.throttle_pressed, config.throttle_color),
    ));
    draws.push(DrawCall::new(
        Shape::Brake,
        pressed_or_idle(snapshot.brake_pressed, config.brake_color),
    ));
    draws.push(DrawCall::new(Shape::LeftWedge, config.background_color));
    draws.push(DrawCall::new(Shape::RightWedge, config.background_color));

    if let Some(side) = SteerSide::select(snapshot.steer_axis, config.deadzone) {
        draws.push(DrawCall::new(side.fill(), config.steer_color));
    }
    draws
}
