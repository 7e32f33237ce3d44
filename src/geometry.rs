//! Geometry Builder - the 24-point overlay mesh
//!
//! Converts the layout settings and the current controller snapshot into a
//! fixed-topology vertex set. The topology never changes; only coordinates do.
//!
//! ```text
//!            0
//!         1     2            throttle 0..5 (strip)
//!  11     3     4     14
//! 10                    13   wedges 10..13 / 13..16 (lists)
//!  12     9     8     15
//!         7     6            brake 5..10 (strip)
//!            5
//! ```
//!
//! The active fills (16..20 left, 20..24 right) share the inner wedge edge and
//! grow toward the outer apex as the stick deflects.
//!
//! Pixel space: origin top-left, y grows downward.

use std::ops::Range;

use crate::controller::{ControllerSnapshot, THUMB_MAX};
use crate::settings::LayoutConfig;

pub const VERTEX_COUNT: usize = 24;

pub const THROTTLE: Range<u32> = 0..5;
pub const BRAKE: Range<u32> = 5..10;
pub const LEFT_WEDGE: Range<u32> = 10..13;
pub const RIGHT_WEDGE: Range<u32> = 13..16;
pub const LEFT_FILL: Range<u32> = 16..20;
pub const RIGHT_FILL: Range<u32> = 20..24;

/// Texture coordinate written for every vertex; the solid effect ignores it.
pub const DUMMY_UV: Point2D = Point2D::ZERO;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

pub type GeometryBuffer = [Point2D; VERTEX_COUNT];

/// Positions plus the constant texture coordinates, as uploaded to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexData {
    pub points: GeometryBuffer,
    pub uvs: [Point2D; VERTEX_COUNT],
}

impl VertexData {
    pub fn zeroed() -> Self {
        Self::from_points([Point2D::ZERO; VERTEX_COUNT])
    }

    pub fn from_points(points: GeometryBuffer) -> Self {
        Self {
            points,
            uvs: [DUMMY_UV; VERTEX_COUNT],
        }
    }
}

/// Measurements derived from the overlay size, shared by every shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    pub width: f32,
    pub height: f32,
    pub w_mid: f32,
    pub h_mid: f32,
    pub button_width: f32,
    pub button_cap: f32,
    pub gap: f32,
    pub gap2: f32,
    pub left_inner: f32,
    pub right_inner: f32,
    pub tri_top: f32,
    pub tri_bot: f32,
}

impl LayoutMetrics {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as f32;
        let height = height as f32;
        let w_mid = width / 2.0;
        let h_mid = height / 2.0;
        let button_width = width * 0.09;
        let button_cap = height * 0.1;
        let gap = width * 0.02;
        let gap2 = gap / 2.0;

        Self {
            width,
            height,
            w_mid,
            h_mid,
            button_width,
            button_cap,
            gap,
            gap2,
            left_inner: w_mid - button_width - gap,
            right_inner: w_mid + button_width + gap,
            tri_top: button_cap + gap2,
            tri_bot: height - button_cap - gap2,
        }
    }

    /// Horizontal extent of a steering wedge.
    pub fn tri_width(&self) -> f32 {
        self.left_inner
    }

    /// Half the vertical extent of a steering wedge.
    pub fn tri_height(&self) -> f32 {
        self.h_mid - self.tri_top
    }
}

/// Steering deflection past the deadzone, rescaled so full lock is 1.0.
///
/// Not clamped: inside the deadzone the result is negative and at `i16::MIN`
/// it slightly exceeds 1.0. A deadzone of 32767 or more divides by zero.
pub fn normalize_steer(steer_axis: i16, deadzone: u16) -> f32 {
    let max = THUMB_MAX as f32;
    let deadzone = deadzone as f32;
    let magnitude = steer_axis.unsigned_abs() as f32;
    (magnitude - deadzone) / (1.0 - deadzone / max) / max
}

/// Fill factor used for the active quads, always within `0.0..=1.0`.
pub fn steer_fill(steer_axis: i16, deadzone: u16) -> f32 {
    let normalized = normalize_steer(steer_axis, deadzone);
    if normalized.is_nan() {
        0.0
    } else {
        normalized.clamp(0.0, 1.0)
    }
}

/// Computes all 24 points for one frame.
pub fn build(config: &LayoutConfig, snapshot: &ControllerSnapshot) -> GeometryBuffer {
    let m = LayoutMetrics::new(config.width, config.height);
    let mut points = [Point2D::ZERO; VERTEX_COUNT];

    // Throttle, anchored top-center
    points[0] = Point2D::new(m.w_mid, 0.0);
    points[1] = Point2D::new(m.w_mid - m.button_width, m.button_cap);
    points[2] = Point2D::new(m.w_mid + m.button_width, m.button_cap);
    points[3] = Point2D::new(m.w_mid - m.button_width, m.h_mid - m.gap2);
    points[4] = Point2D::new(m.w_mid + m.button_width, m.h_mid - m.gap2);

    // Brake, anchored bottom-center
    points[5] = Point2D::new(m.w_mid, m.height);
    points[6] = Point2D::new(m.w_mid + m.button_width, m.height - m.button_cap);
    points[7] = Point2D::new(m.w_mid - m.button_width, m.height - m.button_cap);
    points[8] = Point2D::new(m.w_mid + m.button_width, m.h_mid + m.gap2);
    points[9] = Point2D::new(m.w_mid - m.button_width, m.h_mid + m.gap2);

    // Steering wedges
    points[10] = Point2D::new(0.0, m.h_mid);
    points[11] = Point2D::new(m.left_inner, m.tri_top);
    points[12] = Point2D::new(m.left_inner, m.tri_bot);
    points[13] = Point2D::new(m.width, m.h_mid);
    points[14] = Point2D::new(m.right_inner, m.tri_top);
    points[15] = Point2D::new(m.right_inner, m.tri_bot);

    // tan(rho) = tri_height / tri_width, so the fill edge stays on the wedge outline
    let tri_width = m.tri_width();
    let tri_height = m.tri_height();
    let angle = if tri_width > 0.0 {
        tri_height / tri_width
    } else {
        0.0
    };
    let fill_width = tri_width * steer_fill(snapshot.steer_axis, config.deadzone);
    let fill_height = tri_height - angle * fill_width;

    points[16] = Point2D::new(m.left_inner - fill_width, m.h_mid - fill_height);
    points[17] = Point2D::new(m.left_inner - fill_width, m.h_mid + fill_height);
    points[18] = Point2D::new(m.left_inner, m.tri_top);
    points[19] = Point2D::new(m.left_inner, m.tri_bot);

    points[20] = Point2D::new(m.right_inner + fill_width, m.h_mid - fill_height);
    points[21] = Point2D::new(m.right_inner + fill_width, m.h_mid + fill_height);
    points[22] = Point2D::new(m.right_inner, m.tri_top);
    points[23] = Point2D::new(m.right_inner, m.tri_bot);

    points
}
