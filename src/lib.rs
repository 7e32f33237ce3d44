//! Throttle, brake and steering overlay for a video-compositing host.
//!
//! ```text
//! ControllerSubsystem ──► InputSampler ──► ControllerSnapshot
//!                                               │
//!                  LayoutConfig ──► geometry::build ──► 24 points ──► Graphics
//!                                   render::plan_draws ──► colored draws ──┘
//! ```

pub mod controller;
pub mod geometry;
pub mod host;
pub mod overlay;
pub mod render;
pub mod settings;

pub use controller::{ControllerSnapshot, ControllerSubsystem, InputSampler, SamplerError};
pub use geometry::{build, Point2D, VertexData};
pub use overlay::{OverlaySource, RenderingContext, SourceRegistry};
pub use settings::LayoutConfig;
