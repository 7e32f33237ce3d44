//! Overlay source - per-instance lifecycle driven by the host
//!
//! ```text
//! create ──► update* ──► (tick ─► render)* ──► destroy
//!   │                                            │
//!   └── vertex buffer allocated      released ───┘
//!       (graphics lock held)         (graphics lock held, once)
//! ```
//!
//! [`RenderingContext`] owns the layout settings, the sampler with its
//! last-known-good snapshot, the controller subsystem and the host vertex
//! buffer. No hook returns an error to the host: failures are logged and the
//! overlay degrades to drawing nothing.

pub mod registry;

use tracing::{debug, error, info, warn};

use crate::controller::{ControllerSnapshot, ControllerSubsystem, InputSampler};
use crate::geometry::{self, VertexData};
use crate::host::{Graphics, GraphicsLock, SettingsStore};
use crate::render::plan_draws;
use crate::settings::LayoutConfig;

pub use registry::{
    precision_gamepad_source, CreateFn, OutputFlags, RegistryError, SourceHandle, SourceInfo,
    SourceKind, SourceRegistry, SOURCE_ID,
};

/// Hooks the host drives on a created source instance.
pub trait OverlaySource<G: Graphics> {
    fn update(&mut self, settings: &dyn SettingsStore);
    fn tick(&mut self, seconds: f32);
    fn render(&mut self, graphics: &mut G);
    fn destroy(&mut self, graphics: &mut G);
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

pub struct RenderingContext<G: Graphics, C: ControllerSubsystem> {
    config: LayoutConfig,
    sampler: InputSampler,
    controller: C,
    buffer: Option<G::Buffer>,
}

impl<G: Graphics, C: ControllerSubsystem> RenderingContext<G, C> {
    /// Allocates the vertex buffer and applies the initial settings.
    ///
    /// A failed allocation is logged; the context then renders nothing.
    pub fn create(settings: &dyn SettingsStore, controller: C, graphics: &mut G) -> Self {
        let buffer = {
            let mut gfx = GraphicsLock::acquire(graphics);
            match gfx.create_vertex_buffer(&VertexData::zeroed()) {
                Ok(buffer) => Some(buffer),
                Err(e) => {
                    error!("Overlay will not render: {}", e);
                    None
                }
            }
        };

        let config = LayoutConfig::from_store(settings);
        info!(
            "Created overlay {}x{} for controller {}",
            config.width, config.height, config.player_id
        );

        Self {
            config,
            sampler: InputSampler::new(),
            controller,
            buffer,
        }
    }

    /// Re-reads every setting.
    pub fn update(&mut self, settings: &dyn SettingsStore) {
        let config = LayoutConfig::from_store(settings);
        if config != self.config {
            debug!("Overlay settings changed: {:?}", config);
        }
        self.config = config;
    }

    /// Samples the controller; on failure the previous snapshot is kept.
    pub fn tick(&mut self, _seconds: f32) {
        // Errors are already logged by the sampler
        let _ = self.sampler.tick(&mut self.controller, &self.config);
    }

    /// Rebuilds the mesh and issues the frame's draws.
    pub fn render(&mut self, graphics: &mut G) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };

        let snapshot = self.sampler.snapshot();
        let data = VertexData::from_points(geometry::build(&self.config, &snapshot));
        graphics.replace_vertex_data(buffer, &data);
        graphics.flush(buffer);
        graphics.load_vertex_buffer(buffer);

        graphics.begin_solid();
        for call in plan_draws(&self.config, &snapshot) {
            graphics.set_color(call.color);
            graphics.draw(call.mode, call.start, call.count);
        }
        graphics.end_solid();
    }

    /// Releases the vertex buffer. Safe to call more than once.
    pub fn destroy(&mut self, graphics: &mut G) {
        // Clear the owner before releasing so a repeated destroy finds nothing
        if let Some(buffer) = self.buffer.take() {
            let mut gfx = GraphicsLock::acquire(graphics);
            gfx.destroy_vertex_buffer(buffer);
            info!("Overlay destroyed, vertex buffer released");
        } else {
            debug!("Overlay destroy with no vertex buffer");
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.sampler.snapshot()
    }

    pub fn is_controller_connected(&self) -> bool {
        self.sampler.is_connected()
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }
}

impl<G: Graphics, C: ControllerSubsystem> OverlaySource<G> for RenderingContext<G, C> {
    fn update(&mut self, settings: &dyn SettingsStore) {
        RenderingContext::update(self, settings)
    }

    fn tick(&mut self, seconds: f32) {
        RenderingContext::tick(self, seconds)
    }

    fn render(&mut self, graphics: &mut G) {
        RenderingContext::render(self, graphics)
    }

    fn destroy(&mut self, graphics: &mut G) {
        RenderingContext::destroy(self, graphics)
    }

    fn width(&self) -> u32 {
        RenderingContext::width(self)
    }

    fn height(&self) -> u32 {
        RenderingContext::height(self)
    }
}

impl<G: Graphics, C: ControllerSubsystem> Drop for RenderingContext<G, C> {
    fn drop(&mut self) {
        if self.buffer.is_some() {
            warn!("Overlay dropped without destroy, vertex buffer leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{buttons, RawGamepadState, SamplerError};
    use crate::host::{GraphicsCommand, MemorySettings, RecordingGraphics};
    use crate::render::{DrawMode, Rgba};
    use crate::settings::{register_defaults, HEIGHT, PLAYER_ID, WIDTH};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Controller whose state the test mutates between ticks.
    #[derive(Clone, Default)]
    struct SharedPad(Rc<RefCell<Option<RawGamepadState>>>);

    impl SharedPad {
        fn set(&self, state: Option<RawGamepadState>) {
            *self.0.borrow_mut() = state;
        }
    }

    impl ControllerSubsystem for SharedPad {
        fn get_state(&mut self, index: u32) -> Result<RawGamepadState, SamplerError> {
            (*self.0.borrow()).ok_or_else(|| SamplerError::unavailable(index, "unplugged"))
        }
    }

    fn settings() -> MemorySettings {
        let mut store = MemorySettings::new();
        register_defaults(&mut store);
        store
    }

    #[test]
    fn create_then_destroy_without_update_releases_once() {
        let mut gfx = RecordingGraphics::new();
        let mut overlay = RenderingContext::create(&settings(), SharedPad::default(), &mut gfx);
        assert!(overlay.has_buffer());
        assert_eq!(gfx.live_buffers(), 1);

        overlay.destroy(&mut gfx);
        overlay.destroy(&mut gfx);

        assert_eq!(gfx.live_buffers(), 0);
        assert_eq!(gfx.unlocked_resource_ops(), 0);
        let destroys = gfx
            .commands()
            .iter()
            .filter(|c| matches!(c, GraphicsCommand::DestroyBuffer { .. }))
            .count();
        assert_eq!(destroys, 1);
        assert!(!gfx.is_entered());
    }

    #[test]
    fn buffer_lifetime_is_bracketed_by_the_lock() {
        let mut gfx = RecordingGraphics::new();
        let mut overlay = RenderingContext::create(&settings(), SharedPad::default(), &mut gfx);
        overlay.destroy(&mut gfx);

        assert_eq!(
            gfx.commands(),
            vec![
                GraphicsCommand::Enter,
                GraphicsCommand::CreateBuffer { id: 1 },
                GraphicsCommand::Leave,
                GraphicsCommand::Enter,
                GraphicsCommand::DestroyBuffer { id: 1 },
                GraphicsCommand::Leave,
            ]
        );
    }

    #[test]
    fn failed_allocation_renders_nothing() {
        let mut gfx = RecordingGraphics::new();
        gfx.fail_next_create();
        let mut overlay = RenderingContext::create(&settings(), SharedPad::default(), &mut gfx);
        assert!(!overlay.has_buffer());

        gfx.take_commands();
        overlay.tick(0.016);
        overlay.render(&mut gfx);
        assert!(gfx.commands().is_empty());

        overlay.destroy(&mut gfx);
        assert!(gfx.commands().is_empty());
    }

    #[test]
    fn render_uploads_then_draws_in_order() {
        let pad = SharedPad::default();
        pad.set(Some(RawGamepadState {
            buttons: buttons::A,
            left_stick_x: -20000,
        }));
        let store = settings();
        let mut gfx = RecordingGraphics::new();
        let mut overlay = RenderingContext::create(&store, pad, &mut gfx);
        gfx.take_commands();

        overlay.tick(0.016);
        overlay.render(&mut gfx);

        let config = LayoutConfig::default();
        let commands = gfx.commands();
        assert_eq!(
            &commands[..4],
            &[
                GraphicsCommand::ReplaceData { id: 1 },
                GraphicsCommand::Flush { id: 1 },
                GraphicsCommand::LoadBuffer { id: 1 },
                GraphicsCommand::BeginSolid,
            ]
        );
        assert_eq!(commands.last(), Some(&GraphicsCommand::EndSolid));
        assert_eq!(
            gfx.draw_calls(),
            vec![
                (DrawMode::TriangleStrip, 0, 5, Rgba::from_packed(config.throttle_color)),
                (DrawMode::TriangleStrip, 5, 5, Rgba::from_packed(config.background_color)),
                (DrawMode::TriangleList, 10, 3, Rgba::from_packed(config.background_color)),
                (DrawMode::TriangleList, 13, 3, Rgba::from_packed(config.background_color)),
                (DrawMode::TriangleStrip, 16, 4, Rgba::from_packed(config.steer_color)),
            ]
        );

        let uploaded = gfx.last_uploaded().unwrap();
        assert_eq!(uploaded.points, geometry::build(&config, &overlay.snapshot()));
        overlay.destroy(&mut gfx);
    }

    #[test]
    fn disconnect_keeps_last_snapshot() {
        let pad = SharedPad::default();
        let mut gfx = RecordingGraphics::new();
        let mut overlay = RenderingContext::create(&settings(), pad.clone(), &mut gfx);

        pad.set(Some(RawGamepadState {
            buttons: buttons::X,
            left_stick_x: 30000,
        }));
        overlay.tick(0.016);
        let held = overlay.snapshot();
        assert!(held.brake_pressed);

        pad.set(None);
        overlay.tick(0.016);
        assert_eq!(overlay.snapshot(), held);
        assert!(!overlay.is_controller_connected());
        overlay.destroy(&mut gfx);
    }

    #[test]
    fn update_applies_new_settings() {
        let mut store = settings();
        let mut gfx = RecordingGraphics::new();
        let mut overlay = RenderingContext::create(&store, SharedPad::default(), &mut gfx);
        assert_eq!((overlay.width(), overlay.height()), (500, 300));

        store.set_int(WIDTH, 1024);
        store.set_int(HEIGHT, 256);
        store.set_int(PLAYER_ID, 2);
        overlay.update(&store);

        assert_eq!((overlay.width(), overlay.height()), (1024, 256));
        assert_eq!(overlay.config().player_id, 2);
        overlay.destroy(&mut gfx);
    }
}
