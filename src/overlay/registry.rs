//! Source descriptors and the registry the host plugin populates at startup.

use bitflags::bitflags;
use std::fmt;
use tracing::info;

use super::{OverlaySource, RenderingContext};
use crate::controller::ControllerSubsystem;
use crate::host::{Graphics, SettingsStore};
use crate::settings::{self, PropertySpec};

pub const SOURCE_ID: &str = "precision_gamepad_source";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Input,
}

bitflags! {
    /// Capabilities a source declares to the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputFlags: u32 {
        const VIDEO       = 1 << 0;
        const AUDIO       = 1 << 1;
        const CUSTOM_DRAW = 1 << 3;
    }
}

/// Builds one source instance from its settings, a controller and the host graphics.
pub type CreateFn<G> =
    fn(&dyn SettingsStore, Box<dyn ControllerSubsystem>, &mut G) -> Box<dyn OverlaySource<G>>;

/// Static description of a source type.
///
/// `create` hands out instances; everything else an instance does goes through
/// [`OverlaySource`].
pub struct SourceInfo<G: Graphics> {
    pub id: &'static str,
    pub display_name: &'static str,
    pub kind: SourceKind,
    pub output_flags: OutputFlags,
    pub create: CreateFn<G>,
    pub properties: fn() -> Vec<PropertySpec>,
    pub defaults: fn(&mut dyn SettingsStore),
}

impl<G: Graphics> fmt::Debug for SourceInfo<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceInfo")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("kind", &self.kind)
            .field("output_flags", &self.output_flags)
            .finish_non_exhaustive()
    }
}

fn create_overlay<G: Graphics + 'static>(
    settings: &dyn SettingsStore,
    controller: Box<dyn ControllerSubsystem>,
    graphics: &mut G,
) -> Box<dyn OverlaySource<G>> {
    Box::new(RenderingContext::create(settings, controller, graphics))
}

/// Descriptor of the throttle/brake/steering overlay.
pub fn precision_gamepad_source<G: Graphics + 'static>() -> SourceInfo<G> {
    SourceInfo {
        id: SOURCE_ID,
        display_name: "Precision Gamepad",
        kind: SourceKind::Input,
        output_flags: OutputFlags::VIDEO | OutputFlags::CUSTOM_DRAW,
        create: create_overlay::<G>,
        properties: settings::properties,
        defaults: settings::register_defaults,
    }
}

/// Opaque handle returned by [`SourceRegistry::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceHandle(usize);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Source {0} is already registered")]
    DuplicateSource(String),
}

/// Source types known to one graphics backend.
pub struct SourceRegistry<G: Graphics> {
    sources: Vec<SourceInfo<G>>,
}

impl<G: Graphics> Default for SourceRegistry<G> {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
        }
    }
}

impl<G: Graphics> fmt::Debug for SourceRegistry<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.sources.iter()).finish()
    }
}

impl<G: Graphics> SourceRegistry<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: SourceInfo<G>) -> Result<SourceHandle, RegistryError> {
        if self.find(info.id).is_some() {
            return Err(RegistryError::DuplicateSource(info.id.to_owned()));
        }

        info!("Registered source {} ({})", info.id, info.display_name);
        self.sources.push(info);
        Ok(SourceHandle(self.sources.len() - 1))
    }

    pub fn get(&self, handle: SourceHandle) -> Option<&SourceInfo<G>> {
        self.sources.get(handle.0)
    }

    pub fn find(&self, id: &str) -> Option<SourceHandle> {
        self.sources
            .iter()
            .position(|info| info.id == id)
            .map(SourceHandle)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{RawGamepadState, SamplerError};
    use crate::host::{MemorySettings, RecordingGraphics};
    use crate::settings::LayoutConfig;

    struct Unplugged;

    impl ControllerSubsystem for Unplugged {
        fn get_state(&mut self, index: u32) -> Result<RawGamepadState, SamplerError> {
            Err(SamplerError::unavailable(index, "unplugged"))
        }
    }

    #[test]
    fn descriptor_declares_video_and_custom_draw() {
        let info = precision_gamepad_source::<RecordingGraphics>();
        assert_eq!(info.id, SOURCE_ID);
        assert_eq!(info.kind, SourceKind::Input);
        assert!(info.output_flags.contains(OutputFlags::VIDEO));
        assert!(info.output_flags.contains(OutputFlags::CUSTOM_DRAW));
        assert!(!info.output_flags.contains(OutputFlags::AUDIO));
        assert_eq!(info.output_flags.bits(), 0b1001);
    }

    #[test]
    fn register_returns_lookup_handle() {
        let mut registry = SourceRegistry::<RecordingGraphics>::new();
        let handle = registry.register(precision_gamepad_source()).unwrap();

        assert_eq!(registry.find(SOURCE_ID), Some(handle));
        assert_eq!(registry.get(handle).map(|i| i.id), Some(SOURCE_ID));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = SourceRegistry::<RecordingGraphics>::new();
        registry.register(precision_gamepad_source()).unwrap();

        assert_eq!(
            registry.register(precision_gamepad_source()),
            Err(RegistryError::DuplicateSource(SOURCE_ID.to_owned()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn descriptor_hooks_reach_settings_schema() {
        let info = precision_gamepad_source::<RecordingGraphics>();
        let mut store = MemorySettings::new();
        (info.defaults)(&mut store);

        assert_eq!(LayoutConfig::from_store(&store), LayoutConfig::default());
        assert_eq!((info.properties)().len(), 8);
    }

    #[test]
    fn descriptor_creates_sized_instances() {
        let info = precision_gamepad_source::<RecordingGraphics>();
        let mut store = MemorySettings::new();
        (info.defaults)(&mut store);
        let mut gfx = RecordingGraphics::new();

        let mut source = (info.create)(&store, Box::new(Unplugged), &mut gfx);
        assert_eq!((source.width(), source.height()), (500, 300));
        assert_eq!(gfx.live_buffers(), 1);

        source.destroy(&mut gfx);
        assert_eq!(gfx.live_buffers(), 0);
    }
}
