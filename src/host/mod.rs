//! # Host Capabilities
//!
//! The compositing host owns the GPU, the settings of each overlay instance and
//! the frame scheduler. This module describes what the overlay needs from it as
//! traits, so the core never touches a concrete graphics API.
//!
//! ## Graphics
//! Vertex buffers are host graphics resources and may only be created or
//! destroyed while the host graphics context is entered. [`GraphicsLock`] holds
//! the context for the lifetime of a scope and leaves it on drop.
//!
//! ## Settings
//! [`SettingsStore`] is a flat key/value store with typed getters and registered
//! defaults. [`MemorySettings`] is the in-process implementation used by the
//! runner binary and the tests.

pub mod headless;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use crate::geometry::VertexData;
use crate::render::{DrawMode, Rgba};

pub use headless::{GraphicsCommand, RecordingGraphics};

/// Errors reported by a graphics backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    #[error("Failed to create vertex buffer: {0}")]
    ResourceCreationFailed(String),
}

/// Enter/leave bracket around host graphics work.
pub trait GraphicsContext {
    fn enter(&self);
    fn leave(&self);
}

/// Scoped hold on the host graphics context.
///
/// Derefs to the wrapped context so resources can be created or destroyed
/// while it is held.
#[must_use = "the graphics context is left as soon as the lock is dropped"]
pub struct GraphicsLock<'a, G: GraphicsContext + ?Sized> {
    context: &'a mut G,
}

impl<'a, G: GraphicsContext + ?Sized> GraphicsLock<'a, G> {
    pub fn acquire(context: &'a mut G) -> Self {
        context.enter();
        Self { context }
    }
}

impl<G: GraphicsContext + ?Sized> Deref for GraphicsLock<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.context
    }
}

impl<G: GraphicsContext + ?Sized> DerefMut for GraphicsLock<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.context
    }
}

impl<G: GraphicsContext + ?Sized> Drop for GraphicsLock<'_, G> {
    fn drop(&mut self) {
        self.context.leave();
    }
}

/// Drawing surface offered by the host.
///
/// Mirrors a solid-color effect pipeline: one dynamic vertex buffer, one RGBA
/// parameter, non-indexed strip/list draws.
pub trait Graphics: GraphicsContext {
    type Buffer;

    fn create_vertex_buffer(&mut self, data: &VertexData) -> Result<Self::Buffer, GraphicsError>;
    fn destroy_vertex_buffer(&mut self, buffer: Self::Buffer);

    /// Replaces every vertex and texture coordinate of `buffer`.
    fn replace_vertex_data(&mut self, buffer: &mut Self::Buffer, data: &VertexData);
    fn flush(&mut self, buffer: &mut Self::Buffer);
    fn load_vertex_buffer(&mut self, buffer: &Self::Buffer);

    fn begin_solid(&mut self);
    fn set_color(&mut self, color: Rgba);
    fn draw(&mut self, mode: DrawMode, start: u32, count: u32);
    fn end_solid(&mut self);
}

/// Key/value settings of one overlay instance.
pub trait SettingsStore {
    /// Explicit value, else the registered default, else 0.
    fn get_int(&self, key: &str) -> i64;
    fn set_int(&mut self, key: &str, value: i64);
    fn set_default_int(&mut self, key: &str, value: i64);

    /// Packed RGBA color stored as an integer.
    fn get_color(&self, key: &str) -> u32 {
        self.get_int(key) as u32
    }
}

/// In-memory [`SettingsStore`].
///
/// Only explicit values are serialized; defaults are re-registered at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySettings {
    #[serde(flatten)]
    values: BTreeMap<String, i64>,
    #[serde(skip)]
    defaults: BTreeMap<String, i64>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn has_default(&self, key: &str) -> bool {
        self.defaults.contains_key(key)
    }

    /// Copies every registered default without an explicit value into the
    /// explicit values, so a save writes the full schema.
    pub fn materialize_defaults(&mut self) {
        for (key, value) in &self.defaults {
            self.values.entry(key.clone()).or_insert(*value);
        }
    }
}

impl SettingsStore for MemorySettings {
    fn get_int(&self, key: &str) -> i64 {
        self.values
            .get(key)
            .or_else(|| self.defaults.get(key))
            .copied()
            .unwrap_or(0)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_owned(), value);
    }

    fn set_default_int(&mut self, key: &str, value: i64) {
        self.defaults.insert(key.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Depth {
        current: Cell<i32>,
        max: Cell<i32>,
    }

    impl GraphicsContext for Depth {
        fn enter(&self) {
            self.current.set(self.current.get() + 1);
            self.max.set(self.max.get().max(self.current.get()));
        }
        fn leave(&self) {
            self.current.set(self.current.get() - 1);
        }
    }

    #[test]
    fn lock_leaves_on_drop() {
        let mut ctx = Depth::default();
        {
            let lock = GraphicsLock::acquire(&mut ctx);
            assert_eq!(lock.current.get(), 1);
        }
        assert_eq!(ctx.current.get(), 0);
        assert_eq!(ctx.max.get(), 1);
    }

    #[test]
    fn explicit_value_wins_over_default() {
        let mut store = MemorySettings::new();
        assert_eq!(store.get_int("width"), 0);

        store.set_default_int("width", 500);
        assert_eq!(store.get_int("width"), 500);
        assert!(!store.has_value("width"));

        store.set_int("width", 640);
        assert_eq!(store.get_int("width"), 640);
    }

    #[test]
    fn materialized_defaults_keep_explicit_values() {
        let mut store = MemorySettings::new();
        store.set_default_int("width", 500);
        store.set_default_int("height", 300);
        store.set_int("width", 640);

        store.materialize_defaults();

        assert!(store.has_value("height"));
        assert_eq!(store.get_int("height"), 300);
        assert_eq!(store.get_int("width"), 640);
    }

    #[test]
    fn colors_are_read_as_packed_u32() {
        let mut store = MemorySettings::new();
        store.set_int("steer_color", 0xFF4DBCEC);
        assert_eq!(store.get_color("steer_color"), 0xFF4DBCEC);
    }
}
