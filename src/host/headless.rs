//! Headless graphics backend that records every command instead of drawing.
//!
//! Used by the runner binary when no compositing host is attached, and by the
//! tests to inspect exactly what a frame submitted.

use std::cell::{Cell, RefCell};
use tracing::{debug, error};

use super::{Graphics, GraphicsContext, GraphicsError};
use crate::geometry::VertexData;
use crate::render::{DrawMode, Rgba};

#[derive(Clone, Debug, PartialEq)]
pub enum GraphicsCommand {
    Enter,
    Leave,
    CreateBuffer { id: u32 },
    DestroyBuffer { id: u32 },
    ReplaceData { id: u32 },
    Flush { id: u32 },
    LoadBuffer { id: u32 },
    BeginSolid,
    SetColor(Rgba),
    Draw { mode: DrawMode, start: u32, count: u32 },
    EndSolid,
}

/// Vertex buffer owned by [`RecordingGraphics`].
#[derive(Debug)]
pub struct RecordedBuffer {
    id: u32,
    data: VertexData,
    dirty: bool,
}

impl RecordedBuffer {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn data(&self) -> &VertexData {
        &self.data
    }

    /// True when data was replaced but not flushed yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[derive(Debug, Default)]
pub struct RecordingGraphics {
    commands: RefCell<Vec<GraphicsCommand>>,
    depth: Cell<u32>,
    next_id: u32,
    live_buffers: u32,
    unlocked_resource_ops: u32,
    fail_next_create: bool,
    last_uploaded: Option<VertexData>,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `create_vertex_buffer` call fail.
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    pub fn commands(&self) -> Vec<GraphicsCommand> {
        self.commands.borrow().clone()
    }

    /// Returns and forgets the recorded commands.
    pub fn take_commands(&mut self) -> Vec<GraphicsCommand> {
        std::mem::take(self.commands.get_mut())
    }

    pub fn draw_calls(&self) -> Vec<(DrawMode, u32, u32, Rgba)> {
        let mut color = Rgba::TRANSPARENT;
        let mut draws = Vec::new();
        for command in self.commands.borrow().iter() {
            match command {
                GraphicsCommand::SetColor(c) => color = *c,
                GraphicsCommand::Draw { mode, start, count } => {
                    draws.push((*mode, *start, *count, color))
                }
                _ => {}
            }
        }
        draws
    }

    pub fn live_buffers(&self) -> u32 {
        self.live_buffers
    }

    pub fn is_entered(&self) -> bool {
        self.depth.get() > 0
    }

    /// Buffer creations or destructions that happened outside the context.
    pub fn unlocked_resource_ops(&self) -> u32 {
        self.unlocked_resource_ops
    }

    /// Vertex data of the most recent flush.
    pub fn last_uploaded(&self) -> Option<&VertexData> {
        self.last_uploaded.as_ref()
    }

    fn record(&self, command: GraphicsCommand) {
        self.commands.borrow_mut().push(command);
    }

    fn check_locked(&mut self, what: &str) {
        if self.depth.get() == 0 {
            error!("{} outside of the graphics context", what);
            self.unlocked_resource_ops += 1;
        }
    }
}

impl GraphicsContext for RecordingGraphics {
    fn enter(&self) {
        self.depth.set(self.depth.get() + 1);
        self.record(GraphicsCommand::Enter);
    }

    fn leave(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
        self.record(GraphicsCommand::Leave);
    }
}

impl Graphics for RecordingGraphics {
    type Buffer = RecordedBuffer;

    fn create_vertex_buffer(&mut self, data: &VertexData) -> Result<RecordedBuffer, GraphicsError> {
        self.check_locked("Vertex buffer creation");
        if std::mem::take(&mut self.fail_next_create) {
            return Err(GraphicsError::ResourceCreationFailed(
                "injected failure".to_owned(),
            ));
        }

        self.next_id += 1;
        self.live_buffers += 1;
        let id = self.next_id;
        debug!("Created recorded vertex buffer {}", id);
        self.record(GraphicsCommand::CreateBuffer { id });
        Ok(RecordedBuffer {
            id,
            data: data.clone(),
            dirty: false,
        })
    }

    fn destroy_vertex_buffer(&mut self, buffer: RecordedBuffer) {
        self.check_locked("Vertex buffer destruction");
        self.live_buffers = self.live_buffers.saturating_sub(1);
        debug!("Destroyed recorded vertex buffer {}", buffer.id);
        self.record(GraphicsCommand::DestroyBuffer { id: buffer.id });
    }

    fn replace_vertex_data(&mut self, buffer: &mut RecordedBuffer, data: &VertexData) {
        buffer.data = data.clone();
        buffer.dirty = true;
        self.record(GraphicsCommand::ReplaceData { id: buffer.id });
    }

    fn flush(&mut self, buffer: &mut RecordedBuffer) {
        buffer.dirty = false;
        self.last_uploaded = Some(buffer.data.clone());
        self.record(GraphicsCommand::Flush { id: buffer.id });
    }

    fn load_vertex_buffer(&mut self, buffer: &RecordedBuffer) {
        self.record(GraphicsCommand::LoadBuffer { id: buffer.id });
    }

    fn begin_solid(&mut self) {
        self.record(GraphicsCommand::BeginSolid);
    }

    fn set_color(&mut self, color: Rgba) {
        self.record(GraphicsCommand::SetColor(color));
    }

    fn draw(&mut self, mode: DrawMode, start: u32, count: u32) {
        self.record(GraphicsCommand::Draw { mode, start, count });
    }

    fn end_solid(&mut self) {
        self.record(GraphicsCommand::EndSolid);
    }
}
