//! Draw-call and clear facade.

use std::sync::Arc;

use glam::Vec4;

use crate::abs::{IndexBuffer, ShaderProgram, VertexArray};
use crate::error::{EngineError, Result};
use crate::gpu::{Gpu, Topology};

/// Drains the error queue of `gpu`, logging every entry.
///
/// Fails with the first pending code, so a broken context stops the frame instead of
/// silently drawing nothing.
pub fn check_errors<G: Gpu>(gpu: &G, call: &'static str) -> Result<()> {
    let mut first = None;
    while let Some(code) = gpu.get_error() {
        log::error!("[OpenGL error] 0x{:04X} after {}", code, call);
        first.get_or_insert(code);
    }
    match first {
        Some(code) => Err(EngineError::Gpu { call, code }),
        None => Ok(()),
    }
}

/// Issues indexed draw calls and clears the framebuffer of one context.
///
/// Holds no state besides the context and whether depth is cleared along with color.
pub struct Renderer<G: Gpu> {
    gpu: Arc<G>,
    clear_depth: bool,
}

impl<G: Gpu> Renderer<G> {
    pub fn new(gpu: &Arc<G>, clear_depth: bool) -> Self {
        Self {
            gpu: Arc::clone(gpu),
            clear_depth,
        }
    }

    /// Binds all three and draws `index_buffer.count()` indices as triangles.
    pub fn draw(
        &self,
        vertex_array: &VertexArray<G>,
        index_buffer: &IndexBuffer<G>,
        shader: &ShaderProgram<G>,
    ) -> Result<()> {
        shader.bind();
        vertex_array.bind();
        index_buffer.bind();
        self.gpu
            .draw_elements(Topology::Triangles, index_buffer.count() as i32);
        check_errors(&*self.gpu, "draw_elements")
    }

    /// Sets the clear color if one is given, then clears color (and depth, if enabled).
    pub fn clear(&self, color: Option<Vec4>) {
        if let Some(color) = color {
            self.gpu.clear_color(color.x, color.y, color.z, color.w);
        }
        self.gpu.clear(true, self.clear_depth);
    }
}
