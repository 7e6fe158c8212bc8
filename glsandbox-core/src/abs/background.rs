//! Full-screen background pass.

use std::sync::Arc;

use crate::abs::{ShaderProgram, Vertex, VertexArray, VertexBuffer, VertexBufferLayout, check_errors};
use crate::error::Result;
use crate::gpu::{Gpu, Topology};

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct ScreenVertex {
    position: [f32; 2],
}

impl Vertex for ScreenVertex {
    fn layout() -> VertexBufferLayout {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2);
        layout
    }
}

/// Corners of clip space in triangle-strip order.
const SCREEN_STRIP: [ScreenVertex; 4] = [
    ScreenVertex { position: [-1.0, -1.0] },
    ScreenVertex { position: [1.0, -1.0] },
    ScreenVertex { position: [-1.0, 1.0] },
    ScreenVertex { position: [1.0, 1.0] },
];

/// Draws a quad covering the whole viewport with its own shader, scaled by `u_Brightness`.
pub struct BackgroundRenderer<G: Gpu> {
    gpu: Arc<G>,
    vertex_array: VertexArray<G>,
    _vertex_buffer: VertexBuffer<G>,
    shader: ShaderProgram<G>,
}

impl<G: Gpu> BackgroundRenderer<G> {
    pub fn new(gpu: &Arc<G>, shader: ShaderProgram<G>) -> Result<Self> {
        let vertex_buffer = VertexBuffer::new(gpu, &SCREEN_STRIP)?;
        let mut vertex_array = VertexArray::new(gpu)?;
        vertex_array.add_buffer(&vertex_buffer, &ScreenVertex::layout());

        Ok(Self {
            gpu: Arc::clone(gpu),
            vertex_array,
            _vertex_buffer: vertex_buffer,
            shader,
        })
    }

    pub fn draw(&self, brightness: f32) -> Result<()> {
        self.shader.bind();
        self.shader.set_uniform_1f("u_Brightness", brightness);
        self.vertex_array.bind();
        self.gpu.draw_arrays(Topology::TriangleStrip, 0, SCREEN_STRIP.len() as i32);
        check_errors(&*self.gpu, "draw_arrays")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessGpu;
    use crate::gpu::headless::UniformValue;

    #[test]
    fn draws_four_vertex_strip() {
        let gpu = Arc::new(HeadlessGpu::new());
        let shader = ShaderProgram::from_source(
            &gpu,
            "#shader vertex\nvoid main() {}\n#shader fragment\nuniform float u_Brightness;\nvoid main() {}\n",
        )
        .unwrap();
        let background = BackgroundRenderer::new(&gpu, shader).unwrap();
        background.draw(0.5).unwrap();

        let draws = gpu.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].topology, Topology::TriangleStrip);
        assert!(!draws[0].indexed);
        assert_eq!(draws[0].count, 4);
        assert_eq!(draws[0].uniforms["u_Brightness"], UniformValue::Float(0.5));
    }
}
