//! Vertex array objects.

use std::sync::Arc;

use crate::abs::{VertexBuffer, VertexBufferLayout};
use crate::error::{EngineError, Result};
use crate::gpu::Gpu;

/// Binds one vertex buffer's layout to attribute slots.
pub struct VertexArray<G: Gpu> {
    gpu: Arc<G>,
    id: G::VertexArray,
    vertex_buffer: Option<G::Buffer>,
}

impl<G: Gpu> VertexArray<G> {
    pub fn new(gpu: &Arc<G>) -> Result<Self> {
        let id = gpu.create_vertex_array().map_err(EngineError::GpuAllocation)?;
        Ok(Self {
            gpu: Arc::clone(gpu),
            id,
            vertex_buffer: None,
        })
    }

    /// Points attribute slots `0..n` at the elements of `layout`, in order, reading from
    /// `buffer`. A vertex array holds a single buffer; adding another replaces it.
    pub fn add_buffer(&mut self, buffer: &VertexBuffer<G>, layout: &VertexBufferLayout) {
        if self.vertex_buffer.is_some() {
            log::debug!("Replacing vertex buffer of vertex array {:?}", self.id);
        }

        self.bind();
        buffer.bind();

        let stride = layout.stride() as i32;
        let mut offset = 0;
        for (index, element) in layout.elements().iter().enumerate() {
            let index = index as u32;
            self.gpu.enable_vertex_attrib_array(index);
            self.gpu.vertex_attrib_pointer(
                index,
                element.count as i32,
                element.data_type,
                element.normalized,
                stride,
                offset as i32,
            );
            offset += element.size();
        }

        self.unbind();
        buffer.unbind();
        self.vertex_buffer = Some(buffer.id());
    }

    pub fn bind(&self) {
        self.gpu.bind_vertex_array(Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_vertex_array(None);
    }

    pub fn id(&self) -> G::VertexArray {
        self.id
    }

    /// The buffer currently feeding this vertex array.
    pub fn vertex_buffer(&self) -> Option<G::Buffer> {
        self.vertex_buffer
    }
}

impl<G: Gpu> Drop for VertexArray<G> {
    fn drop(&mut self) {
        self.gpu.delete_vertex_array(self.id);
    }
}
