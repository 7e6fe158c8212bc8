//! Vertex and index buffers, and the layout describing an interleaved vertex format.
//!
//! Vertex types implement the [`Vertex`] trait to describe their own layout.

use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::gpu::{AttribType, BufferTarget, Gpu};

mod sealed {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for u32 {}
    impl Sealed for u8 {}
}

/// Component types a [`VertexBufferLayout`] accepts. Implemented for `f32`, `u32` and `u8`
/// only; pushing any other type does not compile.
pub trait LayoutComponent: sealed::Sealed {
    const TYPE: AttribType;
    const NORMALIZED: bool;
}

impl LayoutComponent for f32 {
    const TYPE: AttribType = AttribType::Float;
    const NORMALIZED: bool = false;
}

impl LayoutComponent for u32 {
    const TYPE: AttribType = AttribType::UnsignedInt;
    const NORMALIZED: bool = false;
}

impl LayoutComponent for u8 {
    const TYPE: AttribType = AttribType::UnsignedByte;
    const NORMALIZED: bool = true;
}

/// One attribute of an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferElement {
    pub data_type: AttribType,
    pub count: u32,
    pub normalized: bool,
}

impl VertexBufferElement {
    /// Size of the whole attribute in bytes.
    pub fn size(&self) -> u32 {
        self.count * self.data_type.size() as u32
    }
}

/// Ordered attribute descriptors of one vertex format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexBufferLayout {
    elements: Vec<VertexBufferElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute of `count` components of type `T`.
    pub fn push<T: LayoutComponent>(&mut self, count: u32) -> &mut Self {
        let element = VertexBufferElement {
            data_type: T::TYPE,
            count,
            normalized: T::NORMALIZED,
        };
        self.stride += element.size();
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[VertexBufferElement] {
        &self.elements
    }

    /// Distance in bytes between two consecutive vertices.
    pub fn stride(&self) -> u32 {
        self.stride
    }
}

/// Trait implemented by vertex types that can be uploaded to a [`VertexBuffer`].
///
/// The `Pod` bound guarantees a padding-free `#[repr(C)]` type; [`Vertex::layout`] must
/// describe the same fields in the same order. Types with padding are rejected:
///
/// ```compile_fail
/// use glsandbox_core::abs::{Vertex, VertexBufferLayout};
///
/// #[derive(Clone, Copy)]
/// #[repr(C)]
/// struct Padded {
///     flag: u8,
///     weight: f32,
/// }
///
/// impl Vertex for Padded {
///     fn layout() -> VertexBufferLayout {
///         let mut layout = VertexBufferLayout::new();
///         layout.push::<u8>(4).push::<f32>(1);
///         layout
///     }
/// }
/// ```
pub trait Vertex: bytemuck::Pod {
    fn layout() -> VertexBufferLayout;
}

/// Vertex data uploaded once with static-draw usage.
pub struct VertexBuffer<G: Gpu> {
    gpu: Arc<G>,
    id: G::Buffer,
    size: usize,
    layout: VertexBufferLayout,
}

impl<G: Gpu> VertexBuffer<G> {
    /// Uploads `vertices` into a new buffer.
    pub fn new<V: Vertex>(gpu: &Arc<G>, vertices: &[V]) -> Result<Self> {
        let layout = V::layout();
        debug_assert_eq!(layout.stride() as usize, std::mem::size_of::<V>());
        Self::from_bytes(gpu, bytemuck::cast_slice(vertices), layout)
    }

    /// Uploads raw interleaved bytes described by `layout`.
    pub fn from_bytes(gpu: &Arc<G>, data: &[u8], layout: VertexBufferLayout) -> Result<Self> {
        let id = gpu.create_buffer().map_err(EngineError::GpuAllocation)?;
        gpu.bind_buffer(BufferTarget::Array, Some(id));
        gpu.buffer_data_u8_slice(BufferTarget::Array, data);
        gpu.bind_buffer(BufferTarget::Array, None);

        Ok(Self {
            gpu: Arc::clone(gpu),
            id,
            size: data.len(),
            layout,
        })
    }

    pub fn bind(&self) {
        self.gpu.bind_buffer(BufferTarget::Array, Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_buffer(BufferTarget::Array, None);
    }

    pub fn id(&self) -> G::Buffer {
        self.id
    }

    /// Size of the uploaded data in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Layout of the vertices stored in this buffer.
    pub fn layout(&self) -> &VertexBufferLayout {
        &self.layout
    }
}

impl<G: Gpu> Drop for VertexBuffer<G> {
    fn drop(&mut self) {
        self.gpu.delete_buffer(self.id);
    }
}

/// A list of `u32` triangle indices.
pub struct IndexBuffer<G: Gpu> {
    gpu: Arc<G>,
    id: G::Buffer,
    count: usize,
}

impl<G: Gpu> IndexBuffer<G> {
    /// Uploads `indices` into a new buffer.
    pub fn new(gpu: &Arc<G>, indices: &[u32]) -> Result<Self> {
        let id = gpu.create_buffer().map_err(EngineError::GpuAllocation)?;
        // The element binding is vertex array state; unbind so no existing array picks it up.
        gpu.bind_vertex_array(None);
        gpu.bind_buffer(BufferTarget::ElementArray, Some(id));
        gpu.buffer_data_u8_slice(BufferTarget::ElementArray, bytemuck::cast_slice(indices));
        gpu.bind_buffer(BufferTarget::ElementArray, None);

        Ok(Self {
            gpu: Arc::clone(gpu),
            id,
            count: indices.len(),
        })
    }

    pub fn bind(&self) {
        self.gpu.bind_buffer(BufferTarget::ElementArray, Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_buffer(BufferTarget::ElementArray, None);
    }

    pub fn id(&self) -> G::Buffer {
        self.id
    }

    /// Number of indices, which is also the element count of a draw call.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<G: Gpu> Drop for IndexBuffer<G> {
    fn drop(&mut self) {
        self.gpu.delete_buffer(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessGpu;

    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct ColoredVertex {
        position: [f32; 3],
        color: [u8; 4],
        material: u32,
    }

    impl Vertex for ColoredVertex {
        fn layout() -> VertexBufferLayout {
            let mut layout = VertexBufferLayout::new();
            layout.push::<f32>(3).push::<u8>(4).push::<u32>(1);
            layout
        }
    }

    #[test]
    fn stride_is_sum_of_elements() {
        let layout = ColoredVertex::layout();
        assert_eq!(layout.stride(), 12 + 4 + 4);
        assert_eq!(layout.stride() as usize, std::mem::size_of::<ColoredVertex>());
        assert_eq!(
            layout.elements()[1],
            VertexBufferElement {
                data_type: AttribType::UnsignedByte,
                count: 4,
                normalized: true,
            }
        );
        assert!(!layout.elements()[2].normalized);
    }

    #[test]
    fn vertex_buffer_uploads_bytes() {
        let gpu = Arc::new(HeadlessGpu::new());
        let vertices = [
            ColoredVertex {
                position: [0.0, 1.0, 2.0],
                color: [255, 0, 0, 255],
                material: 7,
            };
            3
        ];
        let buffer = VertexBuffer::new(&gpu, &vertices).unwrap();
        assert_eq!(buffer.size(), 3 * 20);
        let uploaded = gpu.buffer_data(buffer.id()).unwrap();
        assert_eq!(uploaded.len(), 60);
        assert_eq!(&uploaded[..12], bytemuck::cast_slice::<f32, u8>(&[0.0, 1.0, 2.0]));
        assert_eq!(&uploaded[12..16], &[255, 0, 0, 255]);
        assert_eq!(&uploaded[16..20], &7u32.to_ne_bytes());
        drop(buffer);
        assert_eq!(gpu.live_objects().buffers, 0);
    }

    #[test]
    fn index_buffer_tracks_count() {
        let gpu = Arc::new(HeadlessGpu::new());
        let buffer = IndexBuffer::new(&gpu, &[0, 1, 2, 2, 3, 0]).unwrap();
        assert_eq!(buffer.count(), 6);
        let bytes = gpu.buffer_data(buffer.id()).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[8..12], &2u32.to_ne_bytes());
    }
}
