//! Thin owners of GPU objects: shaders, buffers, vertex arrays and textures, plus the
//! renderers that draw with them. Each wrapper releases its object on drop.

pub mod background;
pub mod buffer;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod vertex_array;

pub use background::*;
pub use buffer::*;
pub use renderer::*;
pub use shader::*;
pub use texture::*;
pub use vertex_array::*;
