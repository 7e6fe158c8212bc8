//! The GPU backend seam.
//!
//! Every wrapper in this crate talks to the GPU through the [`Gpu`] trait and keeps an
//! `Arc` of the context it was created on, so calls can never leak into whichever context
//! happens to be current. The trait is implemented for [`glow::Context`] in [`native`] and
//! for the in-memory [`HeadlessGpu`] used by tests and tooling.

use std::fmt::Debug;

pub mod headless;
pub mod native;

pub use headless::HeadlessGpu;

/// The two programmable stages a shader program is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Lowercase name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Binding points for buffer objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Triangle indices.
    ElementArray,
}

/// Component types a vertex attribute may be made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttribType {
    Float,
    UnsignedInt,
    UnsignedByte,
}

impl AttribType {
    /// Size in bytes of a single component.
    pub fn size(self) -> usize {
        match self {
            AttribType::Float => std::mem::size_of::<f32>(),
            AttribType::UnsignedInt => std::mem::size_of::<u32>(),
            AttribType::UnsignedByte => std::mem::size_of::<u8>(),
        }
    }
}

/// Primitive assembly mode of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    TriangleStrip,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    /// Samples outside the texture return the given RGBA color.
    ClampToBorder([f32; 4]),
}

/// Fixed-function state the core toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Alpha blending with `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`.
    Blend,
    /// Depth testing with `LEQUAL`, so coplanar draws land in submission order.
    DepthTest,
}

/// The subset of OpenGL the sandbox needs.
///
/// Method names follow [`glow::HasContext`]. Unlike glow, the methods are safe: the
/// implementations own the `unsafe` boundary and handles are only ever produced by the
/// same context they are passed back to.
pub trait Gpu {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type Buffer: Copy + Debug;
    type VertexArray: Copy + Debug;
    type Texture: Copy + Debug;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn get_program_link_status(&self, program: Self::Program) -> bool;
    fn validate_program(&self, program: Self::Program);
    fn get_program_validate_status(&self, program: Self::Program) -> bool;
    fn get_program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32);
    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32);
    fn uniform_4_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32, z: f32, w: f32);
    fn uniform_matrix_4_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32; 16]);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// Uploads `data` to the buffer bound at `target` with static-draw usage.
    fn buffer_data_u8_slice(&self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: AttribType,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: Option<Self::Texture>);
    /// Uploads tightly packed RGBA8 pixels to the bound 2-D texture.
    fn tex_image_2d_rgba8(&self, width: u32, height: u32, pixels: &[u8]);
    /// Sets linear filtering and the given wrap mode on the bound 2-D texture.
    fn tex_sampling(&self, wrap: TextureWrap);
    fn delete_texture(&self, texture: Self::Texture);

    fn draw_elements(&self, topology: Topology, count: i32);
    fn draw_arrays(&self, topology: Topology, first: i32, count: i32);

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, color: bool, depth: bool);
    fn enable(&self, capability: Capability);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    /// Pops the oldest pending error code, `None` once the queue is empty.
    fn get_error(&self) -> Option<u32>;
}
