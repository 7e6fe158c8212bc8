//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing shaders, the
//! [`parse_shader_source`] splitter for single-file sources, and the [`Uniform`] trait for
//! setting uniform variables in shader programs.
//!
//! A single-file source holds both stages, each introduced by a marker line:
//!
//! ```text
//! #shader vertex
//! ...
//! #shader fragment
//! ...
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap;
use glam::{Mat4, Vec4};

use crate::error::{EngineError, Result};
use crate::gpu::{Gpu, ShaderStage};

/// Vertex and fragment sources split out of one annotated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

/// Splits a single-file shader source into its two stages.
///
/// A line starting with `#shader` switches the current section: to the vertex buffer if it
/// mentions `vertex`, to the fragment buffer if it mentions `fragment`, and to nowhere
/// otherwise. Lines before the first marker and lines of unrecognized sections are dropped.
pub fn parse_shader_source(source: &str) -> ShaderSources {
    let mut sources = ShaderSources::default();
    let mut current: Option<ShaderStage> = None;

    for line in source.lines() {
        if line.trim_start().starts_with("#shader") {
            current = if line.contains("vertex") {
                Some(ShaderStage::Vertex)
            } else if line.contains("fragment") {
                Some(ShaderStage::Fragment)
            } else {
                None
            };
            continue;
        }

        let buffer = match current {
            Some(ShaderStage::Vertex) => &mut sources.vertex,
            Some(ShaderStage::Fragment) => &mut sources.fragment,
            None => continue,
        };
        buffer.push_str(line);
        buffer.push('\n');
    }

    sources
}

/// Represents an individual compiled shader stage.
pub struct Shader<G: Gpu> {
    gpu: Arc<G>,
    id: G::Shader,
    stage: ShaderStage,
}

impl<G: Gpu> Shader<G> {
    /// Compiles a new shader from the given source code.
    ///
    /// On failure the stage is deleted and the driver's info log is returned.
    pub fn new(gpu: &Arc<G>, stage: ShaderStage, source: &str) -> Result<Self> {
        let shader = gpu.create_shader(stage).map_err(EngineError::GpuAllocation)?;
        gpu.shader_source(shader, source);
        gpu.compile_shader(shader);

        if !gpu.get_shader_compile_status(shader) {
            let log = gpu.get_shader_info_log(shader);
            gpu.delete_shader(shader);
            log::error!("Failed to compile {} shader:\n{}", stage, log.trim_end());
            return Err(EngineError::ShaderCompile { stage, log });
        }

        Ok(Self {
            gpu: Arc::clone(gpu),
            id: shader,
            stage,
        })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<G: Gpu> Drop for Shader<G> {
    fn drop(&mut self) {
        self.gpu.delete_shader(self.id);
    }
}

/// Represents a value that can be written to a uniform variable.
pub trait Uniform {
    /// Writes the value to `location` of the currently bound program.
    fn set_uniform<G: Gpu>(&self, gpu: &G, location: Option<&G::UniformLocation>);
}

impl Uniform for i32 {
    fn set_uniform<G: Gpu>(&self, gpu: &G, location: Option<&G::UniformLocation>) {
        gpu.uniform_1_i32(location, *self);
    }
}

impl Uniform for bool {
    fn set_uniform<G: Gpu>(&self, gpu: &G, location: Option<&G::UniformLocation>) {
        gpu.uniform_1_i32(location, *self as i32);
    }
}

impl Uniform for f32 {
    fn set_uniform<G: Gpu>(&self, gpu: &G, location: Option<&G::UniformLocation>) {
        gpu.uniform_1_f32(location, *self);
    }
}

impl Uniform for Vec4 {
    fn set_uniform<G: Gpu>(&self, gpu: &G, location: Option<&G::UniformLocation>) {
        gpu.uniform_4_f32(location, self.x, self.y, self.z, self.w);
    }
}

impl Uniform for Mat4 {
    fn set_uniform<G: Gpu>(&self, gpu: &G, location: Option<&G::UniformLocation>) {
        gpu.uniform_matrix_4_f32_slice(location, &self.to_cols_array());
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform<G: Gpu>(&self, gpu: &G, location: Option<&G::UniformLocation>) {
        (*self).set_uniform(gpu, location);
    }
}

/// Represents a linked vertex + fragment program.
///
/// Uniform locations are looked up once per name and memoized, misses included. Setters
/// write to whatever program is bound, so call [`ShaderProgram::bind`] first.
pub struct ShaderProgram<G: Gpu> {
    gpu: Arc<G>,
    id: G::Program,
    uniform_cache: RefCell<FxHashMap<String, Option<G::UniformLocation>>>,
}

impl<G: Gpu> ShaderProgram<G> {
    /// Links a new shader program from the given shaders.
    pub fn new(gpu: &Arc<G>, shaders: &[&Shader<G>]) -> Result<Self> {
        let program = gpu.create_program().map_err(EngineError::GpuAllocation)?;

        for shader in shaders {
            gpu.attach_shader(program, shader.id);
        }

        gpu.link_program(program);

        if !gpu.get_program_link_status(program) {
            let log = gpu.get_program_info_log(program);
            gpu.delete_program(program);
            log::error!("Failed to link shader program:\n{}", log.trim_end());
            return Err(EngineError::ShaderLink(log));
        }

        gpu.validate_program(program);
        if !gpu.get_program_validate_status(program) {
            log::warn!(
                "Shader program failed validation: {}",
                gpu.get_program_info_log(program).trim_end()
            );
        }

        for shader in shaders {
            gpu.detach_shader(program, shader.id);
        }

        Ok(Self {
            gpu: Arc::clone(gpu),
            id: program,
            uniform_cache: RefCell::new(FxHashMap::default()),
        })
    }

    /// Compiles both stages and links them. Fails on the first stage that does not compile.
    pub fn from_sources(gpu: &Arc<G>, sources: &ShaderSources) -> Result<Self> {
        if sources.vertex.trim().is_empty() {
            return Err(EngineError::MissingShaderStage(ShaderStage::Vertex));
        }
        if sources.fragment.trim().is_empty() {
            return Err(EngineError::MissingShaderStage(ShaderStage::Fragment));
        }

        let vertex = Shader::new(gpu, ShaderStage::Vertex, &sources.vertex)?;
        let fragment = Shader::new(gpu, ShaderStage::Fragment, &sources.fragment)?;
        Self::new(gpu, &[&vertex, &fragment])
    }

    /// Builds a program from an annotated single-file source.
    pub fn from_source(gpu: &Arc<G>, source: &str) -> Result<Self> {
        Self::from_sources(gpu, &parse_shader_source(source))
    }

    /// Reads and builds a program from an annotated single-file source on disk.
    pub fn from_file(gpu: &Arc<G>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::ShaderRead {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Building shader program from {}", path.display());
        Self::from_source(gpu, &source)
    }

    /// Binds the shader program for use.
    pub fn bind(&self) {
        self.gpu.use_program(Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.use_program(None);
    }

    pub fn id(&self) -> G::Program {
        self.id
    }

    /// Looks up the location of `name`, asking the driver only the first time.
    pub fn uniform_location(&self, name: &str) -> Option<G::UniformLocation> {
        if let Some(location) = self.uniform_cache.borrow().get(name) {
            return location.clone();
        }

        let location = self.gpu.get_uniform_location(self.id, name);
        if location.is_none() {
            log::warn!("Uniform '{}' doesn't exist", name);
        }
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_string(), location.clone());
        location
    }

    /// Sets a uniform variable in the shader program.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        let location = self.uniform_location(name);
        value.set_uniform(&*self.gpu, location.as_ref());
    }

    /// Sets an integer uniform, typically a sampler's texture unit.
    pub fn set_uniform_1i(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_uniform_1f(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    pub fn set_uniform_4f(&self, name: &str, v0: f32, v1: f32, v2: f32, v3: f32) {
        self.set_uniform(name, Vec4::new(v0, v1, v2, v3));
    }

    pub fn set_uniform_mat4(&self, name: &str, matrix: &Mat4) {
        self.set_uniform(name, matrix);
    }
}

impl<G: Gpu> Drop for ShaderProgram<G> {
    fn drop(&mut self) {
        self.gpu.delete_program(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessGpu;
    use crate::gpu::headless::UniformValue;

    const VERTEX_BODY: &str = "#version 330 core
layout(location = 0) in vec4 position;
uniform mat4 u_MVP;
void main() { gl_Position = u_MVP * position; }";

    const FRAGMENT_BODY: &str = "#version 330 core
out vec4 color;
uniform vec4 u_Color;
uniform sampler2D u_Texture;
void main() { color = u_Color; }";

    fn annotated(first: (&str, &str), second: (&str, &str)) -> String {
        format!(
            "#shader {}\n{}\n#shader {}\n{}\n",
            first.0, first.1, second.0, second.1
        )
    }

    #[test]
    fn parse_splits_sections() {
        let source = annotated(("vertex", VERTEX_BODY), ("fragment", FRAGMENT_BODY));
        let sources = parse_shader_source(&source);
        assert!(sources.vertex.contains("u_MVP"));
        assert!(!sources.vertex.contains("u_Color"));
        assert!(sources.fragment.contains("u_Color"));
        assert!(!sources.fragment.contains("#shader"));
    }

    #[test]
    fn parse_drops_unknown_sections_and_preamble() {
        let source = "// header\n#shader geometry\nvoid geo() {}\n#shader vertex\nvoid main() {}\n";
        let sources = parse_shader_source(source);
        assert_eq!(sources.vertex, "void main() {}\n");
        assert!(sources.fragment.is_empty());
    }

    #[test]
    fn section_order_does_not_matter() {
        let forward = annotated(("vertex", VERTEX_BODY), ("fragment", FRAGMENT_BODY));
        let reversed = annotated(("fragment", FRAGMENT_BODY), ("vertex", VERTEX_BODY));
        assert_eq!(parse_shader_source(&forward), parse_shader_source(&reversed));

        for source in [forward, reversed] {
            let gpu = Arc::new(HeadlessGpu::new());
            let program = ShaderProgram::from_source(&gpu, &source).unwrap();
            program.bind();
            program.set_uniform_4f("u_Color", 1.0, 0.0, 0.0, 1.0);
            program.set_uniform_1i("u_Texture", 0);
            assert_eq!(
                gpu.uniform(program.id(), "u_Color"),
                Some(UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]))
            );
            assert_eq!(gpu.uniform(program.id(), "u_Texture"), Some(UniformValue::Int(0)));
        }
    }

    #[test]
    fn compile_error_fails_whole_build() {
        let gpu = Arc::new(HeadlessGpu::new());
        let broken = format!("{}\n#error nope", FRAGMENT_BODY);
        let source = annotated(("vertex", VERTEX_BODY), ("fragment", &broken));

        match ShaderProgram::from_source(&gpu, &source) {
            Err(EngineError::ShaderCompile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("#error"));
            }
            other => panic!("expected a compile error, got {:?}", other.err()),
        }

        let live = gpu.live_objects();
        assert_eq!(live.shaders, 0);
        assert_eq!(live.programs, 0);
    }

    #[test]
    fn missing_stage_is_reported() {
        let gpu = Arc::new(HeadlessGpu::new());
        let source = format!("#shader vertex\n{}\n", VERTEX_BODY);
        assert!(matches!(
            ShaderProgram::from_source(&gpu, &source),
            Err(EngineError::MissingShaderStage(ShaderStage::Fragment))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let gpu = Arc::new(HeadlessGpu::new());
        let result = ShaderProgram::from_file(&gpu, "does/not/exist.shader");
        assert!(matches!(result, Err(EngineError::ShaderRead { .. })));
    }

    #[test]
    fn uniform_lookups_are_memoized() {
        let gpu = Arc::new(HeadlessGpu::new());
        let source = annotated(("vertex", VERTEX_BODY), ("fragment", FRAGMENT_BODY));
        let program = ShaderProgram::from_source(&gpu, &source).unwrap();
        program.bind();

        let before = gpu.uniform_queries();
        program.set_uniform_mat4("u_MVP", &Mat4::IDENTITY);
        program.set_uniform_mat4("u_MVP", &Mat4::IDENTITY);
        program.set_uniform_1f("u_Opacity", 0.5);
        program.set_uniform_1f("u_Opacity", 0.25);
        assert_eq!(gpu.uniform_queries() - before, 2);
        assert_eq!(
            gpu.uniform(program.id(), "u_MVP"),
            Some(UniformValue::Mat4(Mat4::IDENTITY.to_cols_array()))
        );
    }

    #[test]
    fn dropping_program_releases_it() {
        let gpu = Arc::new(HeadlessGpu::new());
        let source = annotated(("vertex", VERTEX_BODY), ("fragment", FRAGMENT_BODY));
        let program = ShaderProgram::from_source(&gpu, &source).unwrap();
        assert_eq!(gpu.live_objects().programs, 1);
        assert_eq!(gpu.live_objects().shaders, 0);
        drop(program);
        assert_eq!(gpu.live_objects().programs, 0);
    }
}
