//! An in-memory [`Gpu`] that records what it is asked to do.
//!
//! [`HeadlessGpu`] emulates just enough OpenGL semantics for the wrappers to be exercised
//! without a window: object lifetimes, bind points, per-program uniform storage, a
//! framebuffer that remembers the last clear, and a GL-style error queue. Shader
//! "compilation" fails on a `#error` directive or a missing `main`, and uniforms are
//! discovered from `uniform` declarations in the attached sources.

use std::cell::RefCell;
use std::collections::VecDeque;

use fxhash::{FxHashMap, FxHashSet};

use super::{AttribType, BufferTarget, Capability, Gpu, ShaderStage, TextureWrap, Topology};

/// `GL_INVALID_OPERATION`.
pub const INVALID_OPERATION: u32 = 0x0502;
/// `GL_INVALID_VALUE`.
pub const INVALID_VALUE: u32 = 0x0501;

/// Name of an object owned by a [`HeadlessGpu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessHandle(pub u32);

/// Location of a uniform inside one headless program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessUniformLocation(u32);

/// The last value written to a uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

/// One attribute pointer recorded on a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointer {
    pub index: u32,
    pub size: i32,
    pub data_type: AttribType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
    pub enabled: bool,
}

/// A draw call that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub topology: Topology,
    /// `true` for `draw_elements`, `false` for `draw_arrays`.
    pub indexed: bool,
    pub count: i32,
    pub program: HeadlessHandle,
    pub vertex_array: HeadlessHandle,
    pub element_buffer: Option<HeadlessHandle>,
    /// Texture bound to unit 0 at the time of the call.
    pub texture: Option<HeadlessHandle>,
    /// Snapshot of the program's uniforms, by name.
    pub uniforms: FxHashMap<String, UniformValue>,
}

/// What the default framebuffer holds after the last clear.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Framebuffer {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
}

/// Number of live objects of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveObjects {
    pub shaders: usize,
    pub programs: usize,
    pub buffers: usize,
    pub vertex_arrays: usize,
    pub textures: usize,
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    values: FxHashMap<u32, UniformValue>,
}

#[derive(Default)]
struct VertexArrayObject {
    attribs: Vec<AttribPointer>,
    element_buffer: Option<u32>,
}

struct TextureObject {
    width: u32,
    height: u32,
    wrap: Option<TextureWrap>,
}

#[derive(Default)]
struct State {
    next_name: u32,
    shaders: FxHashMap<u32, ShaderObject>,
    programs: FxHashMap<u32, ProgramObject>,
    buffers: FxHashMap<u32, Vec<u8>>,
    vertex_arrays: FxHashMap<u32, VertexArrayObject>,
    textures: FxHashMap<u32, TextureObject>,
    current_program: Option<u32>,
    array_buffer: Option<u32>,
    /// Element binding while no vertex array is bound.
    loose_element_buffer: Option<u32>,
    vertex_array: Option<u32>,
    active_unit: u32,
    texture_units: FxHashMap<u32, u32>,
    clear_color: [f32; 4],
    framebuffer: Framebuffer,
    clears: usize,
    capabilities: FxHashSet<Capability>,
    viewport: [i32; 4],
    uniform_queries: usize,
    draws: Vec<DrawCall>,
    errors: VecDeque<u32>,
}

impl State {
    fn allocate(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    fn fail(&mut self, code: u32) {
        self.errors.push_back(code);
    }

    fn current_program_mut(&mut self) -> Option<&mut ProgramObject> {
        let program = self.current_program?;
        self.programs.get_mut(&program)
    }
}

/// Names declared with `uniform <type> <name>;` in a GLSL source.
fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let line = line.trim();
        let declaration = line.strip_prefix("uniform ")?;
        let declaration = declaration.split(';').next()?;
        let name = declaration.split_whitespace().last()?;
        let name = name.split('[').next()?;
        Some(name.to_string())
    })
}

/// A [`Gpu`] with no device behind it.
#[derive(Default)]
pub struct HeadlessGpu {
    state: RefCell<State>,
}

impl HeadlessGpu {
    /// Creates a headless context with nothing allocated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every draw call that passed validation, oldest first.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    /// Forgets recorded draw calls, keeping all other state.
    pub fn reset_draw_calls(&self) {
        self.state.borrow_mut().draws.clear();
    }

    /// Contents of the framebuffer after the last clear.
    pub fn framebuffer(&self) -> Framebuffer {
        self.state.borrow().framebuffer
    }

    /// How many times `clear` has been called.
    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    /// Counts objects that were created and not yet deleted.
    pub fn live_objects(&self) -> LiveObjects {
        let state = self.state.borrow();
        LiveObjects {
            shaders: state.shaders.len(),
            programs: state.programs.len(),
            buffers: state.buffers.len(),
            vertex_arrays: state.vertex_arrays.len(),
            textures: state.textures.len(),
        }
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    pub fn current_program(&self) -> Option<HeadlessHandle> {
        self.state.borrow().current_program.map(HeadlessHandle)
    }

    /// Last value written to `name` on `program`.
    pub fn uniform(&self, program: HeadlessHandle, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program.0)?;
        let slot = program.uniforms.iter().position(|u| u == name)?;
        program.values.get(&(slot as u32)).copied()
    }

    /// Attribute pointers recorded on `vertex_array`, by slot.
    pub fn attrib_pointers(&self, vertex_array: HeadlessHandle) -> Vec<AttribPointer> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array.0)
            .map(|vao| vao.attribs.clone())
            .unwrap_or_default()
    }

    /// Bytes last uploaded to `buffer`.
    pub fn buffer_data(&self, buffer: HeadlessHandle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer.0).cloned()
    }

    /// Size and wrap mode of `texture`.
    pub fn texture_info(&self, texture: HeadlessHandle) -> Option<(u32, u32, Option<TextureWrap>)> {
        self.state
            .borrow()
            .textures
            .get(&texture.0)
            .map(|t| (t.width, t.height, t.wrap))
    }

    /// How many times a uniform location has been looked up.
    pub fn uniform_queries(&self) -> usize {
        self.state.borrow().uniform_queries
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    fn record_draw(&self, topology: Topology, indexed: bool, count: i32) {
        let mut state = self.state.borrow_mut();
        let Some(program) = state.current_program else {
            state.fail(INVALID_OPERATION);
            return;
        };
        let Some(vertex_array) = state.vertex_array else {
            state.fail(INVALID_OPERATION);
            return;
        };
        if !state.programs.get(&program).is_some_and(|p| p.linked) {
            state.fail(INVALID_OPERATION);
            return;
        }
        let element_buffer = state.vertex_arrays.get(&vertex_array).and_then(|v| v.element_buffer);
        if indexed {
            let available = element_buffer
                .and_then(|b| state.buffers.get(&b))
                .map_or(0, |data| data.len() / std::mem::size_of::<u32>());
            if count < 0 || count as usize > available {
                state.fail(INVALID_OPERATION);
                return;
            }
        }

        let program_object = &state.programs[&program];
        let uniforms = program_object
            .values
            .iter()
            .map(|(slot, value)| (program_object.uniforms[*slot as usize].clone(), *value))
            .collect();
        let texture = state.texture_units.get(&0).copied().map(HeadlessHandle);

        state.draws.push(DrawCall {
            topology,
            indexed,
            count,
            program: HeadlessHandle(program),
            vertex_array: HeadlessHandle(vertex_array),
            element_buffer: element_buffer.map(HeadlessHandle),
            texture,
            uniforms,
        });
    }

    fn set_uniform(&self, location: Option<&HeadlessUniformLocation>, value: UniformValue) {
        let Some(location) = location else {
            return;
        };
        let mut state = self.state.borrow_mut();
        let accepted = match state.current_program_mut() {
            Some(program) if (location.0 as usize) < program.uniforms.len() => {
                program.values.insert(location.0, value);
                true
            }
            _ => false,
        };
        if !accepted {
            state.fail(INVALID_OPERATION);
        }
    }
}

impl Gpu for HeadlessGpu {
    type Shader = HeadlessHandle;
    type Program = HeadlessHandle;
    type Buffer = HeadlessHandle;
    type VertexArray = HeadlessHandle;
    type Texture = HeadlessHandle;
    type UniformLocation = HeadlessUniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        state.shaders.insert(
            name,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(HeadlessHandle(name))
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader.0) {
            object.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.shaders.get_mut(&shader.0) else {
            state.fail(INVALID_VALUE);
            return;
        };
        if let Some(line) = object.source.lines().position(|l| l.trim_start().starts_with("#error")) {
            object.compiled = false;
            object.log = format!("0:{}(1): error: #error directive", line + 1);
        } else if !object.source.contains("void main") {
            object.compiled = false;
            object.log = "0:0(0): error: main function not defined".to_string();
        } else {
            object.compiled = true;
            object.log.clear();
        }
    }

    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader.0)
            .is_some_and(|s| s.compiled)
    }

    fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader.0)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: Self::Shader) {
        self.state.borrow_mut().shaders.remove(&shader.0);
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        state.programs.insert(name, ProgramObject::default());
        Ok(HeadlessHandle(name))
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader.0) {
            state.fail(INVALID_VALUE);
            return;
        }
        match state.programs.get_mut(&program.0) {
            Some(object) => object.attached.push(shader.0),
            None => state.fail(INVALID_VALUE),
        }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program.0) {
            object.attached.retain(|s| *s != shader.0);
        }
    }

    fn link_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.programs.get(&program.0) else {
            state.fail(INVALID_VALUE);
            return;
        };

        let attached: Vec<&ShaderObject> = object
            .attached
            .iter()
            .filter_map(|s| state.shaders.get(s))
            .collect();
        let has_stage = |stage| {
            attached
                .iter()
                .filter(|s| s.stage == stage && s.compiled)
                .count()
                == 1
        };
        let (linked, log) = if attached.iter().any(|s| !s.compiled) {
            (false, "error: linking with uncompiled shader".to_string())
        } else if !has_stage(ShaderStage::Vertex) || !has_stage(ShaderStage::Fragment) {
            (false, "error: program needs one vertex and one fragment shader".to_string())
        } else {
            (true, String::new())
        };

        let mut uniforms: Vec<String> = Vec::new();
        if linked {
            for shader in &attached {
                for name in declared_uniforms(&shader.source) {
                    if !uniforms.contains(&name) {
                        uniforms.push(name);
                    }
                }
            }
        }

        if let Some(object) = state.programs.get_mut(&program.0) {
            object.linked = linked;
            object.log = log;
            object.uniforms = uniforms;
            object.values.clear();
        }
    }

    fn get_program_link_status(&self, program: Self::Program) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .is_some_and(|p| p.linked)
    }

    fn validate_program(&self, _program: Self::Program) {}

    fn get_program_validate_status(&self, program: Self::Program) -> bool {
        self.get_program_link_status(program)
    }

    fn get_program_info_log(&self, program: Self::Program) -> String {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<Self::Program>) {
        let mut state = self.state.borrow_mut();
        match program {
            Some(p) if !state.programs.get(&p.0).is_some_and(|p| p.linked) => {
                state.fail(INVALID_OPERATION)
            }
            _ => state.current_program = program.map(|p| p.0),
        }
    }

    fn delete_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program.0);
        if state.current_program == Some(program.0) {
            state.current_program = None;
        }
    }

    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let mut state = self.state.borrow_mut();
        state.uniform_queries += 1;
        let program = state.programs.get(&program.0)?;
        program
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|slot| HeadlessUniformLocation(slot as u32))
    }

    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32) {
        self.set_uniform(location, UniformValue::Int(x));
    }

    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32) {
        self.set_uniform(location, UniformValue::Float(x));
    }

    fn uniform_4_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32, z: f32, w: f32) {
        self.set_uniform(location, UniformValue::Vec4([x, y, z, w]));
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32; 16]) {
        self.set_uniform(location, UniformValue::Mat4(*v));
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        state.buffers.insert(name, Vec::new());
        Ok(HeadlessHandle(name))
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        let mut state = self.state.borrow_mut();
        let buffer = buffer.map(|b| b.0);
        let vertex_array = state.vertex_array;
        match target {
            BufferTarget::Array => state.array_buffer = buffer,
            BufferTarget::ElementArray => match vertex_array {
                Some(vao) => {
                    if let Some(object) = state.vertex_arrays.get_mut(&vao) {
                        object.element_buffer = buffer;
                    }
                }
                None => state.loose_element_buffer = buffer,
            },
        }
    }

    fn buffer_data_u8_slice(&self, target: BufferTarget, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let bound = match target {
            BufferTarget::Array => state.array_buffer,
            BufferTarget::ElementArray => match state.vertex_array {
                Some(vao) => state.vertex_arrays.get(&vao).and_then(|v| v.element_buffer),
                None => state.loose_element_buffer,
            },
        };
        let stored = match bound {
            Some(buffer) => match state.buffers.get_mut(&buffer) {
                Some(storage) => {
                    *storage = data.to_vec();
                    true
                }
                None => false,
            },
            None => false,
        };
        if !stored {
            state.fail(INVALID_OPERATION);
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer.0);
        if state.array_buffer == Some(buffer.0) {
            state.array_buffer = None;
        }
        if state.loose_element_buffer == Some(buffer.0) {
            state.loose_element_buffer = None;
        }
        for vao in state.vertex_arrays.values_mut() {
            if vao.element_buffer == Some(buffer.0) {
                vao.element_buffer = None;
            }
        }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        state.vertex_arrays.insert(name, VertexArrayObject::default());
        Ok(HeadlessHandle(name))
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        let mut state = self.state.borrow_mut();
        match vertex_array {
            Some(v) if !state.vertex_arrays.contains_key(&v.0) => state.fail(INVALID_OPERATION),
            _ => state.vertex_array = vertex_array.map(|v| v.0),
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let Some(vao) = state.vertex_array else {
            state.fail(INVALID_OPERATION);
            return;
        };
        if let Some(object) = state.vertex_arrays.get_mut(&vao) {
            match object.attribs.iter_mut().find(|a| a.index == index) {
                Some(attrib) => attrib.enabled = true,
                None => object.attribs.push(AttribPointer {
                    index,
                    size: 4,
                    data_type: AttribType::Float,
                    normalized: false,
                    stride: 0,
                    offset: 0,
                    enabled: true,
                }),
            }
            object.attribs.sort_by_key(|a| a.index);
        }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        data_type: AttribType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let mut state = self.state.borrow_mut();
        let (Some(vao), Some(_)) = (state.vertex_array, state.array_buffer) else {
            state.fail(INVALID_OPERATION);
            return;
        };
        if let Some(object) = state.vertex_arrays.get_mut(&vao) {
            let enabled = object
                .attribs
                .iter()
                .find(|a| a.index == index)
                .is_some_and(|a| a.enabled);
            object.attribs.retain(|a| a.index != index);
            object.attribs.push(AttribPointer {
                index,
                size,
                data_type,
                normalized,
                stride,
                offset,
                enabled,
            });
            object.attribs.sort_by_key(|a| a.index);
        }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array.0);
        if state.vertex_array == Some(vertex_array.0) {
            state.vertex_array = None;
        }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate();
        state.textures.insert(
            name,
            TextureObject {
                width: 0,
                height: 0,
                wrap: None,
            },
        );
        Ok(HeadlessHandle(name))
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn bind_texture(&self, texture: Option<Self::Texture>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            Some(t) if !state.textures.contains_key(&t.0) => state.fail(INVALID_OPERATION),
            Some(t) => {
                state.texture_units.insert(unit, t.0);
            }
            None => {
                state.texture_units.remove(&unit);
            }
        }
    }

    fn tex_image_2d_rgba8(&self, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        if pixels.len() != (width * height * 4) as usize {
            state.fail(INVALID_VALUE);
            return;
        }
        let unit = state.active_unit;
        let Some(texture) = state.texture_units.get(&unit).copied() else {
            state.fail(INVALID_OPERATION);
            return;
        };
        if let Some(object) = state.textures.get_mut(&texture) {
            object.width = width;
            object.height = height;
        }
    }

    fn tex_sampling(&self, wrap: TextureWrap) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        let Some(texture) = state.texture_units.get(&unit).copied() else {
            state.fail(INVALID_OPERATION);
            return;
        };
        if let Some(object) = state.textures.get_mut(&texture) {
            object.wrap = Some(wrap);
        }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture.0);
        state.texture_units.retain(|_, t| *t != texture.0);
    }

    fn draw_elements(&self, topology: Topology, count: i32) {
        self.record_draw(topology, true, count);
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        if first < 0 {
            self.state.borrow_mut().fail(INVALID_VALUE);
            return;
        }
        self.record_draw(topology, false, count);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear(&self, color: bool, depth: bool) {
        let mut state = self.state.borrow_mut();
        state.clears += 1;
        if color {
            state.framebuffer.color = Some(state.clear_color);
        }
        if depth {
            state.framebuffer.depth = Some(1.0);
        }
    }

    fn enable(&self, capability: Capability) {
        self.state.borrow_mut().capabilities.insert(capability);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = [x, y, width, height];
    }

    fn get_error(&self) -> Option<u32> {
        self.state.borrow_mut().errors.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330 core\nuniform mat4 u_MVP;\nvoid main() {}\n";
    const FRAGMENT: &str = "#version 330 core\nuniform vec4 u_Color;\nvoid main() {}\n";

    fn linked_program(gpu: &HeadlessGpu) -> HeadlessHandle {
        let vs = gpu.create_shader(ShaderStage::Vertex).unwrap();
        gpu.shader_source(vs, VERTEX);
        gpu.compile_shader(vs);
        let fs = gpu.create_shader(ShaderStage::Fragment).unwrap();
        gpu.shader_source(fs, FRAGMENT);
        gpu.compile_shader(fs);
        let program = gpu.create_program().unwrap();
        gpu.attach_shader(program, vs);
        gpu.attach_shader(program, fs);
        gpu.link_program(program);
        program
    }

    #[test]
    fn uniforms_come_from_declarations() {
        let gpu = HeadlessGpu::new();
        let program = linked_program(&gpu);
        assert!(gpu.get_program_link_status(program));
        assert!(gpu.get_uniform_location(program, "u_MVP").is_some());
        assert!(gpu.get_uniform_location(program, "u_Color").is_some());
        assert!(gpu.get_uniform_location(program, "u_Missing").is_none());
    }

    #[test]
    fn error_directive_fails_compilation() {
        let gpu = HeadlessGpu::new();
        let shader = gpu.create_shader(ShaderStage::Fragment).unwrap();
        gpu.shader_source(shader, "void main() {}\n#error broken\n");
        gpu.compile_shader(shader);
        assert!(!gpu.get_shader_compile_status(shader));
        assert!(gpu.get_shader_info_log(shader).contains("#error"));
    }

    #[test]
    fn draw_without_program_is_rejected() {
        let gpu = HeadlessGpu::new();
        let vao = gpu.create_vertex_array().unwrap();
        gpu.bind_vertex_array(Some(vao));
        gpu.draw_arrays(Topology::TriangleStrip, 0, 4);
        assert!(gpu.draw_calls().is_empty());
        assert_eq!(gpu.get_error(), Some(INVALID_OPERATION));
        assert_eq!(gpu.get_error(), None);
    }

    #[test]
    fn element_buffer_belongs_to_vertex_array() {
        let gpu = HeadlessGpu::new();
        let program = linked_program(&gpu);
        gpu.use_program(Some(program));

        let vao = gpu.create_vertex_array().unwrap();
        gpu.bind_vertex_array(Some(vao));
        let ebo = gpu.create_buffer().unwrap();
        gpu.bind_buffer(BufferTarget::ElementArray, Some(ebo));
        let indices: Vec<u8> = [0u32, 1, 2].iter().flat_map(|i| i.to_ne_bytes()).collect();
        gpu.buffer_data_u8_slice(BufferTarget::ElementArray, &indices);
        gpu.bind_vertex_array(None);

        gpu.bind_vertex_array(Some(vao));
        gpu.draw_elements(Topology::Triangles, 3);
        gpu.draw_elements(Topology::Triangles, 6);

        let draws = gpu.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].element_buffer, Some(ebo));
        assert_eq!(gpu.get_error(), Some(INVALID_OPERATION));
    }
}
