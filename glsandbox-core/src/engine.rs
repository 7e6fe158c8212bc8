//! The graphics engine: a registry of drawable objects keyed by [`ObjectId`].
//!
//! An engine owns one shader program, one projection and every GPU object created through
//! it. Callers only ever hold ids. Each `create_*` call either registers a complete
//! [`ResourceBundle`] under a fresh id or fails without registering anything.

use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap;
use glam::{Mat4, Vec4};
use image::DynamicImage;

use crate::abs::{IndexBuffer, Renderer, ShaderProgram, Texture, Vertex, VertexArray, VertexBuffer};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::gpu::{Capability, Gpu, TextureWrap};
use crate::primitives::{QUAD_INDICES, QUAD_VERTICES, cube_indices, cube_vertices};
use crate::projection::{FramebufferSize, Projection};

/// Opaque handle to an object registered with a [`GraphicsEngine`].
///
/// Ids start at 1 and are never reused by the engine that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "object #{}", self.0)
    }
}

/// The GPU objects behind one id. They are created together and dropped together.
pub struct ResourceBundle<G: Gpu> {
    vertex_array: VertexArray<G>,
    _vertex_buffer: VertexBuffer<G>,
    index_buffer: IndexBuffer<G>,
    texture: Texture<G>,
}

impl<G: Gpu> ResourceBundle<G> {
    fn new<V: Vertex>(
        gpu: &Arc<G>,
        vertices: &[V],
        indices: &[u32],
        texture: Texture<G>,
    ) -> Result<Self> {
        let vertex_buffer = VertexBuffer::new(gpu, vertices)?;
        let index_buffer = IndexBuffer::new(gpu, indices)?;
        let mut vertex_array = VertexArray::new(gpu)?;
        vertex_array.add_buffer(&vertex_buffer, &V::layout());

        Ok(Self {
            vertex_array,
            _vertex_buffer: vertex_buffer,
            index_buffer,
            texture,
        })
    }

    pub fn index_count(&self) -> usize {
        self.index_buffer.count()
    }

    pub fn texture(&self) -> &Texture<G> {
        &self.texture
    }
}

/// Creates, draws and releases textured objects on one GPU context.
pub struct GraphicsEngine<G: Gpu = glow::Context> {
    gpu: Arc<G>,
    shader: ShaderProgram<G>,
    renderer: Renderer<G>,
    projection: Projection,
    view_projection: Mat4,
    texture_wrap: TextureWrap,
    objects: FxHashMap<ObjectId, ResourceBundle<G>>,
    shared_cube: Option<ResourceBundle<G>>,
    next_id: u32,
}

impl<G: Gpu> GraphicsEngine<G> {
    /// Builds the shader at `config.shader_path` and sets up the projection for `size`.
    pub fn new(gpu: &Arc<G>, size: FramebufferSize, config: &EngineConfig) -> Result<Self> {
        let shader = ShaderProgram::from_file(gpu, &config.shader_path)?;
        Self::with_program(gpu, size, config, shader)
    }

    /// Like [`GraphicsEngine::new`] with an already linked program. `config.shader_path`
    /// is ignored.
    pub fn with_program(
        gpu: &Arc<G>,
        size: FramebufferSize,
        config: &EngineConfig,
        shader: ShaderProgram<G>,
    ) -> Result<Self> {
        let projection = Projection::new(config.projection, size);

        gpu.enable(Capability::Blend);
        gpu.enable(Capability::DepthTest);

        shader.bind();
        shader.set_uniform_1i("u_Texture", 0);

        let shared_cube = match &config.shared_cube_texture {
            Some(path) => {
                let texture = Texture::from_file(gpu, path, config.texture_wrap)?;
                Some(ResourceBundle::new(gpu, &cube_vertices(), &cube_indices(), texture)?)
            }
            None => None,
        };

        log::info!(
            "Graphics engine ready: {:?} projection for {}x{}",
            projection.mode(),
            size.width,
            size.height
        );

        Ok(Self {
            gpu: Arc::clone(gpu),
            shader,
            renderer: Renderer::new(gpu, true),
            projection,
            view_projection: projection.view_projection(),
            texture_wrap: config.texture_wrap,
            objects: FxHashMap::default(),
            shared_cube,
            next_id: 1,
        })
    }

    /// Registers a unit quad textured with the image at `texture_path`.
    pub fn create_quad(&mut self, texture_path: impl AsRef<Path>) -> Result<ObjectId> {
        let texture = Texture::from_file(&self.gpu, texture_path, self.texture_wrap)?;
        self.register(&QUAD_VERTICES, &QUAD_INDICES, texture)
    }

    /// Registers a unit quad textured with an already decoded image.
    pub fn create_quad_from_image(&mut self, image: &DynamicImage) -> Result<ObjectId> {
        let texture = Texture::new(&self.gpu, image, self.texture_wrap)?;
        self.register(&QUAD_VERTICES, &QUAD_INDICES, texture)
    }

    /// Registers a unit cube, every face showing the whole image at `texture_path`.
    pub fn create_cube(&mut self, texture_path: impl AsRef<Path>) -> Result<ObjectId> {
        let texture = Texture::from_file(&self.gpu, texture_path, self.texture_wrap)?;
        self.register(&cube_vertices(), &cube_indices(), texture)
    }

    fn register<V: Vertex>(
        &mut self,
        vertices: &[V],
        indices: &[u32],
        texture: Texture<G>,
    ) -> Result<ObjectId> {
        let bundle = ResourceBundle::new(&self.gpu, vertices, indices, texture)?;
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        log::debug!("Registered {} ({} indices)", id, bundle.index_count());
        self.objects.insert(id, bundle);
        Ok(id)
    }

    /// Draws `id` with `model` and a color multiplied into its texture.
    pub fn draw(&self, id: ObjectId, model: Mat4, color: Vec4) -> Result<()> {
        let bundle = self.objects.get(&id).ok_or(EngineError::UnknownObject(id))?;
        self.draw_bundle(bundle, model, color)
    }

    /// Draws the cube mesh built at construction from `shared_cube_texture`.
    pub fn draw_shared_cube(&self, model: Mat4, color: Vec4) -> Result<()> {
        let bundle = self
            .shared_cube
            .as_ref()
            .ok_or(EngineError::SharedMeshUnavailable)?;
        self.draw_bundle(bundle, model, color)
    }

    fn draw_bundle(&self, bundle: &ResourceBundle<G>, model: Mat4, color: Vec4) -> Result<()> {
        self.shader.bind();
        self.shader.set_uniform_1i("u_Texture", 0);
        self.shader
            .set_uniform_mat4("u_MVP", &(self.view_projection * model));
        self.shader.set_uniform("u_Color", color);
        bundle.texture.bind(0);
        self.renderer
            .draw(&bundle.vertex_array, &bundle.index_buffer, &self.shader)
    }

    /// Clears the framebuffer to `color` and resets depth.
    pub fn clear(&self, color: Vec4) {
        self.renderer.clear(Some(color));
    }

    /// Drops the GPU objects of `id`. The id stays retired.
    pub fn release(&mut self, id: ObjectId) -> Result<()> {
        self.objects
            .remove(&id)
            .ok_or(EngineError::UnknownObject(id))?;
        log::debug!("Released {}", id);
        Ok(())
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::gpu::HeadlessGpu;
    use crate::gpu::headless::UniformValue;
    use crate::primitives::{CubeFaces, Primitive};
    use crate::projection::ProjectionMode;
    use glam::Vec3;

    const SOURCE: &str = "#shader vertex
#version 330 core
layout(location = 0) in vec4 position;
layout(location = 1) in vec2 texCoord;
out vec2 v_TexCoord;
uniform mat4 u_MVP;
void main() { gl_Position = u_MVP * position; v_TexCoord = texCoord; }
#shader fragment
#version 330 core
layout(location = 0) out vec4 color;
in vec2 v_TexCoord;
uniform vec4 u_Color;
uniform sampler2D u_Texture;
void main() { color = texture(u_Texture, v_TexCoord) * u_Color; }
";

    fn fixture(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("glsandbox-{}-{}.png", name, std::process::id()));
        image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn engine_with(
        size: FramebufferSize,
        config: &EngineConfig,
    ) -> (Arc<HeadlessGpu>, GraphicsEngine<HeadlessGpu>) {
        let gpu = Arc::new(HeadlessGpu::new());
        let shader = ShaderProgram::from_source(&gpu, SOURCE).unwrap();
        let engine = GraphicsEngine::with_program(&gpu, size, config, shader).unwrap();
        (gpu, engine)
    }

    fn engine() -> (Arc<HeadlessGpu>, GraphicsEngine<HeadlessGpu>) {
        engine_with(FramebufferSize::new(800, 600), &EngineConfig::default())
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let (_gpu, mut engine) = engine();
        let texture = fixture("ids");
        let ids = [
            engine.create_quad(&texture).unwrap(),
            engine.create_cube(&texture).unwrap(),
            engine.create_quad(&texture).unwrap(),
        ];
        assert_eq!(ids[0].get(), 1);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(engine.object_count(), 3);
    }

    #[test]
    fn draw_then_clear() {
        let (gpu, mut engine) = engine();
        let id = engine.create_quad(fixture("draw")).unwrap();
        engine.draw(id, Mat4::IDENTITY, Vec4::ONE).unwrap();
        engine.clear(Vec4::new(0.1, 0.1, 0.2, 1.0));

        assert_eq!(gpu.draw_calls().len(), 1);
        assert_eq!(gpu.framebuffer().color, Some([0.1, 0.1, 0.2, 1.0]));
        assert_eq!(gpu.framebuffer().depth, Some(1.0));
        assert_eq!(gpu.get_error(), None);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let (gpu, engine) = engine();
        let result = engine.draw(ObjectId(42), Mat4::IDENTITY, Vec4::ONE);
        assert!(matches!(result, Err(EngineError::UnknownObject(ObjectId(42)))));
        assert!(gpu.draw_calls().is_empty());
    }

    #[test]
    fn clearing_twice_is_clearing_once() {
        let (gpu, engine) = engine();
        let color = Vec4::new(0.3, 0.2, 0.1, 1.0);
        engine.clear(color);
        let once = gpu.framebuffer();
        engine.clear(color);
        assert_eq!(gpu.framebuffer(), once);
    }

    #[test]
    fn quad_on_two_by_three_window() {
        let (gpu, mut engine) = engine_with(FramebufferSize::new(2, 3), &EngineConfig::default());
        let id = engine.create_quad(fixture("two-by-three")).unwrap();
        engine.draw(id, Mat4::IDENTITY, Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();

        let draws = gpu.draw_calls();
        assert_eq!(draws.len(), 1);
        assert!(draws[0].indexed);
        assert_eq!(draws[0].count, 6);
        assert!(draws[0].texture.is_some());
        assert_eq!(
            draws[0].uniforms["u_Color"],
            UniformValue::Vec4([1.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(draws[0].uniforms["u_Texture"], UniformValue::Int(0));

        let expected = Mat4::orthographic_rh_gl(-3.0, 3.0, -4.5, 4.5, -1.0, 1.0);
        let UniformValue::Mat4(mvp) = draws[0].uniforms["u_MVP"] else {
            panic!("u_MVP is not a matrix");
        };
        assert!(Mat4::from_cols_array(&mvp).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn missing_texture_registers_nothing() {
        let (gpu, mut engine) = engine();
        let before = gpu.live_objects();
        let result = engine.create_quad("no/such/texture.png");
        assert!(matches!(result, Err(EngineError::TextureLoad { .. })));
        assert_eq!(engine.object_count(), 0);
        assert_eq!(gpu.live_objects(), before);

        let id = engine.create_quad(fixture("after-missing")).unwrap();
        assert_eq!(id.get(), 1);
    }

    #[test]
    fn missing_shader_file_fails_construction() {
        let gpu = Arc::new(HeadlessGpu::new());
        let config = EngineConfig {
            shader_path: PathBuf::from("no/such/basic.shader"),
            ..EngineConfig::default()
        };
        let result = GraphicsEngine::new(&gpu, FramebufferSize::new(640, 480), &config);
        assert!(matches!(result, Err(EngineError::ShaderRead { .. })));
    }

    #[test]
    fn shader_file_is_loaded_from_config() {
        let path = std::env::temp_dir().join(format!("glsandbox-basic-{}.shader", std::process::id()));
        std::fs::write(&path, SOURCE).unwrap();
        let gpu = Arc::new(HeadlessGpu::new());
        let config = EngineConfig {
            shader_path: path,
            ..EngineConfig::default()
        };
        let engine = GraphicsEngine::new(&gpu, FramebufferSize::new(640, 480), &config).unwrap();
        assert_eq!(engine.object_count(), 0);
        assert!(gpu.is_enabled(Capability::Blend));
    }

    #[test]
    fn perspective_clears_depth() {
        let config = EngineConfig {
            projection: ProjectionMode::Perspective,
            ..EngineConfig::default()
        };
        let (gpu, engine) = engine_with(FramebufferSize::new(800, 600), &config);
        assert!(gpu.is_enabled(Capability::DepthTest));
        engine.clear(Vec4::ZERO);
        assert_eq!(gpu.framebuffer().depth, Some(1.0));
    }

    #[test]
    fn orthographic_cube_is_depth_tested() {
        let (gpu, mut engine) = engine();
        assert_eq!(engine.projection().mode(), ProjectionMode::Orthographic);
        let id = engine.create_cube(fixture("ortho-cube")).unwrap();
        engine.clear(Vec4::ZERO);
        engine.draw(id, Mat4::from_rotation_y(0.5), Vec4::ONE).unwrap();

        assert!(gpu.is_enabled(Capability::DepthTest));
        assert_eq!(gpu.framebuffer().depth, Some(1.0));
        assert_eq!(gpu.draw_calls().len(), 1);

        // Every rotated corner stays between the near and far planes.
        let UniformValue::Mat4(mvp) = gpu.draw_calls()[0].uniforms["u_MVP"] else {
            panic!("u_MVP is not a matrix");
        };
        let mvp = Mat4::from_cols_array(&mvp);
        for vertex in cube_vertices() {
            let clip = mvp * Vec3::from_array(vertex.position).extend(1.0);
            assert!(clip.z > -1.0 && clip.z < 1.0);
        }
    }

    #[test]
    fn perspective_uploads_projection_view_model() {
        let config = EngineConfig {
            projection: ProjectionMode::Perspective,
            ..EngineConfig::default()
        };
        let (gpu, mut engine) = engine_with(FramebufferSize::new(800, 600), &config);
        let id = engine.create_cube(fixture("perspective-mvp")).unwrap();
        let model = Mat4::from_translation(Vec3::new(1.0, -0.5, 0.0)) * Mat4::from_rotation_x(0.7);
        engine.draw(id, model, Vec4::ONE).unwrap();

        let projection = Mat4::perspective_rh_gl(45f32.to_radians(), 800.0 / 600.0, 0.1, 100.0);
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
        let UniformValue::Mat4(mvp) = gpu.draw_calls()[0].uniforms["u_MVP"] else {
            panic!("u_MVP is not a matrix");
        };
        assert!(Mat4::from_cols_array(&mvp).abs_diff_eq(projection * view * model, 1e-5));
    }

    #[test]
    fn rejected_draw_is_an_error() {
        let (gpu, mut engine) = engine();
        let id = engine.create_quad(fixture("rejected")).unwrap();
        gpu.delete_vertex_array(engine.objects[&id].vertex_array.id());

        let result = engine.draw(id, Mat4::IDENTITY, Vec4::ONE);
        assert!(matches!(result, Err(EngineError::Gpu { .. })));
        assert!(gpu.draw_calls().is_empty());
    }

    #[test]
    fn cube_is_one_draw_of_36_indices() {
        let (gpu, mut engine) = engine();
        let id = engine.create_cube(fixture("cube")).unwrap();
        engine.draw(id, Mat4::from_rotation_y(0.5), Vec4::ONE).unwrap();
        let draws = gpu.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 36);
    }

    #[test]
    fn shared_cube_needs_configuration() {
        let (_gpu, engine) = engine();
        assert!(matches!(
            engine.draw_shared_cube(Mat4::IDENTITY, Vec4::ONE),
            Err(EngineError::SharedMeshUnavailable)
        ));

        let config = EngineConfig {
            shared_cube_texture: Some(fixture("shared")),
            ..EngineConfig::default()
        };
        let (gpu, engine) = engine_with(FramebufferSize::new(800, 600), &config);
        for x in [-1.0, 0.0, 1.0] {
            let model = Mat4::from_translation(Vec3::new(x, 0.0, 0.0));
            engine.draw_shared_cube(model, Vec4::ONE).unwrap();
        }
        let draws = gpu.draw_calls();
        assert_eq!(draws.len(), 3);
        assert!(draws.iter().all(|d| d.count == 36 && d.vertex_array == draws[0].vertex_array));
        assert_eq!(engine.object_count(), 0);
    }

    #[test]
    fn release_retires_the_id() {
        let (gpu, mut engine) = engine();
        let texture = fixture("release");
        let first = engine.create_quad(&texture).unwrap();
        let live = gpu.live_objects();

        engine.release(first).unwrap();
        assert!(!engine.contains(first));
        assert_eq!(gpu.live_objects().buffers, live.buffers - 2);
        assert_eq!(gpu.live_objects().textures, live.textures - 1);
        assert!(matches!(engine.release(first), Err(EngineError::UnknownObject(_))));
        assert!(engine.draw(first, Mat4::IDENTITY, Vec4::ONE).is_err());

        let second = engine.create_quad(&texture).unwrap();
        assert!(second > first);
    }

    #[test]
    fn cube_faces_register_six_quads() {
        let (gpu, mut engine) = engine();
        let mut objects = Vec::new();
        CubeFaces::new(fixture("faces"), Vec4::ONE)
            .build(&mut objects, &mut engine)
            .unwrap();

        assert_eq!(objects.len(), 6);
        assert!(objects.iter().all(|o| o.is_cube_face));
        assert!(objects.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(engine.object_count(), 6);

        let normals: Vec<Vec3> = objects
            .iter()
            .map(|o| o.model.transform_vector3(Vec3::Z).round())
            .collect();
        for (i, a) in normals.iter().enumerate() {
            assert!(normals[i + 1..].iter().all(|b| b != a));
        }

        let cube = Mat4::from_rotation_y(0.3);
        for object in &objects {
            engine.draw(object.id, cube * object.model, object.color).unwrap();
        }
        assert_eq!(gpu.draw_calls().len(), 6);
        assert!(gpu.draw_calls().iter().all(|d| d.count == 6));
    }

    #[test]
    fn failed_cube_faces_leave_nothing_behind() {
        let (_gpu, mut engine) = engine();
        let mut objects = Vec::new();
        let result = CubeFaces::new("no/such/face.png", Vec4::ONE).build(&mut objects, &mut engine);
        assert!(result.is_err());
        assert!(objects.is_empty());
        assert_eq!(engine.object_count(), 0);
    }

    #[test]
    fn quad_from_decoded_image() {
        let (gpu, mut engine) = engine();
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(4, 2));
        let id = engine.create_quad_from_image(&image).unwrap();
        assert!(engine.contains(id));
        assert_eq!(gpu.live_objects().textures, 1);
    }
}
