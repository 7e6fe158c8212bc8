//! Built-in geometry and the per-face cube builder.

use std::f32::consts::{FRAC_PI_2, PI};
use std::path::PathBuf;

use glam::{Mat4, Vec3, Vec4};

use crate::abs::{Vertex, VertexBufferLayout};
use crate::engine::{GraphicsEngine, ObjectId};
use crate::error::Result;
use crate::gpu::Gpu;

/// Position and texture coordinate of a flat vertex.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl Vertex for QuadVertex {
    fn layout() -> VertexBufferLayout {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);
        layout
    }
}

/// Position and texture coordinate of a cube vertex.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex for CubeVertex {
    fn layout() -> VertexBufferLayout {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(3).push::<f32>(2);
        layout
    }
}

/// A unit square centered on the origin, counter-clockwise from the bottom-left corner.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-0.5, -0.5], uv: [0.0, 0.0] },
    QuadVertex { position: [0.5, -0.5], uv: [1.0, 0.0] },
    QuadVertex { position: [0.5, 0.5], uv: [1.0, 1.0] },
    QuadVertex { position: [-0.5, 0.5], uv: [0.0, 1.0] },
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Outward normal and the two in-plane axes (u, v) of each cube face.
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

/// The 24 vertices of a unit cube, four per face so every face gets the full texture.
pub fn cube_vertices() -> Vec<CubeVertex> {
    let corners = QUAD_VERTICES.map(|v| (v.position[0], v.position[1], v.uv));
    CUBE_FACES
        .iter()
        .flat_map(|&(normal, u, v)| {
            let (normal, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            corners.iter().map(move |&(a, b, uv)| CubeVertex {
                position: (normal * 0.5 + u * a + v * b).to_array(),
                uv,
            })
        })
        .collect()
}

/// Two counter-clockwise triangles per face of [`cube_vertices`].
pub fn cube_indices() -> Vec<u32> {
    (0..CUBE_FACES.len() as u32)
        .flat_map(|face| QUAD_INDICES.iter().map(move |i| face * 4 + i))
        .collect()
}

/// Something drawn by the client each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenObject {
    pub id: ObjectId,
    /// Transform of the object relative to its owner. Cube faces are composed with the
    /// cube's own transform at draw time.
    pub model: Mat4,
    pub color: Vec4,
    pub is_cube_face: bool,
}

/// A shape that registers one or more objects with an engine.
pub trait Primitive {
    /// Creates the shape's resources on `engine` and appends one [`ScreenObject`] per id.
    fn build<G: Gpu>(
        &self,
        out: &mut Vec<ScreenObject>,
        engine: &mut GraphicsEngine<G>,
    ) -> Result<()>;
}

/// A cube assembled from six textured quads.
///
/// Faces are appended in the order front, back, left, right, top, bottom. If one face
/// fails to load, the faces already created are released and nothing is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeFaces {
    pub texture_path: PathBuf,
    pub color: Vec4,
}

impl CubeFaces {
    pub fn new(texture_path: impl Into<PathBuf>, color: Vec4) -> Self {
        Self {
            texture_path: texture_path.into(),
            color,
        }
    }

    /// Rotation of each face followed by a push of half a unit along its normal.
    pub fn face_models() -> [Mat4; 6] {
        let push = Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5));
        [
            Mat4::IDENTITY,
            Mat4::from_rotation_y(PI),
            Mat4::from_rotation_y(-FRAC_PI_2),
            Mat4::from_rotation_y(FRAC_PI_2),
            Mat4::from_rotation_x(-FRAC_PI_2),
            Mat4::from_rotation_x(FRAC_PI_2),
        ]
        .map(|rotation| rotation * push)
    }
}

impl Primitive for CubeFaces {
    fn build<G: Gpu>(
        &self,
        out: &mut Vec<ScreenObject>,
        engine: &mut GraphicsEngine<G>,
    ) -> Result<()> {
        let mut faces = Vec::with_capacity(6);
        for model in Self::face_models() {
            match engine.create_quad(&self.texture_path) {
                Ok(id) => faces.push(ScreenObject {
                    id,
                    model,
                    color: self.color,
                    is_cube_face: true,
                }),
                Err(err) => {
                    for face in &faces {
                        engine.release(face.id)?;
                    }
                    return Err(err);
                }
            }
        }
        out.extend(faces);
        Ok(())
    }
}
