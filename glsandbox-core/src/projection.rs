//! Projection and view matrices derived from the framebuffer size.

use glam::{Mat4, Vec3};

/// Width of the visible world in orthographic mode, in world units.
pub const WORLD_WIDTH: f32 = 6.0;
/// Vertical field of view in perspective mode, in degrees.
pub const FIELD_OF_VIEW: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;
/// How far the perspective camera sits back from the origin along +Z.
pub const CAMERA_DISTANCE: f32 = 3.0;

/// Which kind of projection an engine uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    #[default]
    Orthographic,
    Perspective,
}

/// Size of the framebuffer in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferSize {
    pub width: i32,
    pub height: i32,
}

impl FramebufferSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// `width / height`, or `1.0` when either side is not positive.
    pub fn aspect(&self) -> f32 {
        if self.width <= 0 || self.height <= 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Extents of an orthographic view volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoBounds {
    /// A volume [`WORLD_WIDTH`] units wide whose height follows the aspect ratio.
    pub fn for_size(size: FramebufferSize) -> Self {
        let half_width = WORLD_WIDTH / 2.0;
        let half_height = WORLD_WIDTH / size.aspect() / 2.0;
        Self {
            left: -half_width,
            right: half_width,
            bottom: -half_height,
            top: half_height,
            near: -1.0,
            far: 1.0,
        }
    }
}

/// The projection an engine composes every model matrix with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Orthographic(OrthoBounds),
    Perspective { aspect: f32 },
}

impl Projection {
    pub fn new(mode: ProjectionMode, size: FramebufferSize) -> Self {
        match mode {
            ProjectionMode::Orthographic => Projection::Orthographic(OrthoBounds::for_size(size)),
            ProjectionMode::Perspective => Projection::Perspective {
                aspect: size.aspect(),
            },
        }
    }

    pub fn mode(&self) -> ProjectionMode {
        match self {
            Projection::Orthographic(_) => ProjectionMode::Orthographic,
            Projection::Perspective { .. } => ProjectionMode::Perspective,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Orthographic(b) => {
                Mat4::orthographic_rh_gl(b.left, b.right, b.bottom, b.top, b.near, b.far)
            }
            Projection::Perspective { aspect } => Mat4::perspective_rh_gl(
                FIELD_OF_VIEW.to_radians(),
                aspect,
                NEAR_PLANE,
                FAR_PLANE,
            ),
        }
    }

    /// Identity in orthographic mode; a camera pulled back [`CAMERA_DISTANCE`] otherwise.
    pub fn view(&self) -> Mat4 {
        match self {
            Projection::Orthographic(_) => Mat4::IDENTITY,
            Projection::Perspective { .. } => {
                Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE))
            }
        }
    }

    /// `projection * view`, ready to be multiplied by a model matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.matrix() * self.view()
    }

    /// The world-space rectangle visible in the `z = 0` plane.
    pub fn visible_bounds(&self) -> OrthoBounds {
        match *self {
            Projection::Orthographic(bounds) => bounds,
            Projection::Perspective { aspect } => {
                let half_height = CAMERA_DISTANCE * (FIELD_OF_VIEW.to_radians() / 2.0).tan();
                let half_width = half_height * aspect;
                OrthoBounds {
                    left: -half_width,
                    right: half_width,
                    bottom: -half_height,
                    top: half_height,
                    near: -1.0,
                    far: 1.0,
                }
            }
        }
    }
}
