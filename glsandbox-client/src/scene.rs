//! Scene objects and the per-object controls that move them.
//!
//! Each control is keyed by the [`ObjectId`] of the object it drives. A cube built from
//! six faces has one control, keyed by its first face, and every face records that id as
//! its owner.

use std::path::PathBuf;

use fxhash::FxHashMap;
use glam::{Mat4, Vec3, Vec4};
use glsandbox_core::gpu::Gpu;
use glsandbox_core::projection::OrthoBounds;
use glsandbox_core::{CubeFaces, GraphicsEngine, ObjectId, Primitive, Projection, ScreenObject};

use crate::input::{Action, KeyboardState};

/// Distance from an object's center to its edge.
const HALF_EXTENT: f32 = 0.5;
/// World units per second an object moves while an arrow key is held.
const MOVE_SPEED: f32 = 2.0;
const ROTATION_STEP: f32 = 0.25;
const MAX_ROTATION_SPEED: f32 = 6.0;
const BRIGHTNESS_STEP: f32 = 0.1;
const MAX_BRIGHTNESS: f32 = 2.0;
/// Change of the green channel per frame.
const COLOR_STEP: f32 = 0.05;

/// Where a new object is placed and how it spins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectControl {
    pub move_x: f32,
    pub move_y: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    pub angle: f32,
    pub spin_axis: Vec3,
    home: (f32, f32),
}

impl ObjectControl {
    pub fn new(move_x: f32, move_y: f32, spin_axis: Vec3) -> Self {
        Self {
            move_x,
            move_y,
            rotation_speed: 0.0,
            angle: 0.0,
            spin_axis,
            home: (move_x, move_y),
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.move_x, self.move_y, 0.0))
            * Mat4::from_axis_angle(self.spin_axis, self.angle)
    }

    /// Keeps the whole object inside `bounds`.
    pub fn clamp_to(&mut self, bounds: &OrthoBounds) {
        let (left, right) = (bounds.left + HALF_EXTENT, bounds.right - HALF_EXTENT);
        let bottom = bounds.bottom + HALF_EXTENT;
        let top = (bounds.top - HALF_EXTENT).max(bottom);
        self.move_x = self.move_x.clamp(left, right);
        self.move_y = self.move_y.clamp(bottom, top);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.home.0, self.home.1, self.spin_axis);
    }
}

/// A triangle wave between 0 and 1, advanced once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Oscillator {
    value: f32,
    increment: f32,
}

impl Oscillator {
    fn step(&mut self) {
        if self.value > 1.0 {
            self.increment = -COLOR_STEP;
        } else if self.value < 0.0 {
            self.increment = COLOR_STEP;
        }
        self.value += self.increment;
    }
}

pub struct Scene {
    objects: Vec<ScreenObject>,
    owners: FxHashMap<ObjectId, ObjectId>,
    controls: FxHashMap<ObjectId, ObjectControl>,
    /// Controls in creation order, for cycling the selection.
    order: Vec<ObjectId>,
    selected: usize,
    texture: PathBuf,
    green: Oscillator,
    pub object_brightness: f32,
    pub background_brightness: f32,
    pub clear_color: Vec4,
}

impl Scene {
    pub fn new(texture: impl Into<PathBuf>, clear_color: Vec4) -> Self {
        Self {
            objects: Vec::new(),
            owners: FxHashMap::default(),
            controls: FxHashMap::default(),
            order: Vec::new(),
            selected: 0,
            texture: texture.into(),
            green: Oscillator {
                value: 0.0,
                increment: COLOR_STEP,
            },
            object_brightness: 1.0,
            background_brightness: 1.0,
            clear_color,
        }
    }

    /// Two quads, one left of center and one at the origin.
    pub fn populate<G: Gpu>(&mut self, engine: &mut GraphicsEngine<G>) -> Result<(), String> {
        self.add_quad(engine, -1.5, 0.0)?;
        self.add_quad(engine, 0.0, 0.0)?;
        Ok(())
    }

    pub fn add_quad<G: Gpu>(
        &mut self,
        engine: &mut GraphicsEngine<G>,
        x: f32,
        y: f32,
    ) -> Result<ObjectId, String> {
        let id = engine.create_quad(&self.texture).map_err(|e| e.to_string())?;
        self.push_single(id, ObjectControl::new(x, y, Vec3::Z));
        Ok(id)
    }

    pub fn add_cube<G: Gpu>(
        &mut self,
        engine: &mut GraphicsEngine<G>,
        x: f32,
        y: f32,
    ) -> Result<ObjectId, String> {
        let id = engine.create_cube(&self.texture).map_err(|e| e.to_string())?;
        self.push_single(id, ObjectControl::new(x, y, Vec3::new(1.0, 1.0, 0.0).normalize()));
        Ok(id)
    }

    pub fn add_cube_faces<G: Gpu>(
        &mut self,
        engine: &mut GraphicsEngine<G>,
        x: f32,
        y: f32,
    ) -> Result<ObjectId, String> {
        let mut faces = Vec::new();
        CubeFaces::new(&self.texture, Vec4::ONE)
            .build(&mut faces, engine)
            .map_err(|e| e.to_string())?;
        let owner = faces.first().map(|face| face.id).ok_or("cube has no faces")?;
        for face in &faces {
            self.owners.insert(face.id, owner);
        }
        self.objects.extend(faces);
        self.controls.insert(
            owner,
            ObjectControl::new(x, y, Vec3::new(1.0, 1.0, 0.0).normalize()),
        );
        self.order.push(owner);
        Ok(owner)
    }

    fn push_single(&mut self, id: ObjectId, control: ObjectControl) {
        self.objects.push(ScreenObject {
            id,
            model: Mat4::IDENTITY,
            color: Vec4::ONE,
            is_cube_face: false,
        });
        self.owners.insert(id, id);
        self.controls.insert(id, control);
        self.order.push(id);
    }

    /// Releases the selected object, all six faces of it for a per-face cube.
    pub fn remove_selected<G: Gpu>(
        &mut self,
        engine: &mut GraphicsEngine<G>,
    ) -> Result<(), String> {
        let Some(owner) = self.selected_id() else {
            return Ok(());
        };
        let owners = &self.owners;
        let (removed, kept): (Vec<ScreenObject>, Vec<ScreenObject>) = self
            .objects
            .drain(..)
            .partition(|object| owners.get(&object.id) == Some(&owner));
        self.objects = kept;
        for object in removed {
            self.owners.remove(&object.id);
            engine.release(object.id).map_err(|e| e.to_string())?;
        }
        self.controls.remove(&owner);
        self.order.retain(|id| *id != owner);
        if self.selected >= self.order.len() {
            self.selected = 0;
        }
        log::info!("Removed {}", owner);
        Ok(())
    }

    pub fn selected_id(&self) -> Option<ObjectId> {
        self.order.get(self.selected).copied()
    }

    pub fn control(&self, id: ObjectId) -> Option<&ObjectControl> {
        self.controls.get(&id)
    }

    pub fn objects(&self) -> &[ScreenObject] {
        &self.objects
    }

    /// Applies a one-shot command. Returns `false` when the sandbox should quit.
    pub fn apply<G: Gpu>(
        &mut self,
        action: Action,
        engine: &mut GraphicsEngine<G>,
    ) -> Result<bool, String> {
        match action {
            Action::SelectNext => {
                if !self.order.is_empty() {
                    self.selected = (self.selected + 1) % self.order.len();
                }
            }
            Action::AddQuad => {
                self.add_quad(engine, 0.0, 0.0)?;
            }
            Action::AddCube => {
                self.add_cube(engine, 0.0, 0.0)?;
            }
            Action::AddCubeFaces => {
                self.add_cube_faces(engine, 0.0, 0.0)?;
            }
            Action::RemoveSelected => self.remove_selected(engine)?,
            Action::SlowerRotation => self.adjust_rotation(-ROTATION_STEP),
            Action::FasterRotation => self.adjust_rotation(ROTATION_STEP),
            Action::DimObjects => {
                self.object_brightness = step_brightness(self.object_brightness, -1.0)
            }
            Action::BrightenObjects => {
                self.object_brightness = step_brightness(self.object_brightness, 1.0)
            }
            Action::DimBackground => {
                self.background_brightness = step_brightness(self.background_brightness, -1.0)
            }
            Action::BrightenBackground => {
                self.background_brightness = step_brightness(self.background_brightness, 1.0)
            }
            Action::ResetAll => self.reset(),
            Action::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn adjust_rotation(&mut self, delta: f32) {
        if let Some(control) = self.selected_id().and_then(|id| self.controls.get_mut(&id)) {
            control.rotation_speed =
                (control.rotation_speed + delta).clamp(-MAX_ROTATION_SPEED, MAX_ROTATION_SPEED);
        }
    }

    pub fn reset(&mut self) {
        for control in self.controls.values_mut() {
            control.reset();
        }
        self.object_brightness = 1.0;
        self.background_brightness = 1.0;
    }

    /// Advances one frame: moves the selected object by the held arrow keys, spins every
    /// object, keeps them inside what `projection` shows and steps the color.
    pub fn update(&mut self, keyboard: &KeyboardState, delta_time: f32, projection: &Projection) {
        use sdl2::keyboard::Keycode;

        if let Some(control) = self.selected_id().and_then(|id| self.controls.get_mut(&id)) {
            control.move_x += keyboard.axis(Keycode::Left, Keycode::Right) * MOVE_SPEED * delta_time;
            control.move_y += keyboard.axis(Keycode::Down, Keycode::Up) * MOVE_SPEED * delta_time;
        }

        let bounds = projection.visible_bounds();
        for control in self.controls.values_mut() {
            control.angle += control.rotation_speed * delta_time;
            control.clamp_to(&bounds);
        }

        self.green.step();
    }

    /// Color every object is tinted with this frame.
    pub fn object_color(&self) -> Vec4 {
        let b = self.object_brightness;
        Vec4::new(b, self.green.value * b, 0.2 * b, 1.0)
    }

    pub fn background_clear_color(&self) -> Vec4 {
        let rgb = self.clear_color.truncate() * self.background_brightness;
        rgb.extend(self.clear_color.w)
    }

    /// Draws every object in creation order.
    pub fn draw<G: Gpu>(&self, engine: &GraphicsEngine<G>) -> Result<(), String> {
        let color = self.object_color();
        for object in &self.objects {
            let owner = self.owners.get(&object.id).copied().unwrap_or(object.id);
            let placement = self
                .controls
                .get(&owner)
                .map_or(Mat4::IDENTITY, ObjectControl::model);
            engine
                .draw(object.id, placement * object.model, color * object.color)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

fn step_brightness(value: f32, direction: f32) -> f32 {
    (value + direction * BRIGHTNESS_STEP).clamp(0.0, MAX_BRIGHTNESS)
}
