use glam::{EulerRot, Mat4, Quat, Vec3};
use std::cell::Cell;

/// Translation plus Euler rotation (radians, XYZ order) with a lazily rebuilt
/// local matrix.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Vec3,

    matrix: Cell<Mat4>,
    dirty: Cell<bool>,
}

impl Transform {
    pub fn new(translation: Vec3, rotation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            matrix: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(true),
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Vec3::ZERO)
    }

    pub fn matrix(&self) -> Mat4 {
        if self.dirty.get() {
            let matrix = Mat4::from_rotation_translation(self.quat(), self.translation);
            self.matrix.set(matrix);
            self.dirty.set(false);
        }

        self.matrix.get()
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    fn invalidate(&self) {
        self.dirty.set(true);
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Rotation about the vertical axis.
    pub fn yaw(&self) -> f32 {
        self.rotation.y
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.invalidate();
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.rotation.y = yaw;
        self.invalidate();
    }

    pub fn rotate_yaw(&mut self, delta: f32) {
        self.rotation.y += delta;
        self.invalidate();
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}
