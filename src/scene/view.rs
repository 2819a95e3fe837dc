use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use crate::camera::Camera;

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;

const PERSPECTIVE_EYE: Vec3 = Vec3::new(3.0, 3.0, 3.0);
const TOP_DOWN_EYE: Vec3 = Vec3::new(0.0, 10.0, 0.0);

const ORBIT_SPEED: f32 = std::f32::consts::PI;
const PAN_SPEED: f32 = 0.5;
const MIN_PITCH: f32 = 0.05;
const MIN_DISTANCE: f32 = 1.5;
const MAX_DISTANCE: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Perspective,
    TopDown,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Perspective => ViewMode::TopDown,
            ViewMode::TopDown => ViewMode::Perspective,
        }
    }

    /// Label of the button that switches away from this mode.
    pub fn toggle_label(self) -> &'static str {
        match self {
            ViewMode::Perspective => "Switch to Top View",
            ViewMode::TopDown => "Switch to 3D View",
        }
    }
}

/// Spherical coordinates of the perspective eye around the target.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Orbit {
    yaw: f32,
    pitch: f32,
    distance: f32,
}

impl Orbit {
    fn from_offset(offset: Vec3) -> Self {
        let distance = offset.length();
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).asin(),
            distance,
        }
    }

    fn offset(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }
}

/// Camera plus the view mode and orbit controls that position it.
///
/// Orbiting, panning and zooming only apply in [`ViewMode::Perspective`]; the
/// top-down view is fixed and looks at the origin every frame.
#[derive(Debug, Clone)]
pub struct CameraRig {
    mode: ViewMode,
    camera: Camera,
    orbit: Orbit,
}

impl CameraRig {
    pub fn new(fov_y: f32) -> Self {
        let mut rig = Self {
            mode: ViewMode::Perspective,
            camera: Camera::new(PERSPECTIVE_EYE, Vec3::ZERO, fov_y),
            orbit: Orbit::from_offset(PERSPECTIVE_EYE),
        };
        rig.set_mode(ViewMode::Perspective);
        rig
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[cfg(test)]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn toggle(&mut self) -> ViewMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    /// Moves the camera to the fixed pose of `mode`. Switching back to
    /// perspective discards any earlier orbiting.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.camera.target = Vec3::ZERO;

        match mode {
            ViewMode::Perspective => {
                self.orbit = Orbit::from_offset(PERSPECTIVE_EYE);
                self.camera.eye = PERSPECTIVE_EYE;
                self.camera.up = Vec3::Y;
            }
            ViewMode::TopDown => {
                self.camera.eye = TOP_DOWN_EYE;
                self.camera.up = Vec3::Z;
            }
        }
    }

    /// Rotates the eye around the target by a pointer delta in NDC units.
    pub fn orbit(&mut self, delta: Vec2) {
        if self.mode != ViewMode::Perspective {
            return;
        }

        self.orbit.yaw -= delta.x * ORBIT_SPEED;
        self.orbit.pitch =
            (self.orbit.pitch - delta.y * ORBIT_SPEED).clamp(MIN_PITCH, FRAC_PI_2 - MIN_PITCH);
        self.apply_orbit();
    }

    /// Slides target and eye together across the view plane so the scene
    /// follows the pointer. Scaled by orbit distance.
    pub fn pan(&mut self, delta: Vec2) {
        if self.mode != ViewMode::Perspective {
            return;
        }

        let forward = (self.camera.target - self.camera.eye).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);

        let shift = (-right * delta.x - up * delta.y) * self.orbit.distance * PAN_SPEED;
        self.camera.target += shift;
        self.apply_orbit();
    }

    /// Positive `steps` move the eye closer.
    pub fn zoom(&mut self, steps: f32) {
        if self.mode != ViewMode::Perspective {
            return;
        }

        self.orbit.distance =
            (self.orbit.distance * 0.9f32.powf(steps)).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.apply_orbit();
    }

    pub fn update(&mut self) {
        if self.mode == ViewMode::TopDown {
            self.camera.target = Vec3::ZERO;
            self.camera.up = Vec3::Z;
        }
    }

    fn apply_orbit(&mut self) {
        self.camera.eye = self.camera.target + self.orbit.offset();
    }
}
