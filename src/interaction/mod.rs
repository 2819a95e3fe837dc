//! Pointer input model and the per-object drag/rotate controller.

mod draggable;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::math::Ray;
use crate::scene_graph::ObjectId;

pub use draggable::{DraggableController, InteractionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerPress {
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerPress {
    pub fn new(button: PointerButton, modifiers: Modifiers) -> Self {
        Self { button, modifiers }
    }

    /// Right button, or the primary button with Shift held.
    pub fn starts_rotation(&self) -> bool {
        match self.button {
            PointerButton::Secondary => true,
            PointerButton::Primary => self.modifiers.shift,
            PointerButton::Middle => false,
        }
    }
}

/// Pointer position for one frame, with the camera ray already cast through it.
#[derive(Debug, Clone, Copy)]
pub struct PointerSample {
    /// Normalized device coordinates, x right and y up in [-1, 1].
    pub ndc: Vec2,
    pub ray: Ray,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Yaw change per frame, in radians per unit of horizontal pointer NDC.
    pub rotate_sensitivity: f32,
    /// Inward shrink applied to every box before overlap tests.
    pub collision_margin: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.1,
            collision_margin: 0.05,
        }
    }
}

/// Notifications a controller hands back to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Selected(ObjectId),
    /// Yaw the object settled on once its persisted state resolved.
    InitialYaw { id: ObjectId, yaw: f32 },
}
