use std::collections::BTreeMap;

use crate::scene_graph::ObjectId;

/// Wraps any angle into `[0, 360)`. Non-finite input maps to 0.
pub fn normalize_degrees(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }

    let wrapped = ((degrees % 360.0) + 360.0) % 360.0;
    // -0.0 and float rounding right below 360
    if wrapped >= 360.0 || wrapped == 0.0 {
        0.0
    } else {
        wrapped
    }
}

/// Yaw in degrees shown by the rotation panel, one entry per object.
#[derive(Debug, Default)]
pub struct RotationPanel {
    degrees: BTreeMap<ObjectId, f32>,
}

impl RotationPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displays a yaw given in radians, rounded to whole degrees.
    pub fn show_yaw(&mut self, id: &ObjectId, yaw: f32) {
        let degrees = normalize_degrees(yaw.to_degrees().round());
        self.degrees.insert(id.clone(), degrees);
    }

    pub fn show_degrees(&mut self, id: &ObjectId, degrees: f32) {
        self.degrees.insert(id.clone(), degrees);
    }

    pub fn degrees(&self, id: &ObjectId) -> Option<f32> {
        self.degrees.get(id).copied()
    }

    pub fn remove(&mut self, id: &ObjectId) {
        self.degrees.remove(id);
    }

    pub fn clear(&mut self) {
        self.degrees.clear();
    }
}
