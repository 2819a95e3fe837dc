use std::fmt;

use glam::Vec3;

use crate::math::Aabb;
use crate::model::{Collider, ModelId};
use crate::scene_graph::transform::Transform;

/// Scene-unique object name, also the key of its persisted document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub transform: Transform,
    pub model_id: ModelId,
    pub collider: Collider,
}

impl SceneObject {
    pub fn new(id: ObjectId, transform: Transform, model_id: ModelId, collider: Collider) -> Self {
        Self {
            id,
            transform,
            model_id,
            collider,
        }
    }

    /// World-space box around the collider at the current transform.
    pub fn world_bounds(&self) -> Aabb {
        self.collider.bounds().transform(&self.transform.matrix())
    }

    /// World bounds the object would have if moved to `translation` with its
    /// current rotation.
    pub fn world_bounds_at(&self, translation: Vec3) -> Aabb {
        self.world_bounds()
            .translate(translation - self.transform.translation())
    }
}
