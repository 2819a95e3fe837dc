use std::collections::BTreeMap;

use crate::math::{Aabb, Ray};
use crate::scene_graph::object::{ObjectId, SceneObject};

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// Live objects of one scene, keyed and iterated in ascending id order.
///
/// Every controller reads the whole registry for its collision checks, so the
/// iteration order doubles as the tie-break when two objects block each other.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: BTreeMap<ObjectId, SceneObject>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the object, returning whatever was registered under its id.
    pub fn register(&mut self, object: SceneObject) -> Option<SceneObject> {
        self.objects.insert(object.id.clone(), object)
    }

    pub fn unregister(&mut self, id: &ObjectId) -> Option<SceneObject> {
        self.objects.remove(id)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// First object other than `id` whose shrunk world bounds overlap the
    /// shrunk `bounds`.
    pub fn first_overlap(&self, id: &ObjectId, bounds: &Aabb, margin: f32) -> Option<&ObjectId> {
        let candidate = bounds.shrink(margin);

        self.objects
            .iter()
            .filter(|(other_id, _)| *other_id != id)
            .find(|(_, other)| candidate.intersects(&other.world_bounds().shrink(margin)))
            .map(|(other_id, _)| other_id)
    }

    /// Nearest object whose world bounds the ray enters.
    pub fn pick(&self, ray: &Ray) -> Option<&ObjectId> {
        self.objects
            .iter()
            .filter_map(|(id, object)| {
                object
                    .world_bounds()
                    .intersect_ray(ray)
                    .map(|distance| (id, distance))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id)
    }
}
