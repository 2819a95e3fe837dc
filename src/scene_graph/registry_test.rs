use glam::Vec3;

use super::*;
use crate::math::Ray;
use crate::model::{Model, ModelLibrary};
use crate::scene_graph::Transform;

fn object_at(library: &mut ModelLibrary, id: &str, x: f32) -> SceneObject {
    let model = Model::cube(id, 0.5, [1.0; 4]);
    let collider = model.collider();
    let model_id = library.insert(model);
    SceneObject::new(
        ObjectId::new(id),
        Transform::from_translation(Vec3::new(x, 0.0, 0.0)),
        model_id,
        collider,
    )
}

#[test]
fn register_and_unregister() {
    let mut library = ModelLibrary::new();
    let mut registry = ObjectRegistry::new();

    assert!(registry.register(object_at(&mut library, "duck", 0.0)).is_none());
    assert!(registry.get(&ObjectId::new("duck")).is_some());
    assert_eq!(registry.len(), 1);

    let removed = registry.unregister(&ObjectId::new("duck")).unwrap();
    assert_eq!(removed.id.as_str(), "duck");
    assert!(registry.is_empty());
    assert!(registry.unregister(&ObjectId::new("duck")).is_none());
}

#[test]
fn register_replaces_existing_entry() {
    let mut library = ModelLibrary::new();
    let mut registry = ObjectRegistry::new();

    registry.register(object_at(&mut library, "duck", 0.0));
    let previous = registry.register(object_at(&mut library, "duck", 4.0)).unwrap();

    assert_eq!(previous.transform.translation().x, 0.0);
    assert_eq!(
        registry.get(&ObjectId::new("duck")).unwrap().transform.translation().x,
        4.0
    );
}

#[test]
fn iteration_is_in_id_order() {
    let mut library = ModelLibrary::new();
    let mut registry = ObjectRegistry::new();
    registry.register(object_at(&mut library, "duck2", 3.0));
    registry.register(object_at(&mut library, "alpha", 6.0));
    registry.register(object_at(&mut library, "duck", 0.0));

    let ids: Vec<&str> = registry.iter().map(|object| object.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "duck", "duck2"]);
}

#[test]
fn first_overlap_ignores_self() {
    let mut library = ModelLibrary::new();
    let mut registry = ObjectRegistry::new();
    registry.register(object_at(&mut library, "duck", 0.0));

    let id = ObjectId::new("duck");
    let bounds = registry.get(&id).unwrap().world_bounds();
    assert!(registry.first_overlap(&id, &bounds, 0.05).is_none());
}

#[test]
fn first_overlap_reports_lowest_id_blocker() {
    let mut library = ModelLibrary::new();
    let mut registry = ObjectRegistry::new();
    registry.register(object_at(&mut library, "duck", 0.0));
    registry.register(object_at(&mut library, "b", 1.5));
    registry.register(object_at(&mut library, "a", 1.5));

    let id = ObjectId::new("duck");
    let candidate = registry.get(&id).unwrap().world_bounds_at(Vec3::new(1.2, 0.0, 0.0));
    assert_eq!(
        registry.first_overlap(&id, &candidate, 0.05).map(ObjectId::as_str),
        Some("a")
    );
}

#[test]
fn near_touching_is_not_overlap() {
    let mut library = ModelLibrary::new();
    let mut registry = ObjectRegistry::new();
    registry.register(object_at(&mut library, "duck", 0.0));
    registry.register(object_at(&mut library, "duck2", 1.5));

    let id = ObjectId::new("duck");
    let touching = registry.get(&id).unwrap().world_bounds_at(Vec3::new(0.5, 0.0, 0.0));
    assert!(registry.first_overlap(&id, &touching, 0.05).is_none());

    let overlapping = registry.get(&id).unwrap().world_bounds_at(Vec3::new(0.7, 0.0, 0.0));
    assert!(registry.first_overlap(&id, &overlapping, 0.05).is_some());
}

#[test]
fn pick_returns_nearest_hit() {
    let mut library = ModelLibrary::new();
    let mut registry = ObjectRegistry::new();
    registry.register(object_at(&mut library, "near", 0.0));
    registry.register(object_at(&mut library, "far", 3.0));

    let ray = Ray::new(Vec3::new(-5.0, 0.5, 0.0), Vec3::X);
    assert_eq!(registry.pick(&ray).map(ObjectId::as_str), Some("near"));

    let miss = Ray::new(Vec3::new(-5.0, 0.5, 4.0), Vec3::X);
    assert!(registry.pick(&miss).is_none());
}
