use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{Vec2, Vec3};
use serde_json::json;

use super::*;
use crate::interaction::Modifiers;
use crate::model::{Model, ModelLibrary};
use crate::persistence::{MemoryStore, PersistedState, StateStore};
use crate::scene_graph::Transform;

const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 600.0;

struct Fixture {
    rt: tokio::runtime::Runtime,
    store: Arc<MemoryStore>,
    library: ModelLibrary,
    scene: EditorScene,
}

impl Fixture {
    fn new() -> Self {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let persistence = PersistenceClient::new(store.clone(), rt.handle().clone());
        let mut scene = EditorScene::new(
            persistence,
            InteractionSettings::default(),
            45f32.to_radians(),
        );
        scene.set_viewport(WIDTH, HEIGHT);

        Self {
            rt,
            store,
            library: ModelLibrary::new(),
            scene,
        }
    }

    fn mount(&mut self, id: &str, position: Vec3) {
        let model = Model::cube(id, 0.5, [1.0; 4]);
        let collider = model.collider();
        let model_id = self.library.insert(model);

        self.scene.mount_object(SceneObject::new(
            ObjectId::new(id),
            Transform::from_translation(position),
            model_id,
            collider,
        ));
    }

    fn settle(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.scene.is_loading() {
            assert!(Instant::now() < deadline, "loads did not resolve");
            self.scene.update();
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Where `point` lands on screen with the current camera.
    fn ndc_of(&self, point: Vec3) -> Vec2 {
        self.scene
            .camera()
            .view_projection(WIDTH / HEIGHT)
            .project_point3(point)
            .truncate()
    }

    fn move_to(&mut self, point: Vec3) {
        let ndc = self.ndc_of(point);
        self.scene.pointer_moved(ndc);
        self.scene.update();
    }

    fn object(&self, id: &str) -> &SceneObject {
        self.scene.registry().get(&ObjectId::new(id)).unwrap()
    }

    fn saved(&self, id: &str) -> Option<PersistedState> {
        assert!(self.scene.persistence().flush(Duration::from_secs(5)));
        self.rt.block_on(self.store.load_state(id)).unwrap()
    }
}

fn press(button: PointerButton) -> PointerPress {
    PointerPress::new(button, Modifiers::default())
}

#[test]
fn fresh_object_keeps_defaults_and_shows_zero() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::new(-1.5, 0.0, 0.0));
    fx.settle();

    let duck = ObjectId::new("duck");
    assert_eq!(fx.object("duck").transform.translation(), Vec3::new(-1.5, 0.0, 0.0));
    assert_eq!(fx.scene.panel().degrees(&duck), Some(0.0));
}

#[test]
fn restored_yaw_shows_in_panel() {
    let mut fx = Fixture::new();
    fx.store.insert_document(
        "duck",
        json!({
            "position": { "x": -1.0, "y": 0.0, "z": 0.5 },
            "rotation": { "x": 0.0, "y": 0.7, "z": 0.0 },
        }),
    );

    fx.mount("duck", Vec3::new(-1.5, 0.0, 0.0));
    fx.settle();

    assert_eq!(fx.object("duck").transform.translation(), Vec3::new(-1.0, 0.0, 0.5));
    assert_eq!(fx.scene.panel().degrees(&ObjectId::new("duck")), Some(40.0));
}

#[test]
fn slider_value_is_normalized_applied_and_saved() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::new(-1.5, 0.0, 0.0));
    fx.settle();

    let duck = ObjectId::new("duck");
    fx.scene.set_rotation_degrees(&duck, 400.0);

    assert_eq!(fx.object("duck").transform.yaw(), 40f32.to_radians());
    assert_eq!(fx.scene.panel().degrees(&duck), Some(40.0));

    let saved = fx.saved("duck").unwrap();
    assert!((saved.rotation.y - f64::from(40f32.to_radians())).abs() < 1e-6);
    assert_eq!(Vec3::from(saved.position), Vec3::new(-1.5, 0.0, 0.0));

    fx.scene.set_rotation_degrees(&duck, -30.0);
    assert_eq!(fx.scene.panel().degrees(&duck), Some(330.0));
}

#[test]
fn rotation_for_unknown_object_is_ignored() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::ZERO);
    fx.settle();

    let ghost = ObjectId::new("ghost");
    fx.scene.set_rotation_degrees(&ghost, 90.0);

    assert!(fx.scene.panel().degrees(&ghost).is_none());
    assert_eq!(fx.object("duck").transform.yaw(), 0.0);
    assert!(fx.saved("ghost").is_none());
}

#[test]
fn toggling_view_moves_camera() {
    let mut fx = Fixture::new();
    assert_eq!(fx.scene.view_mode(), ViewMode::Perspective);
    assert_eq!(fx.scene.view_mode().toggle_label(), "Switch to Top View");

    assert_eq!(fx.scene.toggle_view_mode(), ViewMode::TopDown);
    assert_eq!(fx.scene.camera().eye, Vec3::new(0.0, 10.0, 0.0));
    assert_eq!(fx.scene.camera().up, Vec3::Z);
    assert_eq!(fx.scene.view_mode().toggle_label(), "Switch to 3D View");

    assert_eq!(fx.scene.toggle_view_mode(), ViewMode::Perspective);
    assert!((fx.scene.camera().eye - Vec3::new(3.0, 3.0, 3.0)).length() < 1e-4);
}

#[test]
fn press_on_object_selects_it() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::ZERO);
    fx.settle();
    fx.scene.toggle_view_mode();

    fx.scene.pointer_moved(Vec2::ZERO);
    assert!(fx.scene.pointer_down(press(PointerButton::Primary)));
    assert_eq!(fx.scene.selected(), Some(&ObjectId::new("duck")));

    fx.scene.pointer_up();
}

#[test]
fn press_on_empty_space_orbits_in_perspective_only() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::ZERO);
    fx.settle();

    let start = fx.scene.camera().eye;
    fx.scene.pointer_moved(Vec2::new(0.9, 0.9));
    assert!(!fx.scene.pointer_down(press(PointerButton::Primary)));
    fx.scene.pointer_moved(Vec2::new(0.6, 0.9));
    assert!((fx.scene.camera().eye - start).length() > 0.1);
    assert!(fx.scene.selected().is_none());

    fx.scene.pointer_up();
    let released = fx.scene.camera().eye;
    fx.scene.pointer_moved(Vec2::new(0.0, 0.0));
    assert_eq!(fx.scene.camera().eye, released);

    fx.scene.toggle_view_mode();
    fx.scene.pointer_moved(Vec2::new(0.9, 0.9));
    assert!(!fx.scene.pointer_down(press(PointerButton::Primary)));
    fx.scene.pointer_moved(Vec2::new(0.2, 0.1));
    assert_eq!(fx.scene.camera().eye, Vec3::new(0.0, 10.0, 0.0));
}

#[test]
fn secondary_press_on_empty_space_pans_until_view_toggles() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::ZERO);
    fx.settle();

    let start_eye = fx.scene.camera().eye;
    fx.scene.pointer_moved(Vec2::new(0.9, 0.9));
    assert!(!fx.scene.pointer_down(press(PointerButton::Secondary)));
    fx.scene.pointer_moved(Vec2::new(0.6, 0.9));

    let target = fx.scene.camera().target;
    assert!(target.length() > 0.1);
    assert!(((fx.scene.camera().eye - start_eye) - target).length() < 1e-4);
    assert!(fx.scene.selected().is_none());
    assert!(fx.object("duck").transform.translation() == Vec3::ZERO);

    fx.scene.pointer_up();
    fx.scene.pointer_moved(Vec2::new(0.0, 0.0));
    assert_eq!(fx.scene.camera().target, target);

    fx.scene.toggle_view_mode();
    fx.scene.toggle_view_mode();
    assert_eq!(fx.scene.camera().target, Vec3::ZERO);
}

#[test]
fn drag_toward_neighbour_stops_and_release_persists() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::new(-1.5, 0.0, 0.0));
    fx.mount("duck2", Vec3::new(1.5, 0.0, 0.0));
    fx.settle();
    fx.scene.toggle_view_mode();

    fx.move_to(Vec3::new(-1.5, 0.0, 0.0));
    assert!(fx.scene.pointer_down(press(PointerButton::Primary)));
    assert_eq!(fx.scene.selected(), Some(&ObjectId::new("duck")));
    assert!(matches!(
        fx.scene.gesture(&ObjectId::new("duck")),
        Some(InteractionState::Dragging { .. })
    ));

    for x in [-1.0, -0.5, 0.0, 0.4] {
        fx.move_to(Vec3::new(x, 0.0, 0.0));
        let position = fx.object("duck").transform.translation();
        assert!((position.x - x).abs() < 1e-3, "expected {x}, got {position:?}");
        assert_eq!(position.y, 0.0);
    }

    let stopped = fx.object("duck").transform.translation();
    for x in [0.8, 1.2, 1.5] {
        fx.move_to(Vec3::new(x, 0.0, 0.0));
        assert_eq!(fx.object("duck").transform.translation(), stopped);
    }
    assert_eq!(fx.object("duck2").transform.translation(), Vec3::new(1.5, 0.0, 0.0));

    fx.scene.pointer_up();
    assert_eq!(fx.scene.gesture(&ObjectId::new("duck")), Some(InteractionState::Idle));

    let saved = fx.saved("duck").unwrap();
    assert!((Vec3::from(saved.position) - stopped).length() < 1e-5);
    assert!(fx.saved("duck2").is_none());
}

#[test]
fn pointer_rotation_tracks_panel_live() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::new(-1.5, 0.0, 0.0));
    fx.settle();
    fx.scene.toggle_view_mode();

    fx.move_to(Vec3::new(-1.5, 0.0, 0.0));
    assert!(fx.scene.pointer_down(press(PointerButton::Secondary)));

    for _ in 0..10 {
        fx.scene.update();
    }

    let duck = ObjectId::new("duck");
    let yaw = fx.object("duck").transform.yaw();
    assert!(yaw.abs() > 0.1);
    assert_eq!(
        fx.scene.panel().degrees(&duck),
        Some(normalize_degrees(yaw.to_degrees().round()))
    );

    fx.scene.pointer_up();
    let saved = fx.saved("duck").unwrap();
    assert!((saved.rotation.y - f64::from(yaw)).abs() < 1e-6);
}

#[test]
fn unmount_clears_selection_and_panel() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::ZERO);
    fx.settle();
    fx.scene.toggle_view_mode();
    fx.scene.pointer_moved(Vec2::ZERO);
    fx.scene.pointer_down(press(PointerButton::Primary));
    fx.scene.pointer_up();

    let duck = ObjectId::new("duck");
    assert!(fx.scene.unmount_object(&duck).is_some());
    assert!(fx.scene.selected().is_none());
    assert!(fx.scene.panel().degrees(&duck).is_none());
    assert!(fx.scene.registry().is_empty());
}

#[test]
fn teardown_unmounts_everything() {
    let mut fx = Fixture::new();
    fx.mount("duck", Vec3::new(-1.5, 0.0, 0.0));
    fx.mount("duck2", Vec3::new(1.5, 0.0, 0.0));

    fx.scene.teardown();

    assert!(fx.scene.registry().is_empty());
    assert!(!fx.scene.is_loading());
}
