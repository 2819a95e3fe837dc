//! The editable scene: registered objects, their controllers, selection,
//! the camera rig and the rotation panel.

mod rotation;
mod view;

use std::collections::BTreeMap;

use glam::Vec2;

use crate::{
    camera::Camera,
    interaction::{
        ControllerEvent, DraggableController, InteractionSettings, InteractionState, PointerButton,
        PointerPress, PointerSample,
    },
    persistence::PersistenceClient,
    scene_graph::{ObjectId, ObjectRegistry, SceneObject},
};

pub use rotation::{normalize_degrees, RotationPanel};
pub use view::{CameraRig, ViewMode};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Camera gesture started on empty space, with the last pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CameraDrag {
    Orbit(Vec2),
    Pan(Vec2),
}

pub struct EditorScene {
    registry: ObjectRegistry,
    controllers: BTreeMap<ObjectId, DraggableController>,
    persistence: PersistenceClient,
    settings: InteractionSettings,
    rig: CameraRig,
    panel: RotationPanel,
    selected: Option<ObjectId>,
    pointer_ndc: Vec2,
    aspect: f32,
    camera_drag: Option<CameraDrag>,
}

impl EditorScene {
    pub fn new(persistence: PersistenceClient, settings: InteractionSettings, fov_y: f32) -> Self {
        Self {
            registry: ObjectRegistry::new(),
            controllers: BTreeMap::new(),
            persistence,
            settings,
            rig: CameraRig::new(fov_y),
            panel: RotationPanel::new(),
            selected: None,
            pointer_ndc: Vec2::ZERO,
            aspect: 1.0,
            camera_drag: None,
        }
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn panel(&self) -> &RotationPanel {
        &self.panel
    }

    pub fn selected(&self) -> Option<&ObjectId> {
        self.selected.as_ref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.rig.mode()
    }

    pub fn camera(&self) -> &Camera {
        self.rig.camera()
    }

    pub fn persistence(&self) -> &PersistenceClient {
        &self.persistence
    }

    pub fn gesture(&self, id: &ObjectId) -> Option<InteractionState> {
        self.controllers.get(id).map(DraggableController::state)
    }

    /// True while any object is still waiting for its persisted state.
    pub fn is_loading(&self) -> bool {
        self.controllers.values().any(DraggableController::is_loading)
    }

    /// Registers `object` and starts loading its persisted state. An object
    /// with the same id is replaced.
    pub fn mount_object(&mut self, object: SceneObject) {
        let id = object.id.clone();
        if self.controllers.contains_key(&id) {
            self.unmount_object(&id);
        }

        self.panel.show_yaw(&id, object.transform.yaw());
        let controller =
            DraggableController::mount(&mut self.registry, &self.persistence, object, self.settings);
        self.controllers.insert(id, controller);
    }

    pub fn unmount_object(&mut self, id: &ObjectId) -> Option<SceneObject> {
        let controller = self.controllers.remove(id)?;
        self.panel.remove(id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }

        controller.unmount(&mut self.registry)
    }

    /// Unmounts every object. Pending loads are dropped; queued saves still
    /// reach the store.
    pub fn teardown(&mut self) {
        let controllers = std::mem::take(&mut self.controllers);
        for controller in controllers.into_values() {
            controller.unmount(&mut self.registry);
        }

        self.registry.clear();
        self.panel.clear();
        self.selected = None;
        self.camera_drag = None;
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    fn pointer_sample(&self) -> PointerSample {
        PointerSample {
            ndc: self.pointer_ndc,
            ray: self.rig.camera().screen_ray(self.pointer_ndc, self.aspect),
        }
    }

    pub fn pointer_moved(&mut self, ndc: Vec2) {
        match self.camera_drag {
            Some(CameraDrag::Orbit(last)) => {
                self.rig.orbit(ndc - last);
                self.camera_drag = Some(CameraDrag::Orbit(ndc));
            }
            Some(CameraDrag::Pan(last)) => {
                self.rig.pan(ndc - last);
                self.camera_drag = Some(CameraDrag::Pan(ndc));
            }
            None => {}
        }

        self.pointer_ndc = ndc;
    }

    /// Routes a press to the nearest object under the pointer, falling back
    /// to the camera controls: primary orbits, secondary pans. Returns `true`
    /// if an object consumed it.
    pub fn pointer_down(&mut self, press: PointerPress) -> bool {
        let sample = self.pointer_sample();
        let target = self.registry.pick(&sample.ray).cloned();

        if let Some(id) = target {
            if let Some(controller) = self.controllers.get_mut(&id) {
                if let Some(event) = controller.pointer_down(&self.registry, &sample, press) {
                    self.handle_event(event);
                    return true;
                }
            }
        }

        if self.rig.mode() == ViewMode::Perspective {
            self.camera_drag = match press.button {
                PointerButton::Primary => Some(CameraDrag::Orbit(self.pointer_ndc)),
                PointerButton::Secondary => Some(CameraDrag::Pan(self.pointer_ndc)),
                PointerButton::Middle => None,
            };
        }

        false
    }

    /// Ends the active gesture, or releases onto the object under the
    /// pointer when nothing is active.
    pub fn pointer_up(&mut self) {
        self.camera_drag = None;

        let mut released = false;
        for controller in self.controllers.values_mut().filter(|c| c.is_active()) {
            controller.pointer_up(&self.registry, &self.persistence);
            released = true;
        }
        if released {
            return;
        }

        let sample = self.pointer_sample();
        let Some(id) = self.registry.pick(&sample.ray).cloned() else {
            return;
        };
        if let Some(controller) = self.controllers.get_mut(&id) {
            controller.pointer_up(&self.registry, &self.persistence);
        }
    }

    pub fn wheel(&mut self, steps: f32) {
        self.rig.zoom(steps);
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.camera_drag = None;
        let mode = self.rig.toggle();
        log::debug!("View mode is now {mode:?}");
        mode
    }

    /// Sets an object's yaw from the panel and persists it. Unknown ids are
    /// ignored.
    pub fn set_rotation_degrees(&mut self, id: &ObjectId, degrees: f32) {
        let Some(object) = self.registry.get_mut(id) else {
            log::debug!("Ignoring rotation for unknown object {id}");
            return;
        };

        let normalized = normalize_degrees(degrees);
        object.transform.set_yaw(normalized.to_radians());
        self.panel.show_degrees(id, normalized);

        self.persistence.save(
            id,
            object.transform.translation(),
            object.transform.rotation(),
        );
    }

    /// One frame: apply resolved loads, step every controller in id order,
    /// then move the camera.
    pub fn update(&mut self) {
        let mut events = Vec::new();
        for controller in self.controllers.values_mut() {
            events.extend(controller.poll_load(&mut self.registry));
        }
        for event in events {
            self.handle_event(event);
        }

        let sample = self.pointer_sample();
        for (id, controller) in &mut self.controllers {
            controller.update(&mut self.registry, &sample);

            if controller.is_rotating() {
                if let Some(object) = self.registry.get(id) {
                    self.panel.show_yaw(id, object.transform.yaw());
                }
            }
        }

        self.rig.update();
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Selected(id) => self.selected = Some(id),
            ControllerEvent::InitialYaw { id, yaw } => self.panel.show_yaw(&id, yaw),
        }
    }
}
