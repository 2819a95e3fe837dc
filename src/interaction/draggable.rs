use glam::Vec3;

use super::{ControllerEvent, InteractionSettings, PointerButton, PointerPress, PointerSample};
use crate::math::Plane;
use crate::persistence::{LoadPoll, PendingLoad, PersistenceClient};
use crate::scene_graph::{ObjectId, ObjectRegistry, SceneObject};

#[cfg(test)]
#[path = "draggable_test.rs"]
mod tests;

/// Active gesture of one object. Only one mode can be live at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Sliding along the ground plane.
    Dragging {
        /// Object origin minus the pointer's ground hit at drag start, y = 0.
        offset: Vec3,
    },
    /// Spinning about the vertical axis.
    Rotating,
}

/// Drives one registered object from pointer input.
///
/// The controller never owns its object: the scene's [`ObjectRegistry`] does,
/// and is passed in on every call so sibling objects stay visible for
/// collision checks.
pub struct DraggableController {
    id: ObjectId,
    state: InteractionState,
    settings: InteractionSettings,
    pending_load: Option<PendingLoad>,
}

impl DraggableController {
    /// Registers `object` at its default transform and starts loading its
    /// persisted state. The object is usable before the load resolves.
    pub fn mount(
        registry: &mut ObjectRegistry,
        persistence: &PersistenceClient,
        object: SceneObject,
        settings: InteractionSettings,
    ) -> Self {
        let id = object.id.clone();
        let pending_load = persistence.load(&id);

        if registry.register(object).is_some() {
            log::warn!("Object {id} was already registered, replacing it");
        }

        Self {
            id,
            state: InteractionState::Idle,
            settings,
            pending_load: Some(pending_load),
        }
    }

    pub fn unmount(self, registry: &mut ObjectRegistry) -> Option<SceneObject> {
        registry.unregister(&self.id)
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != InteractionState::Idle
    }

    pub fn is_rotating(&self) -> bool {
        self.state == InteractionState::Rotating
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    /// Applies the persisted state once it arrives. Returns the resolved yaw
    /// the first time, `None` while pending and after.
    pub fn poll_load(&mut self, registry: &mut ObjectRegistry) -> Option<ControllerEvent> {
        let pending = self.pending_load.as_mut()?;
        let LoadPoll::Ready(state) = pending.poll() else {
            return None;
        };
        self.pending_load = None;

        let Some(object) = registry.get_mut(&self.id) else {
            log::debug!("Discarding loaded state for unregistered object {}", self.id);
            return None;
        };

        match state {
            Some(state) => {
                object.transform.set_translation(state.position.into());
                object.transform.set_rotation(state.rotation.into());
                log::debug!("Restored {} at {:?}", self.id, object.transform.translation());
            }
            None => log::debug!("No saved state for {}, keeping defaults", self.id),
        }

        Some(ControllerEvent::InitialYaw {
            id: self.id.clone(),
            yaw: object.transform.yaw(),
        })
    }

    /// Starts a gesture on this object. Returns `Some` when the press was
    /// consumed, which keeps it away from the camera controls.
    pub fn pointer_down(
        &mut self,
        registry: &ObjectRegistry,
        pointer: &PointerSample,
        press: PointerPress,
    ) -> Option<ControllerEvent> {
        let object = registry.get(&self.id)?;

        self.state = if press.starts_rotation() {
            InteractionState::Rotating
        } else if press.button == PointerButton::Primary {
            let position = object.transform.translation();
            let offset = Plane::GROUND
                .intersect_ray(&pointer.ray)
                .map_or(Vec3::ZERO, |hit| {
                    Vec3::new(position.x - hit.x, 0.0, position.z - hit.z)
                });
            InteractionState::Dragging { offset }
        } else {
            return None;
        };

        Some(ControllerEvent::Selected(self.id.clone()))
    }

    /// Per-frame step of the active gesture.
    pub fn update(&mut self, registry: &mut ObjectRegistry, pointer: &PointerSample) {
        match self.state {
            InteractionState::Idle => {}
            InteractionState::Dragging { offset } => self.drag(registry, pointer, offset),
            InteractionState::Rotating => {
                if let Some(object) = registry.get_mut(&self.id) {
                    object
                        .transform
                        .rotate_yaw(pointer.ndc.x * self.settings.rotate_sensitivity);
                }
            }
        }
    }

    fn drag(&self, registry: &mut ObjectRegistry, pointer: &PointerSample, offset: Vec3) {
        let Some(hit) = Plane::GROUND.intersect_ray(&pointer.ray) else {
            return;
        };
        let Some(object) = registry.get(&self.id) else {
            return;
        };

        let current = object.transform.translation();
        let candidate = Vec3::new(hit.x + offset.x, current.y, hit.z + offset.z);
        let bounds = object.world_bounds_at(candidate);

        if let Some(blocker) =
            registry.first_overlap(&self.id, &bounds, self.settings.collision_margin)
        {
            log::trace!("{} blocked by {blocker}", self.id);
            return;
        }

        if let Some(object) = registry.get_mut(&self.id) {
            object.transform.set_translation(candidate);
        }
    }

    /// Ends any gesture and persists the object's current transform. Safe to
    /// call repeatedly; each call writes the same state.
    pub fn pointer_up(&mut self, registry: &ObjectRegistry, persistence: &PersistenceClient) {
        self.state = InteractionState::Idle;

        if let Some(object) = registry.get(&self.id) {
            persistence.save(
                &self.id,
                object.transform.translation(),
                object.transform.rotation(),
            );
        }
    }
}
