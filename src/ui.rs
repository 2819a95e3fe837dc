use imgui::Condition;

use crate::interaction::InteractionState;
use crate::scene::EditorScene;
use crate::scene_graph::ObjectId;

const SELECTED_COLOR: [f32; 4] = [1.0, 0.8, 0.45, 1.0];
const MUTED_COLOR: [f32; 4] = [0.6, 0.6, 0.65, 1.0];

/// View mode toggle and one rotation card per object.
pub fn draw(ui: &imgui::Ui, scene: &mut EditorScene) {
    ui.window("Scene")
        .position([12.0, 12.0], Condition::FirstUseEver)
        .always_auto_resize(true)
        .build(|| {
            if ui.button(scene.view_mode().toggle_label()) {
                scene.toggle_view_mode();
            }

            if scene.is_loading() {
                ui.text_colored(MUTED_COLOR, "Loading saved positions...");
            }
            ui.text_colored(MUTED_COLOR, "Drag to move, right-drag or Shift-drag to rotate");

            if scene.registry().is_empty() {
                ui.text("No objects configured");
            }

            let ids: Vec<ObjectId> = scene.registry().iter().map(|o| o.id.clone()).collect();
            for id in ids {
                ui.separator();
                rotation_card(ui, scene, &id);
            }
        });
}

fn rotation_card(ui: &imgui::Ui, scene: &mut EditorScene, id: &ObjectId) {
    let _id = ui.push_id(id.as_str());

    let status = match scene.gesture(id) {
        Some(InteractionState::Dragging { .. }) => " (moving)",
        Some(InteractionState::Rotating) => " (rotating)",
        _ => "",
    };

    if scene.selected() == Some(id) {
        ui.text_colored(SELECTED_COLOR, format!("{id}{status}"));
    } else {
        ui.text(format!("{id}{status}"));
    }

    let mut degrees = scene.panel().degrees(id).unwrap_or(0.0);
    let mut changed = ui.slider("Yaw", 0.0, 360.0, &mut degrees);
    changed |= ui
        .input_float("Degrees", &mut degrees)
        .display_format("%.0f")
        .build();

    if changed {
        scene.set_rotation_degrees(id, degrees);
    }
}
