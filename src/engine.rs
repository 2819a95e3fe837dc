use anyhow::Context;
use glam::Vec3;

use crate::{
    config::EditorConfig,
    model::ModelLibrary,
    persistence::PersistenceClient,
    rendering::Renderer,
    scene::EditorScene,
    scene_graph::{ObjectId, SceneObject, Transform},
    ui,
};

/// Everything the frame loop updates: the scene and the models it draws.
pub struct EditorState {
    pub scene: EditorScene,
    pub models: ModelLibrary,
}

impl EditorState {
    /// Loads each configured asset once and mounts its objects.
    pub fn new(config: &EditorConfig, persistence: PersistenceClient) -> anyhow::Result<Self> {
        let mut models = ModelLibrary::new();
        let mut scene = EditorScene::new(
            persistence,
            config.interaction,
            config.camera.fov_degrees.to_radians(),
        );

        for object in &config.objects {
            let model_id = models.load_or_placeholder(&object.asset);
            let collider = models
                .get(model_id)
                .map(|model| model.collider())
                .with_context(|| format!("No model loaded for {}", object.id))?;

            let transform = Transform::new(
                object.position(),
                Vec3::new(0.0, object.rotation_y_degrees.to_radians(), 0.0),
            );

            scene.mount_object(SceneObject::new(
                ObjectId::new(object.id.as_str()),
                transform,
                model_id,
                collider,
            ));
            log::debug!("Mounted {} from {}", object.id, object.asset.display());
        }

        log::info!(
            "Mounted {} objects using {} models",
            scene.registry().len(),
            models.len()
        );

        Ok(Self { scene, models })
    }
}

pub fn update(
    state: &mut EditorState,
    renderer: &mut Renderer,
    ui: &mut imgui::Ui,
) -> anyhow::Result<()> {
    state.scene.set_viewport(renderer.size.width as f32, renderer.size.height as f32);
    state.scene.update();

    ui::draw(ui, &mut state.scene);

    Ok(())
}
