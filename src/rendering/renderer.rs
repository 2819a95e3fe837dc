use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::CameraUniform,
    model::{ModelId, ModelLibrary},
    rendering::{
        grid_pass::GridPass,
        imgui_renderer::ImguiRendererState,
        mesh_pass::{MeshDraw, MeshPass},
        render_model::RenderModel,
        texture::DepthTexture,
    },
    scene::EditorScene,
};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.09,
    b: 0.11,
    a: 1.0,
};
const SELECTED_TINT: [f32; 4] = [1.0, 0.8, 0.45, 1.0];
const DEFAULT_TINT: [f32; 4] = [1.0; 4];

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,

    depth_texture: DepthTexture,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    render_models: HashMap<ModelId, RenderModel>,

    grid_pass: GridPass,
    mesh_pass: MeshPass,
    imgui_renderer: ImguiRendererState,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, imgui: &mut imgui::Context) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_texture = DepthTexture::new(
            &device,
            surface_config.width,
            surface_config.height,
            "Depth Texture",
        );

        let camera_uniform = CameraUniform::default();
        let camera_buffer = camera_uniform.create_buffer(&device);
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera uniform bind group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let grid_pass = GridPass::new(&device, surface_format, &camera_layout);
        let mesh_pass = MeshPass::new(&device, surface_format, &camera_layout);
        let imgui_renderer = ImguiRendererState::new(&device, &queue, surface_format, imgui);

        log::info!(
            "Renderer ready on {} ({:?})",
            adapter.get_info().name,
            surface_format
        );

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            surface_config,
            depth_texture,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            render_models: HashMap::new(),
            grid_pass,
            mesh_pass,
            imgui_renderer,
        })
    }

    /// Uploads every model in the library that is not on the GPU yet.
    pub fn load_models(&mut self, models: &ModelLibrary) {
        for (id, model) in models.iter() {
            if self.render_models.contains_key(&id) {
                continue;
            }

            self.render_models
                .insert(id, RenderModel::from_model(&self.device, model));
            log::debug!(
                "Uploaded model {} with {} triangles",
                model.name,
                model.indices.len() / 3
            );
        }
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
            self.depth_texture
                .resize(&self.device, new_size.width, new_size.height);
        }
    }

    pub fn render(
        &mut self,
        scene: &EditorScene,
        imgui: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.camera_uniform.update(self.size, scene.camera());
        self.camera_uniform
            .update_buffer(&self.queue, &self.camera_buffer);

        let selected = scene.selected();
        let draws: Vec<MeshDraw> = scene
            .registry()
            .iter()
            .map(|object| MeshDraw {
                model_id: object.model_id,
                transform: object.transform.matrix(),
                tint: if selected == Some(&object.id) {
                    SELECTED_TINT
                } else {
                    DEFAULT_TINT
                },
            })
            .collect();
        self.mesh_pass.prepare(&self.device, &self.queue, &draws);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth_texture.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.grid_pass
                .draw(&mut render_pass, &self.camera_bind_group);
            self.mesh_pass.draw(
                &mut render_pass,
                &self.camera_bind_group,
                &draws,
                &self.render_models,
            );
        }

        self.imgui_renderer
            .render(&view, imgui, &self.device, &self.queue, &mut encoder);

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
