use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{Device, MultisampleState, PipelineCompilationOptions, ShaderSource};

use super::render_model::{RenderModel, RENDER_MODEL_VBL};
use super::texture::DepthTexture;
use crate::model::ModelId;

/// Per-draw data, stored at a dynamic offset in one uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ObjectUniform {
    model: Mat4,
    tint: [f32; 4],
}

const OBJECT_UNIFORM_SIZE: u64 = std::mem::size_of::<ObjectUniform>() as u64;

pub struct MeshDraw {
    pub model_id: ModelId,
    pub transform: Mat4,
    pub tint: [f32; 4],
}

pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl MeshPass {
    pub fn new(
        device: &Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(OBJECT_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pass Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[RENDER_MODEL_VBL],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // glTF assets are not guaranteed to be consistently wound
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthTexture::depth_stencil_state()),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = OBJECT_UNIFORM_SIZE.div_ceil(alignment) * alignment;
        let capacity = 4;
        let (object_buffer, object_bind_group) =
            Self::create_object_buffer(device, &object_layout, stride, capacity);

        Self {
            pipeline,
            object_layout,
            object_buffer,
            object_bind_group,
            stride,
            capacity,
        }
    }

    fn create_object_buffer(
        device: &Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object uniform buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(OBJECT_UNIFORM_SIZE),
                }),
            }],
        });

        (buffer, bind_group)
    }

    /// Uploads the per-draw uniforms, growing the buffer when needed.
    pub fn prepare(&mut self, device: &Device, queue: &wgpu::Queue, draws: &[MeshDraw]) {
        if draws.len() > self.capacity {
            self.capacity = draws.len().next_power_of_two();
            let (buffer, bind_group) = Self::create_object_buffer(
                device,
                &self.object_layout,
                self.stride,
                self.capacity,
            );
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
        }

        if draws.is_empty() {
            return;
        }

        let stride = self.stride as usize;
        let mut staging = vec![0u8; stride * draws.len()];
        for (i, draw) in draws.iter().enumerate() {
            let uniform = ObjectUniform {
                model: draw.transform,
                tint: draw.tint,
            };
            let start = i * stride;
            staging[start..start + OBJECT_UNIFORM_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
        }

        queue.write_buffer(&self.object_buffer, 0, &staging);
    }

    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        camera_bind_group: &wgpu::BindGroup,
        draws: &[MeshDraw],
        models: &HashMap<ModelId, RenderModel>,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, camera_bind_group, &[]);

        for (i, draw) in draws.iter().enumerate() {
            let Some(render_model) = models.get(&draw.model_id) else {
                continue;
            };

            let offset = (i as u64 * self.stride) as u32;
            render_pass.set_bind_group(1, &self.object_bind_group, &[offset]);
            render_model.draw(render_pass);
        }
    }
}
