use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::math::Ray;

#[cfg(test)]
#[path = "camera_test.rs"]
mod tests;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, fov_y: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn get_vp_matrix(&self, resolution: Vec2) -> Mat4 {
        self.view_projection(resolution.x / resolution.y)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Ray from the eye through a point given in normalized device
    /// coordinates (x right, y up, both in [-1, 1]).
    pub fn screen_ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        let inverse = self.view_projection(aspect).inverse();
        let far_point = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(self.eye, far_point - self.eye)
    }
}

/// Converts a window-space cursor position into normalized device coordinates.
pub fn cursor_to_ndc(cursor: Vec2, resolution: Vec2) -> Vec2 {
    if resolution.x <= 0.0 || resolution.y <= 0.0 {
        return Vec2::ZERO;
    }

    Vec2::new(
        cursor.x / resolution.x * 2.0 - 1.0,
        -(cursor.y / resolution.y) * 2.0 + 1.0,
    )
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    light_direction: [f32; 4],
}

impl CameraUniform {
    pub fn update(&mut self, resolution: winit::dpi::PhysicalSize<u32>, camera: &Camera) {
        self.view_proj =
            camera.get_vp_matrix(Vec2::new(resolution.width as f32, resolution.height as f32));
        let light = Vec3::new(-5.0, -7.0, -5.0).normalize();
        self.light_direction = [light.x, light.y, light.z, 0.0];
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}
