use glam::Vec3;

use crate::math::ray::Ray;

#[cfg(test)]
#[path = "plane_test.rs"]
mod tests;

/// Plane in Hessian normal form: `normal · p + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// The horizontal plane through the origin that drag gestures slide along.
    pub const GROUND: Plane = Plane {
        normal: Vec3::Y,
        d: 0.0,
    };

    pub fn signed_distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Returns the point where `ray` crosses the plane, or `None` when the ray
    /// runs parallel to it or points away from it.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Vec3> {
        let denominator = self.normal.dot(ray.direction);

        if denominator.abs() < f32::EPSILON {
            return None;
        }

        let t = -self.signed_distance_to_point(ray.origin) / denominator;

        if t < 0.0 {
            return None;
        }

        Some(ray.at(t))
    }
}
