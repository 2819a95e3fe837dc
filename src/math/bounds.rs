use glam::{Mat4, Vec3};

use crate::math::ray::Ray;

#[cfg(test)]
#[path = "bounds_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(point1: Vec3, point2: Vec3) -> Aabb {
        let min = point1.min(point2);
        let max = point1.max(point2);
        Aabb { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Aabb {
        Aabb::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Aabb> {
        let mut points = points.into_iter();
        let first = points.next()?;

        Some(points.fold(Aabb { min: first, max: first }, |bounds, point| Aabb {
            min: bounds.min.min(point),
            max: bounds.max.max(point),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Axis-aligned box enclosing this box after `matrix` is applied.
    pub fn transform(&self, matrix: &Mat4) -> Aabb {
        let [first, rest @ ..] = self
            .corners()
            .map(|corner| matrix.transform_point3(corner));

        rest.into_iter().fold(Aabb { min: first, max: first }, |bounds, corner| Aabb {
            min: bounds.min.min(corner),
            max: bounds.max.max(corner),
        })
    }

    pub fn translate(&self, delta: Vec3) -> Aabb {
        Aabb {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Pulls every face inward by `margin`. An axis thinner than twice the
    /// margin collapses onto the centre instead of inverting.
    pub fn shrink(&self, margin: f32) -> Aabb {
        let center = self.center();
        Aabb {
            min: (self.min + Vec3::splat(margin)).min(center),
            max: (self.max - Vec3::splat(margin)).max(center),
        }
    }

    /// Touching faces count as overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Slab test. Returns the distance along the ray to the entry point, or 0
    /// when the ray starts inside the box.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inverse = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inverse;
        let t2 = (self.max - ray.origin) * inverse;

        let t_near = t1.min(t2).max_element().max(0.0);
        let t_far = t1.max(t2).min_element();

        if t_far < t_near {
            return None;
        }

        Some(t_near)
    }
}
