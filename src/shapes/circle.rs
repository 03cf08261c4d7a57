use std::f64::consts::PI;

use super::MassProperties;
use crate::collision::AABB;
use crate::math::{Transform, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub radius: f64,
}

impl Circle {
    pub fn new(radius: f64) -> Self {
        assert!(radius >= 0.0, "Circle radius cannot be negative");
        Self { radius }
    }

    pub fn support(&self, dir: Vec2) -> Vec2 {
        dir.normalize_or(Vec2::X) * self.radius
    }

    pub fn compute_aabb(&self, xform: &Transform) -> AABB {
        let radius_vec = Vec2::new(self.radius, self.radius);
        AABB::new(xform.position - radius_vec, xform.position + radius_vec)
    }

    pub fn compute_mass(&self, density: f64) -> MassProperties {
        let mass = density * PI * self.radius * self.radius;
        MassProperties {
            mass,
            inertia: 0.5 * mass * self.radius * self.radius,
            centroid: Vec2::ZERO,
        }
    }
}
