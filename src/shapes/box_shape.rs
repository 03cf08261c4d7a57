use super::MassProperties;
use crate::collision::AABB;
use crate::math::{Transform, Vec2};

/// Oriented rectangle centered on its local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    pub half_extents: Vec2,
}

impl BoxShape {
    pub fn new(half_extents: Vec2) -> Self {
        assert!(
            half_extents.x >= 0.0 && half_extents.y >= 0.0,
            "Box half extents cannot be negative"
        );
        Self { half_extents }
    }

    pub fn support(&self, dir: Vec2) -> Vec2 {
        let he = self.half_extents;
        Vec2::new(
            if dir.x >= 0.0 { he.x } else { -he.x },
            if dir.y >= 0.0 { he.y } else { -he.y },
        )
    }

    /// Corners in counter-clockwise order, local space.
    pub fn corners(&self) -> [Vec2; 4] {
        let he = self.half_extents;
        [
            Vec2::new(-he.x, -he.y),
            Vec2::new(he.x, -he.y),
            Vec2::new(he.x, he.y),
            Vec2::new(-he.x, he.y),
        ]
    }

    pub fn compute_aabb(&self, xform: &Transform) -> AABB {
        // Extent of a rotated box along each world axis.
        let ax = xform.apply_vector(Vec2::new(self.half_extents.x, 0.0)).abs();
        let ay = xform.apply_vector(Vec2::new(0.0, self.half_extents.y)).abs();
        let extent = ax + ay;
        AABB::new(xform.position - extent, xform.position + extent)
    }

    pub fn compute_mass(&self, density: f64) -> MassProperties {
        let w = 2.0 * self.half_extents.x;
        let h = 2.0 * self.half_extents.y;
        let mass = density * w * h;
        MassProperties {
            mass,
            inertia: mass * (w * w + h * h) / 12.0,
            centroid: Vec2::ZERO,
        }
    }
}
