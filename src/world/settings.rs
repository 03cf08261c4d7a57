use crate::collision::{BroadphaseKind, ConvexSolverKind, NarrowPhaseSettings};
use crate::math::Vec2;

/// Tunables of a [`World`](super::World). Every field is public; start from
/// `WorldSettings::default()` and override what you need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSettings {
    pub gravity: Vec2,
    pub velocity_iterations: usize,
    pub position_iterations: usize,

    /// Fraction of the approach speed returned on impact.
    pub restitution: f64,
    /// Approach speeds below this do not bounce.
    pub restitution_threshold: f64,
    /// Coulomb friction coefficient.
    pub friction: f64,

    /// Penetration tolerated without positional correction.
    pub linear_slop: f64,
    /// Fraction of the remaining overlap removed per position iteration.
    pub baumgarte: f64,
    pub max_linear_correction: f64,

    pub contact_break_threshold: f64,
    pub feature_slop: f64,
    pub vertical_alignment: f64,
    pub vertical_bias: f64,

    pub convex_solver: ConvexSolverKind,
    pub broadphase: BroadphaseKind,
}

impl Default for WorldSettings {
    fn default() -> Self {
        let narrow = NarrowPhaseSettings::default();
        Self {
            gravity: Vec2::new(0.0, -9.8),
            velocity_iterations: 50,
            position_iterations: 10,
            restitution: 0.6,
            restitution_threshold: 1.0,
            friction: 0.5,
            linear_slop: 0.005,
            baumgarte: 0.2,
            max_linear_correction: 0.2,
            contact_break_threshold: narrow.contact_break_threshold,
            feature_slop: narrow.feature_slop,
            vertical_alignment: narrow.vertical_alignment,
            vertical_bias: narrow.vertical_bias,
            convex_solver: ConvexSolverKind::default(),
            broadphase: BroadphaseKind::default(),
        }
    }
}

impl WorldSettings {
    /// Broad-phase bounds are inflated by this much.
    pub fn aabb_margin(&self) -> f64 {
        self.contact_break_threshold + 0.5
    }

    /// The subset the collision pipeline works with. "Up" is taken opposite to
    /// gravity, or +y without gravity.
    pub fn narrow_phase(&self) -> NarrowPhaseSettings {
        NarrowPhaseSettings {
            contact_break_threshold: self.contact_break_threshold,
            feature_slop: self.feature_slop,
            up: (-self.gravity).normalize_or(Vec2::UP),
            vertical_alignment: self.vertical_alignment,
            vertical_bias: self.vertical_bias,
            convex_solver: self.convex_solver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = WorldSettings::default();
        assert_eq!(s.gravity, Vec2::new(0.0, -9.8));
        assert_eq!(s.velocity_iterations, 50);
        assert_eq!(s.position_iterations, 10);
        assert!((s.aabb_margin() - 0.505).abs() < 1e-12);
        assert_eq!(s.narrow_phase(), NarrowPhaseSettings::default());
    }

    #[test]
    fn test_up_follows_gravity() {
        let s = WorldSettings { gravity: Vec2::new(3.0, 0.0), ..Default::default() };
        assert_eq!(s.narrow_phase().up, Vec2::new(-1.0, 0.0));
        let s = WorldSettings { gravity: Vec2::ZERO, ..Default::default() };
        assert_eq!(s.narrow_phase().up, Vec2::UP);
    }
}
