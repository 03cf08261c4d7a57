use super::gjk::Gjk;
use super::mpr::Mpr;
use crate::math::{Transform, Vec2};
use crate::shapes::Shape;

/// Vertex of the Minkowski difference `A - B`, remembering where it came from.
///
/// Everything is expressed in A's local space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SupportPoint {
    /// `a - b`
    pub v: Vec2,
    /// Search direction that produced this point.
    pub dir: Vec2,
    /// Support point on A.
    pub a: Vec2,
    /// Support point on B, mapped into A's space.
    pub b: Vec2,
}

/// Two shapes viewed as their Minkowski difference, evaluated in A's local frame.
pub struct MinkowskiPair<'a> {
    pub shape_a: &'a Shape,
    pub shape_b: &'a Shape,
    /// Maps B-local points into A-local space.
    pub b_to_a: Transform,
    pub xform_a: Transform,
    pub xform_b: Transform,
}

impl<'a> MinkowskiPair<'a> {
    pub fn new(shape_a: &'a Shape, xform_a: Transform, shape_b: &'a Shape, xform_b: Transform) -> Self {
        Self {
            shape_a,
            shape_b,
            b_to_a: xform_b.relative_to(xform_a),
            xform_a,
            xform_b,
        }
    }

    pub fn support(&self, dir: Vec2) -> SupportPoint {
        let a = self.shape_a.support(dir);
        let b = self
            .b_to_a
            .apply(self.shape_b.support(self.b_to_a.apply_vector_inverse(-dir)));
        SupportPoint { v: a - b, dir, a, b }
    }

    /// Offset between the shape origins, a reasonable first search direction.
    pub fn initial_direction(&self) -> Vec2 {
        self.b_to_a.position.normalize_or(Vec2::X)
    }
}

/// Boolean overlap test on a Minkowski pair.
///
/// On overlap the solver returns a triangle of difference vertices enclosing the
/// origin (best effort if the iteration budget runs out), ready for contact expansion.
pub trait ConvexSolver {
    fn intersect(&self, pair: &MinkowskiPair) -> Option<[SupportPoint; 3]>;
}

/// Which [`ConvexSolver`] the narrow phase uses for the generic convex path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConvexSolverKind {
    #[default]
    Gjk,
    Mpr,
}

impl ConvexSolverKind {
    pub fn solver(self) -> &'static dyn ConvexSolver {
        match self {
            ConvexSolverKind::Gjk => &Gjk,
            ConvexSolverKind::Mpr => &Mpr,
        }
    }
}
