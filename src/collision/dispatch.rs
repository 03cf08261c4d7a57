use super::detection::{check_box_box, check_box_circle, check_circle_circle};
use super::epa::generate_contact;
use super::manifold::CollisionResult;
use super::minkowski::{ConvexSolverKind, MinkowskiPair};
use crate::math::{Transform, Vec2};
use crate::shapes::{Shape, ShapeType};

/// Tunables the narrow phase needs, derived from the world settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrowPhaseSettings {
    /// Separation below which a contact is still reported.
    pub contact_break_threshold: f64,
    /// Box-box: incident corners this close to the deepest one also become points.
    pub feature_slop: f64,
    /// Direction opposite to gravity.
    pub up: Vec2,
    /// Box-box: axes with `|axis . up|` above this count as vertical.
    pub vertical_alignment: f64,
    /// Box-box: factor applied to the separation of vertical axes.
    pub vertical_bias: f64,
    pub convex_solver: ConvexSolverKind,
}

impl Default for NarrowPhaseSettings {
    fn default() -> Self {
        Self {
            contact_break_threshold: 0.005,
            feature_slop: 0.04,
            up: Vec2::UP,
            vertical_alignment: 0.98,
            vertical_bias: 0.80,
            convex_solver: ConvexSolverKind::Gjk,
        }
    }
}

/// Collision routine chosen for a pair of shape types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    CircleCircle,
    BoxCircle,
    BoxBox,
    Convex,
}

const TABLE_SIZE: usize = ShapeType::COUNT * (ShapeType::COUNT + 1) / 2;

/// Slot of the unordered type pair `(a, b)` with `a >= b`.
fn table_index(a: ShapeType, b: ShapeType) -> usize {
    let (a, b) = (a.index(), b.index());
    debug_assert!(a >= b);
    a * (a + 1) / 2 + b
}

/// Dispatches shape pairs to their collision routine.
///
/// The table is keyed by unordered type pairs, stored with the higher type first.
/// Pairs arriving in the other order are swapped and their result flipped back.
#[derive(Debug, Clone)]
pub struct NarrowPhase {
    table: [Algorithm; TABLE_SIZE],
}

impl Default for NarrowPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrowPhase {
    pub fn new() -> Self {
        let mut table = [Algorithm::Convex; TABLE_SIZE];
        table[table_index(ShapeType::Circle, ShapeType::Circle)] = Algorithm::CircleCircle;
        table[table_index(ShapeType::Box, ShapeType::Circle)] = Algorithm::BoxCircle;
        table[table_index(ShapeType::Box, ShapeType::Box)] = Algorithm::BoxBox;
        Self { table }
    }

    pub fn algorithm(&self, a: ShapeType, b: ShapeType) -> Algorithm {
        let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
        self.table[table_index(hi, lo)]
    }

    /// Runs the pair test. The result's normal points from A to B.
    pub fn collide(
        &self,
        shape_a: &Shape,
        xform_a: &Transform,
        shape_b: &Shape,
        xform_b: &Transform,
        settings: &NarrowPhaseSettings,
    ) -> Option<CollisionResult> {
        if shape_a.shape_type() < shape_b.shape_type() {
            let mut result = self.collide_ordered(shape_b, xform_b, shape_a, xform_a, settings)?;
            result.flip();
            return Some(result);
        }
        self.collide_ordered(shape_a, xform_a, shape_b, xform_b, settings)
    }

    fn collide_ordered(
        &self,
        shape_a: &Shape,
        xform_a: &Transform,
        shape_b: &Shape,
        xform_b: &Transform,
        settings: &NarrowPhaseSettings,
    ) -> Option<CollisionResult> {
        let algorithm = self.table[table_index(shape_a.shape_type(), shape_b.shape_type())];
        match (algorithm, shape_a, shape_b) {
            (Algorithm::CircleCircle, Shape::Circle(a), Shape::Circle(b)) => {
                check_circle_circle(a, xform_a, b, xform_b, settings)
            }
            (Algorithm::BoxCircle, Shape::Box(a), Shape::Circle(b)) => {
                check_box_circle(a, xform_a, b, xform_b, settings)
            }
            (Algorithm::BoxBox, Shape::Box(a), Shape::Box(b)) => {
                check_box_box(a, xform_a, b, xform_b, settings)
            }
            _ => collide_convex(shape_a, xform_a, shape_b, xform_b, settings),
        }
    }
}

/// Generic path for any two convex shapes.
pub fn collide_convex(
    shape_a: &Shape,
    xform_a: &Transform,
    shape_b: &Shape,
    xform_b: &Transform,
    settings: &NarrowPhaseSettings,
) -> Option<CollisionResult> {
    let pair = MinkowskiPair::new(shape_a, *xform_a, shape_b, *xform_b);
    let simplex = settings.convex_solver.solver().intersect(&pair)?;
    let penetration = generate_contact(&pair, simplex);
    Some(CollisionResult::single(penetration.contact, penetration.local_normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Polygon;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_table_layout() {
        assert_eq!(TABLE_SIZE, 6);
        let mut seen = [false; TABLE_SIZE];
        let types = [ShapeType::Circle, ShapeType::Box, ShapeType::Polygon];
        for &a in &types {
            for &b in &types {
                if a >= b {
                    let i = table_index(a, b);
                    assert!(!seen[i], "slot {} used twice", i);
                    seen[i] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_algorithm_lookup_is_symmetric() {
        let np = NarrowPhase::new();
        assert_eq!(np.algorithm(ShapeType::Circle, ShapeType::Box), Algorithm::BoxCircle);
        assert_eq!(np.algorithm(ShapeType::Box, ShapeType::Circle), Algorithm::BoxCircle);
        assert_eq!(np.algorithm(ShapeType::Box, ShapeType::Box), Algorithm::BoxBox);
        assert_eq!(np.algorithm(ShapeType::Polygon, ShapeType::Circle), Algorithm::Convex);
        assert_eq!(np.algorithm(ShapeType::Polygon, ShapeType::Polygon), Algorithm::Convex);
    }

    #[test]
    fn test_swapped_operands_flip_result() {
        let np = NarrowPhase::new();
        let settings = NarrowPhaseSettings::default();
        let circle = Shape::circle(0.5);
        let boxed = Shape::rect(1.0, 1.0);
        let xc = Transform::from_position(Vec2::new(0.0, 1.4));
        let xb = Transform::identity();

        // Circle first: the box is B and the normal points from the circle down to the box.
        let result = np.collide(&circle, &xc, &boxed, &xb, &settings);
        assert!(result.is_some());
        let result = result.unwrap();
        assert!((result.normal - Vec2::new(0.0, -1.0)).magnitude() < EPSILON);
        assert!(!result.ref_is_a);
        let c = result.contacts[0];
        assert!((c.depth - 0.1).abs() < EPSILON);
        // world_a lies on the circle, world_b on the box
        assert!((c.world_a - Vec2::new(0.0, 0.9)).magnitude() < EPSILON);
        assert!((c.world_b - Vec2::new(0.0, 1.0)).magnitude() < EPSILON);
        assert!((c.normal - result.normal).magnitude() < EPSILON);
    }

    #[test]
    fn test_polygon_pairs_use_convex_path() {
        let np = NarrowPhase::new();
        let settings = NarrowPhaseSettings::default();
        let tri = Shape::Polygon(Polygon::new(vec![
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ]));
        let boxed = Shape::rect(2.0, 0.5);
        let xt = Transform::from_position(Vec2::new(0.0, 0.4));
        let xb = Transform::identity();

        for (a, xa, b, xbb, expected) in [
            (&tri, &xt, &boxed, &xb, Vec2::new(0.0, -1.0)),
            (&boxed, &xb, &tri, &xt, Vec2::new(0.0, 1.0)),
        ] {
            let result = np.collide(a, xa, b, xbb, &settings).unwrap();
            assert_eq!(result.contacts.len(), 1);
            assert!((result.normal - expected).magnitude() < 1e-4, "{:?}", result.normal);
            assert!((result.contacts[0].depth - 0.1).abs() < 1e-4);
        }
    }

    #[test]
    fn test_convex_path_with_mpr() {
        let settings = NarrowPhaseSettings {
            convex_solver: ConvexSolverKind::Mpr,
            ..Default::default()
        };
        let a = Shape::rect(1.0, 1.0);
        let b = Shape::rect(1.0, 1.0);
        let xb = Transform::from_position(Vec2::new(0.0, 1.9));
        let result = collide_convex(&a, &Transform::identity(), &b, &xb, &settings).unwrap();
        assert!((result.contacts[0].depth - 0.1).abs() < 1e-4);
        assert!((result.normal - Vec2::new(0.0, 1.0)).magnitude() < 1e-4);
    }
}
