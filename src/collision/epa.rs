use tinyvec::ArrayVec;

use super::manifold::Contact;
use super::minkowski::{MinkowskiPair, SupportPoint};
use crate::math::Vec2;

pub const MAX_ITERATIONS: usize = 20;
pub const TOLERANCE: f64 = 1e-4;

const POLYTOPE_CAPACITY: usize = 3 + MAX_ITERATIONS + 1;

/// Penetration found by expanding the polytope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    pub contact: Contact,
    /// Normal in A's local space.
    pub local_normal: Vec2,
}

struct ClosestEdge {
    index: usize,
    normal: Vec2,
    distance: f64,
}

fn closest_edge(polytope: &[SupportPoint]) -> Option<ClosestEdge> {
    let n = polytope.len();
    let mut best: Option<ClosestEdge> = None;
    for i in 0..n {
        let a = polytope[i].v;
        let b = polytope[(i + 1) % n].v;
        let e = b - a;
        if e.magnitude_squared() < 1e-20 {
            continue;
        }
        // Counter-clockwise winding: the outward normal is on the right.
        let normal = Vec2::new(e.y, -e.x).normalize();
        let distance = normal.dot(a);
        if best.as_ref().map_or(true, |edge| distance < edge.distance) {
            best = Some(ClosestEdge { index: i, normal, distance });
        }
    }
    best
}

/// Expands a simplex enclosing the origin into the penetration contact.
///
/// The contact points are rebuilt from the shape-local support points of the closest
/// edge, so they sit on the actual shapes rather than on the difference.
pub fn generate_contact(pair: &MinkowskiPair, simplex: [SupportPoint; 3]) -> Penetration {
    let mut polytope: ArrayVec<[SupportPoint; POLYTOPE_CAPACITY]> = ArrayVec::new();
    let [v0, mut v1, mut v2] = simplex;
    if (v1.v - v0.v).cross(v2.v - v0.v) < 0.0 {
        std::mem::swap(&mut v1, &mut v2);
    }
    polytope.push(v0);
    polytope.push(v1);
    polytope.push(v2);

    let mut edge = closest_edge(&polytope);
    for _ in 0..MAX_ITERATIONS {
        let Some(current) = edge.as_ref() else { break };
        let p = pair.support(current.normal);
        if p.v.dot(current.normal) - current.distance < TOLERANCE || polytope.len() == polytope.capacity() {
            break;
        }
        polytope.insert(current.index + 1, p);
        edge = closest_edge(&polytope);
    }

    let Some(edge) = edge else {
        // Every edge collapsed; report a touching contact at A's support.
        let a = pair.support(Vec2::X).a;
        let world = pair.xform_a.apply(a);
        return Penetration {
            contact: Contact {
                world_a: world,
                world_b: world,
                local_a: a,
                local_b: pair.xform_b.apply_inverse(world),
                normal: pair.xform_a.apply_vector(Vec2::X),
                depth: 0.0,
            },
            local_normal: Vec2::X,
        };
    };

    let n = polytope.len();
    let s0 = polytope[edge.index];
    let s1 = polytope[(edge.index + 1) % n];
    let e = s1.v - s0.v;
    let t = (-(s0.v.dot(e)) / e.magnitude_squared()).clamp(0.0, 1.0);

    let depth = edge.distance.max(0.0);
    let local_a = s0.a + (s1.a - s0.a) * t;
    let on_b = local_a - edge.normal * depth;
    let world_a = pair.xform_a.apply(local_a);
    let world_b = pair.xform_a.apply(on_b);

    Penetration {
        contact: Contact {
            world_a,
            world_b,
            local_a,
            local_b: pair.b_to_a.apply_inverse(on_b),
            normal: pair.xform_a.apply_vector(edge.normal),
            depth,
        },
        local_normal: edge.normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::gjk::Gjk;
    use crate::collision::minkowski::ConvexSolver;
    use crate::collision::mpr::Mpr;
    use crate::math::Transform;
    use crate::shapes::{Polygon, Shape};

    fn penetration(solver: &dyn ConvexSolver, a: &Shape, xa: Transform, b: &Shape, xb: Transform) -> Option<Penetration> {
        let pair = MinkowskiPair::new(a, xa, b, xb);
        solver.intersect(&pair).map(|simplex| generate_contact(&pair, simplex))
    }

    #[test]
    fn test_epa_box_overlap_depth() {
        let a = Shape::Polygon(Polygon::new(vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ]));
        let xb = Transform::from_position(Vec2::new(1.7, 0.2));
        for solver in [&Gjk as &dyn ConvexSolver, &Mpr] {
            let c = penetration(solver, &a, Transform::identity(), &a, xb).unwrap().contact;
            assert!((c.depth - 0.3).abs() < 1e-4, "depth {}", c.depth);
            assert!((c.normal - Vec2::new(1.0, 0.0)).magnitude() < 1e-4);
            // Points sit on the shape boundaries, separated along the normal by the depth
            assert!((c.world_a.x - 1.0).abs() < 1e-4);
            assert!((c.world_b.x - 0.7).abs() < 1e-4);
        }
    }

    #[test]
    fn test_epa_circle_distance() {
        let a = Shape::circle(1.0);
        let b = Shape::circle(0.5);
        let xb = Transform::from_position(Vec2::new(0.0, 1.3));
        for solver in [&Gjk as &dyn ConvexSolver, &Mpr] {
            let c = penetration(solver, &a, Transform::identity(), &b, xb).unwrap().contact;
            assert!((c.depth - 0.2).abs() < 1e-2, "depth {}", c.depth);
            assert!(c.normal.y > 0.99);
        }
    }

    #[test]
    fn test_epa_local_points_round_trip() {
        let a = Shape::Polygon(Polygon::regular(5, 1.0));
        let b = Shape::rect(0.6, 0.4);
        let xa = Transform::new(Vec2::new(0.3, -0.2), 0.7);
        let xb = Transform::new(Vec2::new(1.2, 0.4), -0.4);
        let p = penetration(&Gjk, &a, xa, &b, xb).expect("shapes overlap");
        let c = p.contact;
        assert!((xa.apply(c.local_a) - c.world_a).magnitude() < 1e-9);
        assert!((xb.apply(c.local_b) - c.world_b).magnitude() < 1e-9);
        assert!((xa.apply_vector(p.local_normal) - c.normal).magnitude() < 1e-9);
        assert!(c.depth >= 0.0);
    }

    #[test]
    fn test_epa_deep_circles() {
        let a = Shape::circle(1.0);
        for solver in [&Gjk as &dyn ConvexSolver, &Mpr] {
            for offset in [0.2, 0.5] {
                let xb = Transform::from_position(Vec2::new(offset, 0.0));
                let c = penetration(solver, &a, Transform::identity(), &a, xb).unwrap().contact;
                assert!((c.depth - (2.0 - offset)).abs() < 1e-2, "offset {}: depth {}", offset, c.depth);
                assert!(c.normal.x > 0.99, "offset {}: normal {:?}", offset, c.normal);
            }
        }
    }

    #[test]
    fn test_epa_deep_boxes_agree() {
        // Shallowest way out is along +x: 1.5 - 0.3
        let a = Shape::rect(1.0, 1.0);
        let b = Shape::rect(0.5, 0.5);
        let xb = Transform::from_position(Vec2::new(0.3, 0.1));
        for solver in [&Gjk as &dyn ConvexSolver, &Mpr] {
            let c = penetration(solver, &a, Transform::identity(), &b, xb).unwrap().contact;
            assert!((c.depth - 1.2).abs() < 1e-4, "depth {}", c.depth);
            assert!((c.normal - Vec2::X).magnitude() < 1e-4, "normal {:?}", c.normal);
        }
    }
}
