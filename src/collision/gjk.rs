use super::minkowski::{ConvexSolver, MinkowskiPair, SupportPoint};
use crate::math::Vec2;

pub const MAX_ITERATIONS: usize = 20;

/// Gilbert-Johnson-Keerthi overlap test.
///
/// Grows a simplex towards the origin using triple-product half-plane tests. Fails
/// as soon as a support step cannot pass the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gjk;

impl ConvexSolver for Gjk {
    fn intersect(&self, pair: &MinkowskiPair) -> Option<[SupportPoint; 3]> {
        let mut dir = pair.initial_direction();
        let first = pair.support(dir);
        dir = -first.v;
        if dir.magnitude_squared() < 1e-20 {
            // The first vertex is the origin itself; keep searching the other way.
            dir = -first.dir;
        }
        let second = pair.support(dir.normalize_or(Vec2::X));
        if second.v.dot(dir) < 0.0 {
            return None;
        }

        let ab = first.v - second.v;
        let ao = -second.v;
        dir = Vec2::triple_product(ab, ao, ab);
        if dir.magnitude_squared() < 1e-20 {
            // Origin lies on the segment (or the segment collapsed); close the simplex
            // sideways, picking the side that has volume.
            dir = ab.perpendicular().normalize_or(Vec2::UP);
            let side = pair.support(dir);
            if side.v.dot(dir) <= 1e-12 {
                dir = -dir;
            }
        }
        enclose_origin(pair, first, second, dir)
    }
}

/// Closes the segment `(p0, p1)` into a triangle of difference vertices around the
/// origin, searching from the segment along `dir`.
///
/// `p0` is the older vertex and `p1` the newer one; `dir` must point from the segment
/// towards the origin. Returns `None` once a support step cannot pass the origin.
pub(crate) fn enclose_origin(
    pair: &MinkowskiPair,
    mut p0: SupportPoint,
    mut p1: SupportPoint,
    mut dir: Vec2,
) -> Option<[SupportPoint; 3]> {
    let mut last = p1;
    for _ in 0..MAX_ITERATIONS {
        dir = dir.normalize_or(Vec2::X);
        let a = pair.support(dir);
        if a.v.dot(dir) < 0.0 {
            return None;
        }
        last = a;

        let ao = -a.v;
        let ab = p1.v - a.v;
        let ac = p0.v - a.v;
        let ab_perp = Vec2::triple_product(ac, ab, ab);
        let ac_perp = Vec2::triple_product(ab, ac, ac);

        if ab_perp.dot(ao) > 0.0 {
            // Origin beyond edge (a, p1): drop p0
            p0 = p1;
            p1 = a;
            dir = ab_perp;
        } else if ac_perp.dot(ao) > 0.0 {
            // Origin beyond edge (a, p0): drop p1
            p1 = a;
            dir = ac_perp;
        } else {
            return Some([p0, p1, a]);
        }
    }
    Some([p0, p1, last])
}
