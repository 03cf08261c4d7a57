use super::gjk::enclose_origin;
use super::minkowski::{ConvexSolver, MinkowskiPair, SupportPoint};
use crate::math::Vec2;

pub const MAX_ITERATIONS: usize = 20;
const PORTAL_TOLERANCE: f64 = 1e-6;

/// Minkowski Portal Refinement overlap test.
///
/// Starts from a point inside the difference and refines a portal (v1, v2) that the
/// ray from that point to the origin passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mpr;

/// Averages the four axis supports; the result lies inside the difference.
fn interior_point(pair: &MinkowskiPair) -> SupportPoint {
    let dirs = [Vec2::X, -Vec2::X, Vec2::UP, -Vec2::UP];
    let mut center = SupportPoint::default();
    for dir in dirs {
        let s = pair.support(dir);
        center.v += s.v * 0.25;
        center.a += s.a * 0.25;
        center.b += s.b * 0.25;
    }
    if center.v.magnitude_squared() < 1e-20 {
        // The ray to the origin needs a direction.
        let nudge = Vec2::new(1e-5, 0.0);
        center.v += nudge;
        center.a += nudge;
    }
    center
}

/// `n` flipped if needed so that it points to the side of `target`.
fn towards(n: Vec2, target: Vec2) -> Vec2 {
    if n.dot(target) < 0.0 {
        -n
    } else {
        n
    }
}

/// Which side of the line `v0 -> p` the point `q` is on.
fn side(v0: Vec2, p: Vec2, q: Vec2) -> f64 {
    (p - v0).cross(q - v0)
}

/// Next wedge edge after `v1`: the extreme point perpendicular to `v1 - v0`, on the
/// origin's side.
fn wedge_vertex(pair: &MinkowskiPair, v0: &SupportPoint, v1: &SupportPoint) -> Option<SupportPoint> {
    let n = towards((v1.v - v0.v).perpendicular(), -v0.v).normalize_or(Vec2::UP);
    let v2 = pair.support(n);
    if v2.v.dot(n) < 0.0 {
        None
    } else {
        Some(v2)
    }
}

/// Finds a wedge (v0, v1, v2) holding the ray from `v0` through the origin.
fn discover_portal(pair: &MinkowskiPair, v0: &SupportPoint) -> Option<(SupportPoint, SupportPoint)> {
    let ray = (-v0.v).normalize_or(Vec2::X);
    let mut v1 = pair.support(ray);
    if v1.v.dot(ray) <= 0.0 {
        return None;
    }
    let mut v2 = wedge_vertex(pair, v0, &v1)?;

    for _ in 0..MAX_ITERATIONS {
        if (v2.v - v1.v).magnitude_squared() < 1e-20 {
            // Flat on the origin's side: at most touching.
            return None;
        }
        if side(v0.v, v2.v, Vec2::ZERO) * side(v0.v, v2.v, v1.v) >= 0.0 {
            return Some((v1, v2));
        }
        // The origin is past v2; rotate the wedge towards it.
        v1 = v2;
        v2 = wedge_vertex(pair, v0, &v1)?;
    }
    None
}

impl ConvexSolver for Mpr {
    fn intersect(&self, pair: &MinkowskiPair) -> Option<[SupportPoint; 3]> {
        let v0 = interior_point(pair);
        let (mut v1, mut v2) = discover_portal(pair, &v0)?;

        let mut n = Vec2::X;
        let mut hit = false;
        for _ in 0..MAX_ITERATIONS {
            // Portal normal, facing away from the interior point.
            n = towards((v2.v - v1.v).perpendicular(), v1.v - v0.v).normalize_or(Vec2::X);
            if n.dot(v1.v) >= 0.0 {
                // Origin is on the interior side of the portal.
                hit = true;
                break;
            }

            let v3 = pair.support(n);
            if v3.v.dot(n) < 0.0 || (v3.v - v1.v).dot(n) < PORTAL_TOLERANCE {
                // Nothing beyond the portal reaches the origin.
                return None;
            }

            // Keep whichever half of the wedge still holds the origin ray.
            if side(v0.v, v3.v, Vec2::ZERO) * side(v0.v, v3.v, v1.v) >= 0.0 {
                v2 = v3;
            } else {
                v1 = v3;
            }
        }
        if !hit {
            return Some([v0, v1, v2]);
        }

        // v0 is inside the difference, not on its boundary. Close the portal on the
        // interior side with real support points so the contact expansion starts from
        // the boundary.
        Some(enclose_origin(pair, v1, v2, -n).unwrap_or([v0, v1, v2]))
    }
}
