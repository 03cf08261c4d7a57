//! Closed-form narrow-phase tests for the shape pairs that have one.

use tinyvec::ArrayVec;

use super::dispatch::NarrowPhaseSettings;
use super::manifold::{CollisionResult, Contact, MAX_MANIFOLD_POINTS};
use crate::math::{Transform, Vec2};
use crate::shapes::{BoxShape, Circle};

/// Checks for collision between two circles.
///
/// Circles within the contact break threshold of each other still report a
/// (zero depth) contact so the manifold survives small separations.
pub fn check_circle_circle(
    circle_a: &Circle,
    xform_a: &Transform,
    circle_b: &Circle,
    xform_b: &Transform,
    settings: &NarrowPhaseSettings,
) -> Option<CollisionResult> {
    let dist_vec = xform_b.position - xform_a.position;
    let distance = dist_vec.magnitude();
    let radii_sum = circle_a.radius + circle_b.radius;

    if distance > radii_sum + settings.contact_break_threshold {
        return None;
    }

    // Concentric circles: any direction is as good as another
    let normal = if distance > 1e-10 { dist_vec * (1.0 / distance) } else { Vec2::X };

    let world_a = xform_a.position + normal * circle_a.radius;
    let world_b = xform_b.position - normal * circle_b.radius;
    let contact = Contact {
        world_a,
        world_b,
        local_a: xform_a.apply_inverse(world_a),
        local_b: xform_b.apply_inverse(world_b),
        normal,
        depth: (radii_sum - distance).max(0.0),
    };
    Some(CollisionResult::single(contact, xform_a.apply_vector_inverse(normal)))
}

/// Checks a box (A) against a circle (B) by classifying the circle center into one
/// of the nine Voronoi regions of the box.
pub fn check_box_circle(
    box_a: &BoxShape,
    xform_a: &Transform,
    circle_b: &Circle,
    xform_b: &Transform,
    settings: &NarrowPhaseSettings,
) -> Option<CollisionResult> {
    let he = box_a.half_extents;
    let radius = circle_b.radius;
    let center = xform_a.apply_inverse(xform_b.position);

    let region = |v: f64, h: f64| -> i8 {
        if v < -h {
            -1
        } else if v > h {
            1
        } else {
            0
        }
    };
    let rx = region(center.x, he.x);
    let ry = region(center.y, he.y);

    // Everything below is in box-local space.
    let (normal, depth, box_point) = match (rx, ry) {
        (0, 0) => {
            // Center inside the box: push out through the nearer face.
            let dx = he.x - center.x.abs();
            let dy = he.y - center.y.abs();
            if dx < dy {
                let sx = if center.x >= 0.0 { 1.0 } else { -1.0 };
                (Vec2::new(sx, 0.0), dx + radius, Vec2::new(sx * he.x, center.y))
            } else {
                let sy = if center.y >= 0.0 { 1.0 } else { -1.0 };
                (Vec2::new(0.0, sy), dy + radius, Vec2::new(center.x, sy * he.y))
            }
        }
        (sx, 0) => {
            let sx = f64::from(sx);
            let dist = center.x.abs() - he.x;
            if dist > radius + settings.contact_break_threshold {
                return None;
            }
            (Vec2::new(sx, 0.0), radius - dist, Vec2::new(sx * he.x, center.y))
        }
        (0, sy) => {
            let sy = f64::from(sy);
            let dist = center.y.abs() - he.y;
            if dist > radius + settings.contact_break_threshold {
                return None;
            }
            (Vec2::new(0.0, sy), radius - dist, Vec2::new(center.x, sy * he.y))
        }
        (sx, sy) => {
            let corner = Vec2::new(f64::from(sx) * he.x, f64::from(sy) * he.y);
            let offset = center - corner;
            let dist = offset.magnitude();
            if dist > radius + settings.contact_break_threshold {
                return None;
            }
            (offset.normalize_or(corner.normalize_or(Vec2::X)), radius - dist, corner)
        }
    };

    let world_normal = xform_a.apply_vector(normal);
    let world_a = xform_a.apply(box_point);
    let world_b = xform_b.position - world_normal * radius;
    let contact = Contact {
        world_a,
        world_b,
        local_a: box_point,
        local_b: xform_b.apply_inverse(world_b),
        normal: world_normal,
        depth: depth.max(0.0),
    };
    Some(CollisionResult::single(contact, normal))
}

/// Projected half-width of an oriented box onto `axis`.
fn project_radius(he: Vec2, xform: &Transform, axis: Vec2) -> f64 {
    let ux = xform.apply_vector(Vec2::X);
    let uy = xform.apply_vector(Vec2::UP);
    he.x * ux.dot(axis).abs() + he.y * uy.dot(axis).abs()
}

/// Slides `point` along the reference face until it lies within the face's extent.
fn clamp_to_face(ref_box: &BoxShape, ref_xform: &Transform, n_ref: Vec2, point: Vec2) -> Vec2 {
    let he = ref_box.half_extents;
    let local_normal = ref_xform.apply_vector_inverse(n_ref);
    let mut local = ref_xform.apply_inverse(point);
    if local_normal.x.abs() > local_normal.y.abs() {
        local.y = local.y.clamp(-he.y, he.y);
    } else {
        local.x = local.x.clamp(-he.x, he.x);
    }
    ref_xform.apply(local)
}

/// Box-box separating axis test producing up to two contact points.
///
/// Axes close to the vertical direction get their separation scaled down before the
/// reference axis is chosen, so resting stacks keep vertical normals. Points are
/// rebuilt every step and never keep impulses.
pub fn check_box_box(
    box_a: &BoxShape,
    xform_a: &Transform,
    box_b: &BoxShape,
    xform_b: &Transform,
    settings: &NarrowPhaseSettings,
) -> Option<CollisionResult> {
    let d = xform_b.position - xform_a.position;
    let axes = [
        (xform_a.apply_vector(Vec2::X), true),
        (xform_a.apply_vector(Vec2::UP), true),
        (xform_b.apply_vector(Vec2::X), false),
        (xform_b.apply_vector(Vec2::UP), false),
    ];

    let mut best: Option<(f64, f64, Vec2, f64, bool)> = None; // (biased, sep, axis, dist, on_a)
    for (axis, on_a) in axes {
        let ra = project_radius(box_a.half_extents, xform_a, axis);
        let rb = project_radius(box_b.half_extents, xform_b, axis);
        let dist = d.dot(axis);
        let separation = dist.abs() - (ra + rb);
        if separation > 0.0 {
            return None;
        }
        let biased = if axis.dot(settings.up).abs() > settings.vertical_alignment {
            separation * settings.vertical_bias
        } else {
            separation
        };
        // Strict comparison: on ties the earlier axis, i.e. box A, wins.
        if best.map_or(true, |(b, ..)| biased > b) {
            best = Some((biased, separation, axis, dist, on_a));
        }
    }
    let (_, separation, axis, dist, ref_is_a) = best?;
    let depth = -separation;

    // Reference normal points from the reference box towards the incident box.
    let sign = if dist >= 0.0 { 1.0 } else { -1.0 };
    let n_ref = if ref_is_a { axis * sign } else { axis * -sign };
    let (ref_box, ref_xform, inc_box, inc_xform) = if ref_is_a {
        (box_a, xform_a, box_b, xform_b)
    } else {
        (box_b, xform_b, box_a, xform_a)
    };

    // Incident corners reaching deepest into the reference box.
    let mut corners = inc_box.corners().map(|c| {
        let p = inc_xform.apply(c);
        (p, p.dot(-n_ref))
    });
    corners.sort_by(|a, b| b.1.total_cmp(&a.1));
    let max_proj = corners[0].1;

    let normal = if ref_is_a { n_ref } else { -n_ref };
    let mut contacts: ArrayVec<[Contact; MAX_MANIFOLD_POINTS]> = ArrayVec::new();
    for &(incident_point, proj) in corners.iter().take(2) {
        if proj < max_proj - settings.feature_slop {
            break;
        }
        let incident_point = clamp_to_face(ref_box, ref_xform, n_ref, incident_point);
        let ref_point = incident_point + n_ref * depth;
        let (world_a, world_b) = if ref_is_a {
            (ref_point, incident_point)
        } else {
            (incident_point, ref_point)
        };
        contacts.push(Contact {
            world_a,
            world_b,
            local_a: xform_a.apply_inverse(world_a),
            local_b: xform_b.apply_inverse(world_b),
            normal,
            depth,
        });
    }

    Some(CollisionResult {
        contacts,
        normal,
        local_normal: ref_xform.apply_vector_inverse(n_ref),
        ref_is_a,
        persistent: false,
    })
}
