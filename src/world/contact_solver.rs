//! Sequential-impulse contact solver.
//!
//! Contact anchors are stored in each body's local space and rebuilt from the
//! current transforms whenever they are needed, so the solver keeps working as the
//! position iterations move the bodies.

use slotmap::SlotMap;

use super::frame_allocator::FrameAllocator;
use super::settings::WorldSettings;
use crate::collision::{CollisionManager, ContactManifold, ManifoldPoint, PairKey};
use crate::math::Vec2;
use crate::objects::{ObjectHandle, PhyObject, RigidBody};
use crate::shapes::Shape;

type Objects = SlotMap<ObjectHandle, PhyObject>;

fn bodies_mut(objects: &mut Objects, [a, b]: [ObjectHandle; 2]) -> Option<(&mut RigidBody, &mut RigidBody)> {
    match objects.get_disjoint_mut([a, b]) {
        Some([PhyObject::Body(a), PhyObject::Body(b)]) => Some((a, b)),
        _ => None,
    }
}

/// World-space anchors of a point and the contact point between them.
struct Anchors {
    world_a: Vec2,
    world_b: Vec2,
    r_a: Vec2,
    r_b: Vec2,
}

fn anchors(point: &ManifoldPoint, a: &RigidBody, b: &RigidBody) -> Anchors {
    let world_a = a.transform().apply(point.local_a);
    let world_b = b.transform().apply(point.local_b);
    let cp = (world_a + world_b) * 0.5;
    Anchors {
        world_a,
        world_b,
        r_a: cp - a.world_center(),
        r_b: cp - b.world_center(),
    }
}

fn relative_velocity(a: &RigidBody, b: &RigidBody, r_a: Vec2, r_b: Vec2) -> Vec2 {
    b.linear_velocity + r_b.cross_scalar(b.angular_velocity)
        - a.linear_velocity
        - r_a.cross_scalar(a.angular_velocity)
}

fn effective_mass(a: &RigidBody, b: &RigidBody, r_a: Vec2, r_b: Vec2, dir: Vec2) -> f64 {
    let rn_a = r_a.cross(dir);
    let rn_b = r_b.cross(dir);
    a.inv_mass() + b.inv_mass() + a.inv_inertia() * rn_a * rn_a + b.inv_inertia() * rn_b * rn_b
}

fn apply_velocity_impulse(a: &mut RigidBody, b: &mut RigidBody, r_a: Vec2, r_b: Vec2, impulse: Vec2) {
    a.linear_velocity -= impulse * a.inv_mass();
    a.angular_velocity -= a.inv_inertia() * r_a.cross(impulse);
    b.linear_velocity += impulse * b.inv_mass();
    b.angular_velocity += b.inv_inertia() * r_b.cross(impulse);
}

fn tangent(normal: Vec2) -> Vec2 {
    Vec2::new(normal.y, -normal.x)
}

/// Puts manifolds between two dynamic bodies first and those touching a static or
/// kinematic body last, keeping the detection order otherwise.
pub(crate) fn order_manifolds(objects: &Objects, collision: &CollisionManager, frame: &mut FrameAllocator) {
    frame.order_keys.clear();
    for (i, &key) in frame.active_pairs.iter().enumerate() {
        let touches_immovable = collision.pair(key).map_or(true, |pair| {
            pair.objects.iter().any(|&h| {
                objects
                    .get(h)
                    .and_then(PhyObject::motion_type)
                    .map_or(true, |m| m.is_immovable())
            })
        });
        frame.order_keys.push((touches_immovable, i));
    }
    frame.order_keys.sort_unstable();

    frame.sorted_pairs.clear();
    frame.sorted_pairs.extend(frame.order_keys.iter().map(|&(_, i)| frame.active_pairs[i]));
    std::mem::swap(&mut frame.active_pairs, &mut frame.sorted_pairs);
}

/// Computes the restitution bias of each manifold and applies last step's impulses.
pub(crate) fn warm_start(objects: &mut Objects, collision: &mut CollisionManager, pairs: &[PairKey], settings: &WorldSettings) {
    for &key in pairs {
        let Some(pair) = collision.pair_mut(key) else { continue };
        let Some((a, b)) = bodies_mut(objects, pair.objects) else { continue };
        let manifold = &mut pair.manifold;
        let normal = manifold.normal;
        let t = tangent(normal);

        if let Some(first) = manifold.points().first() {
            let an = anchors(first, a, b);
            let vrel = relative_velocity(a, b, an.r_a, an.r_b).dot(normal);
            manifold.velocity_bias = if vrel < -settings.restitution_threshold {
                -settings.restitution * vrel
            } else {
                0.0
            };
        }

        for point in manifold.points() {
            let an = anchors(point, a, b);
            let impulse = normal * point.normal_impulse + t * point.tangent_impulse;
            apply_velocity_impulse(a, b, an.r_a, an.r_b, impulse);
        }
    }
}

/// One velocity iteration over every manifold: friction, then the non-penetration
/// impulse with its accumulated value kept non-negative.
pub(crate) fn solve_velocities(objects: &mut Objects, collision: &mut CollisionManager, pairs: &[PairKey], settings: &WorldSettings) {
    for &key in pairs {
        let Some(pair) = collision.pair_mut(key) else { continue };
        let Some((a, b)) = bodies_mut(objects, pair.objects) else { continue };
        solve_manifold_velocity(&mut pair.manifold, a, b, settings.friction);
    }
}

fn solve_manifold_velocity(manifold: &mut ContactManifold, a: &mut RigidBody, b: &mut RigidBody, friction: f64) {
    let normal = manifold.normal;
    let t = tangent(normal);
    let bias = manifold.velocity_bias;

    for point in manifold.points_mut() {
        let an = anchors(point, a, b);

        let mt = effective_mass(a, b, an.r_a, an.r_b, t);
        if mt > 0.0 {
            let vt = relative_velocity(a, b, an.r_a, an.r_b).dot(t);
            let max_friction = friction * point.normal_impulse;
            let accumulated = (point.tangent_impulse - vt / mt).clamp(-max_friction, max_friction);
            let lambda = accumulated - point.tangent_impulse;
            point.tangent_impulse = accumulated;
            apply_velocity_impulse(a, b, an.r_a, an.r_b, t * lambda);
        }

        let mn = effective_mass(a, b, an.r_a, an.r_b, normal);
        if mn > 0.0 {
            let vn = relative_velocity(a, b, an.r_a, an.r_b).dot(normal);
            let accumulated = (point.normal_impulse + (bias - vn) / mn).max(0.0);
            let lambda = accumulated - point.normal_impulse;
            point.normal_impulse = accumulated;
            apply_velocity_impulse(a, b, an.r_a, an.r_b, normal * lambda);
        }
    }
}

/// One position iteration, walking the manifolds in reverse order. Returns `true`
/// once every point is within three times the linear slop.
pub(crate) fn solve_positions(objects: &mut Objects, collision: &mut CollisionManager, pairs: &[PairKey], settings: &WorldSettings) -> bool {
    let mut min_separation = 0.0_f64;
    for &key in pairs.iter().rev() {
        let Some(pair) = collision.pair_mut(key) else { continue };
        let Some((a, b)) = bodies_mut(objects, pair.objects) else { continue };
        let separation = solve_manifold_position(&pair.manifold, a, b, settings);
        min_separation = min_separation.min(separation);
    }
    min_separation >= -3.0 * settings.linear_slop
}

fn solve_manifold_position(manifold: &ContactManifold, a: &mut RigidBody, b: &mut RigidBody, settings: &WorldSettings) -> f64 {
    let mut min_separation = 0.0_f64;
    for point in manifold.points() {
        let (normal, world_a, world_b) = match (a.shape(), b.shape()) {
            (Shape::Circle(ca), Shape::Circle(cb)) => {
                // Round shapes: the normal follows the centers.
                let (center_a, center_b) = (a.world_center(), b.world_center());
                let n = (center_b - center_a).normalize_or(manifold.normal);
                (n, center_a + n * ca.radius, center_b - n * cb.radius)
            }
            _ => {
                let an = anchors(point, a, b);
                let n = if manifold.ref_is_a {
                    a.transform().apply_vector(manifold.local_normal)
                } else {
                    -b.transform().apply_vector(manifold.local_normal)
                };
                (n, an.world_a, an.world_b)
            }
        };

        let separation = normal.dot(world_b - world_a);
        min_separation = min_separation.min(separation);

        let correction = (settings.baumgarte * (separation + settings.linear_slop))
            .clamp(-settings.max_linear_correction, 0.0);
        let cp = (world_a + world_b) * 0.5;
        let r_a = cp - a.world_center();
        let r_b = cp - b.world_center();
        let k = effective_mass(a, b, r_a, r_b, normal);
        if k <= 0.0 {
            continue;
        }
        let impulse = normal * (-correction / k);

        let center_a = a.world_center() - impulse * a.inv_mass();
        let rotation_a = a.rotation() - a.inv_inertia() * r_a.cross(impulse);
        a.set_center_and_rotation(center_a, rotation_a);
        let center_b = b.world_center() + impulse * b.inv_mass();
        let rotation_b = b.rotation() + b.inv_inertia() * r_b.cross(impulse);
        b.set_center_and_rotation(center_b, rotation_b);
    }
    min_separation
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::collision::{BroadphaseKind, NarrowPhaseSettings};
    use crate::math::Transform;
    use crate::objects::{BodyInfo, MotionType};

    struct Scene {
        objects: Objects,
        collision: CollisionManager,
        frame: FrameAllocator,
        settings: WorldSettings,
    }

    impl Scene {
        fn new() -> Self {
            let settings = WorldSettings::default();
            Self {
                objects: SlotMap::with_key(),
                collision: CollisionManager::new(BroadphaseKind::BruteForce, settings.aabb_margin()),
                frame: FrameAllocator::new(),
                settings,
            }
        }

        fn body(&mut self, shape: Shape, position: Vec2, motion_type: MotionType) -> ObjectHandle {
            let info = BodyInfo { motion_type, transform: Transform::from_position(position), ..Default::default() };
            let handle = self.objects.insert(PhyObject::Body(RigidBody::new(Rc::new(shape), &info)));
            let collider = self.objects[handle].collider_mut();
            self.collision.register(handle, collider);
            handle
        }

        fn detect(&mut self) {
            self.frame.reset();
            let narrow: NarrowPhaseSettings = self.settings.narrow_phase();
            self.collision.process(&self.objects, &narrow, &mut self.frame.active_pairs);
            order_manifolds(&self.objects, &self.collision, &mut self.frame);
        }

        fn velocity(&mut self, handle: ObjectHandle) -> Vec2 {
            self.objects[handle].as_body().unwrap().linear_velocity
        }

        fn set_velocity(&mut self, handle: ObjectHandle, v: Vec2) {
            if let Some(body) = self.objects[handle].as_body_mut() {
                body.linear_velocity = v;
            }
        }
    }

    #[test]
    fn test_order_puts_static_contacts_last() {
        let mut s = Scene::new();
        s.body(Shape::rect(10.0, 0.5), Vec2::ZERO, MotionType::Static);
        s.body(Shape::circle(0.5), Vec2::new(-5.0, 0.9), MotionType::Dynamic);
        let c = s.body(Shape::circle(0.5), Vec2::new(3.0, 2.0), MotionType::Dynamic);
        let d = s.body(Shape::circle(0.5), Vec2::new(3.0, 2.9), MotionType::Dynamic);
        s.detect();

        assert_eq!(s.frame.active_pairs().len(), 2);
        let first = s.collision.pair(s.frame.active_pairs()[0]).map(|p| p.objects);
        let mut first = first.expect("pair exists");
        first.sort();
        let mut expected = [c, d];
        expected.sort();
        assert_eq!(first, expected);
    }

    #[test]
    fn test_head_on_circles_exchange_momentum() {
        let mut s = Scene::new();
        let a = s.body(Shape::circle(1.0), Vec2::ZERO, MotionType::Dynamic);
        let b = s.body(Shape::circle(1.0), Vec2::new(1.999, 0.0), MotionType::Dynamic);
        s.set_velocity(a, Vec2::new(2.0, 0.0));
        s.set_velocity(b, Vec2::new(-2.0, 0.0));
        s.detect();

        let pairs = s.frame.active_pairs.clone();
        warm_start(&mut s.objects, &mut s.collision, &pairs, &s.settings);
        for _ in 0..s.settings.velocity_iterations {
            solve_velocities(&mut s.objects, &mut s.collision, &pairs, &s.settings);
        }

        // Approach speed 4 bounces back at 0.6 * 4, shared equally.
        let (va, vb) = (s.velocity(a), s.velocity(b));
        assert!((va.x - -1.2).abs() < 1e-6, "va = {:?}", va);
        assert!((vb.x - 1.2).abs() < 1e-6, "vb = {:?}", vb);
        let manifold = s.collision.pair(pairs[0]).map(|p| p.manifold.clone()).unwrap();
        assert!(manifold.points().iter().all(|p| p.normal_impulse >= 0.0));
    }

    #[test]
    fn test_slow_contact_does_not_bounce() {
        let mut s = Scene::new();
        s.body(Shape::rect(5.0, 0.5), Vec2::ZERO, MotionType::Static);
        let ball = s.body(Shape::circle(0.5), Vec2::new(0.0, 0.999), MotionType::Dynamic);
        s.set_velocity(ball, Vec2::new(0.0, -0.5));
        s.detect();

        let pairs = s.frame.active_pairs.clone();
        warm_start(&mut s.objects, &mut s.collision, &pairs, &s.settings);
        for _ in 0..s.settings.velocity_iterations {
            solve_velocities(&mut s.objects, &mut s.collision, &pairs, &s.settings);
        }
        assert!(s.velocity(ball).y.abs() < 1e-9);
        let bias = s.collision.pair(pairs[0]).map(|p| p.manifold.velocity_bias);
        assert_eq!(bias, Some(0.0));
    }

    #[test]
    fn test_friction_is_bounded_by_normal_impulse() {
        let mut s = Scene::new();
        s.body(Shape::rect(5.0, 0.5), Vec2::ZERO, MotionType::Static);
        let block = s.body(Shape::rect(0.5, 0.5), Vec2::new(0.0, 0.99), MotionType::Dynamic);
        s.set_velocity(block, Vec2::new(3.0, -0.5));
        s.detect();

        let pairs = s.frame.active_pairs.clone();
        warm_start(&mut s.objects, &mut s.collision, &pairs, &s.settings);
        for _ in 0..s.settings.velocity_iterations {
            solve_velocities(&mut s.objects, &mut s.collision, &pairs, &s.settings);
        }
        let manifold = s.collision.pair(pairs[0]).map(|p| p.manifold.clone()).unwrap();
        for p in manifold.points() {
            assert!(p.tangent_impulse.abs() <= s.settings.friction * p.normal_impulse + 1e-4);
        }
        // Sliding slowed down but not reversed.
        let v = s.velocity(block);
        assert!(v.x < 3.0 && v.x >= 0.0, "v = {:?}", v);
    }

    #[test]
    fn test_position_iterations_push_apart() {
        let mut s = Scene::new();
        s.body(Shape::rect(5.0, 0.5), Vec2::ZERO, MotionType::Static);
        let block = s.body(Shape::rect(0.5, 0.5), Vec2::new(0.0, 0.8), MotionType::Dynamic);
        s.detect();

        let pairs = s.frame.active_pairs.clone();
        let mut converged = false;
        for _ in 0..50 {
            if solve_positions(&mut s.objects, &mut s.collision, &pairs, &s.settings) {
                converged = true;
                break;
            }
        }
        assert!(converged);
        let y = s.objects[block].collider().position().y;
        // Overlap is within three times the slop after convergence
        assert!(y > 1.0 - 3.0 * s.settings.linear_slop - 1e-4, "y = {}", y);
        assert!(y < 1.0, "y = {}", y);
    }
}
