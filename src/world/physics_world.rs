use std::rc::Rc;

use slotmap::SlotMap;
use tracing::{debug, trace};

use super::contact_solver;
use super::frame_allocator::FrameAllocator;
use super::settings::WorldSettings;
use crate::collision::{CollisionManager, ContactManifold};
use crate::common::{PhysicsError, Result};
use crate::integration::integrator;
use crate::math::{Transform, Vec2};
use crate::objects::{BodyInfo, CollideObject, MotionType, ObjectHandle, PhyObject, RigidBody};
use crate::shapes::Shape;

/// Read access to an active contact manifold after a step.
#[derive(Debug, Clone, Copy)]
pub struct ManifoldView<'a> {
    /// The two objects in contact; the manifold normal points from the first to the second.
    pub objects: [ObjectHandle; 2],
    pub manifold: &'a ContactManifold,
}

impl ManifoldView<'_> {
    /// True on the step the contact began, for impact effects.
    pub fn is_new(&self) -> bool {
        self.manifold.is_new()
    }
}

/// Owns every object and runs the simulation step.
pub struct World {
    settings: WorldSettings,
    objects: SlotMap<ObjectHandle, PhyObject>,
    collision: CollisionManager,
    frame: FrameAllocator,
}

impl World {
    /// Creates a new, empty world.
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            collision: CollisionManager::new(settings.broadphase, settings.aabb_margin()),
            settings,
            objects: SlotMap::with_key(),
            frame: FrameAllocator::new(),
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.settings.gravity = gravity;
    }

    /// Adds a non-simulated collider. It takes part in the broad phase but never
    /// produces solver contacts.
    pub fn create_collide_object(&mut self, shape: Rc<Shape>, transform: Transform) -> Result<ObjectHandle> {
        if !shape.is_convex() {
            return Err(PhysicsError::NonConvexShape);
        }
        let handle = self.insert(PhyObject::Collider(CollideObject::new(shape, transform)));
        debug!(?handle, "collide object created");
        Ok(handle)
    }

    pub fn destroy_collide_object(&mut self, handle: ObjectHandle) -> Result<()> {
        match self.objects.get(handle) {
            None => Err(PhysicsError::UnknownObject(handle)),
            Some(PhyObject::Body(_)) => Err(PhysicsError::WrongObjectKind { handle, expected: "collide object" }),
            Some(PhyObject::Collider(_)) => {
                self.remove(handle);
                debug!(?handle, "collide object destroyed");
                Ok(())
            }
        }
    }

    /// Adds a simulated body. Mass properties come from the shape and `info.density`.
    pub fn create_rigid_body(&mut self, shape: Rc<Shape>, info: &BodyInfo) -> Result<ObjectHandle> {
        if !shape.is_convex() {
            return Err(PhysicsError::NonConvexShape);
        }
        if !(info.density.is_finite() && info.density >= 0.0) {
            return Err(PhysicsError::InvalidDensity(info.density));
        }
        let handle = self.insert(PhyObject::Body(RigidBody::new(shape, info)));
        debug!(?handle, motion_type = ?info.motion_type, "rigid body created");
        Ok(handle)
    }

    pub fn destroy_rigid_body(&mut self, handle: ObjectHandle) -> Result<()> {
        match self.objects.get(handle) {
            None => Err(PhysicsError::UnknownObject(handle)),
            Some(PhyObject::Collider(_)) => Err(PhysicsError::WrongObjectKind { handle, expected: "rigid body" }),
            Some(PhyObject::Body(_)) => {
                self.remove(handle);
                debug!(?handle, "rigid body destroyed");
                Ok(())
            }
        }
    }

    fn insert(&mut self, object: PhyObject) -> ObjectHandle {
        let handle = self.objects.insert(object);
        let collider = self.objects[handle].collider_mut();
        self.collision.register(handle, collider);
        handle
    }

    /// Deregisters from the broad phase before dropping the object.
    fn remove(&mut self, handle: ObjectHandle) {
        if let Some(object) = self.objects.get_mut(handle) {
            self.collision.unregister(object.collider_mut());
        }
        self.objects.remove(handle);
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.objects.contains_key(handle)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of broad-phase pairs, active or not.
    pub fn pair_count(&self) -> usize {
        self.collision.contacts().len()
    }

    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.objects.keys()
    }

    /// The collider of any object, body or not.
    pub fn collide_object(&self, handle: ObjectHandle) -> Result<&CollideObject> {
        self.objects
            .get(handle)
            .map(PhyObject::collider)
            .ok_or(PhysicsError::UnknownObject(handle))
    }

    pub fn body(&self, handle: ObjectHandle) -> Result<&RigidBody> {
        match self.objects.get(handle) {
            None => Err(PhysicsError::UnknownObject(handle)),
            Some(object) => object
                .as_body()
                .ok_or(PhysicsError::WrongObjectKind { handle, expected: "rigid body" }),
        }
    }

    pub fn body_mut(&mut self, handle: ObjectHandle) -> Result<&mut RigidBody> {
        match self.objects.get_mut(handle) {
            None => Err(PhysicsError::UnknownObject(handle)),
            Some(object) => object
                .as_body_mut()
                .ok_or(PhysicsError::WrongObjectKind { handle, expected: "rigid body" }),
        }
    }

    /// Teleports any object. For bodies the center of mass follows.
    pub fn set_transform(&mut self, handle: ObjectHandle, transform: Transform) -> Result<()> {
        match self.objects.get_mut(handle) {
            None => return Err(PhysicsError::UnknownObject(handle)),
            Some(PhyObject::Body(body)) => body.set_transform(transform),
            Some(PhyObject::Collider(collider)) => collider.set_transform(transform),
        }
        Ok(())
    }

    /// Manifolds that were active at the end of the last step.
    pub fn active_manifolds(&self) -> impl Iterator<Item = ManifoldView<'_>> + '_ {
        self.frame.active_pairs().iter().filter_map(move |&key| {
            let pair = self.collision.pair(key)?;
            pair.manifold.is_active().then_some(ManifoldView {
                objects: pair.objects,
                manifold: &pair.manifold,
            })
        })
    }

    /// Advances the simulation by `dt` seconds. Does nothing for `dt <= 0`.
    pub fn simulate(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }

        // 1. Collision detection
        self.frame.reset();
        let narrow_phase = self.settings.narrow_phase();
        self.collision.process(&self.objects, &narrow_phase, &mut self.frame.active_pairs);

        // 2. Gravity, queued impulses and damping
        let gravity = self.settings.gravity;
        for object in self.objects.values_mut() {
            let PhyObject::Body(body) = object else { continue };
            if body.motion_type() == MotionType::Dynamic {
                body.apply_impulse(gravity * (body.mass() * dt));
                body.apply_accumulated_impulses();
                body.apply_damping();
            } else {
                body.clear_impulses();
            }
        }

        // 3. Contacts: velocities
        contact_solver::order_manifolds(&self.objects, &self.collision, &mut self.frame);
        let pairs = &self.frame.active_pairs;
        contact_solver::warm_start(&mut self.objects, &mut self.collision, pairs, &self.settings);
        for _ in 0..self.settings.velocity_iterations {
            contact_solver::solve_velocities(&mut self.objects, &mut self.collision, pairs, &self.settings);
        }

        // 4. Integrate motion
        for object in self.objects.values_mut() {
            if let PhyObject::Body(body) = object {
                integrator::integrate(body, dt);
            }
        }

        // 5. Contacts: positions
        let mut position_iterations = 0;
        for _ in 0..self.settings.position_iterations {
            position_iterations += 1;
            if contact_solver::solve_positions(&mut self.objects, &mut self.collision, pairs, &self.settings) {
                break;
            }
        }

        trace!(
            objects = self.objects.len(),
            contacts = pairs.len(),
            position_iterations,
            "step finished"
        );
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{BroadphaseKind, AABB};
    const EPSILON: f64 = 1e-9;

    fn circle(radius: f64) -> Rc<Shape> {
        Rc::new(Shape::circle(radius))
    }

    fn at(x: f64, y: f64) -> BodyInfo {
        BodyInfo { transform: Transform::from_position(Vec2::new(x, y)), ..Default::default() }
    }

    #[test]
    fn test_world_new() {
        let world = World::default();
        assert_eq!(world.object_count(), 0);
        assert_eq!(world.pair_count(), 0);
        assert_eq!(world.settings().gravity, Vec2::new(0.0, -9.8));
        assert_eq!(world.active_manifolds().count(), 0);
    }

    #[test]
    fn test_create_and_destroy_objects() {
        let mut world = World::default();
        let body = world.create_rigid_body(circle(1.0), &at(0.0, 0.0)).unwrap();
        let collider = world.create_collide_object(circle(1.0), Transform::identity()).unwrap();
        assert_eq!(world.object_count(), 2);
        assert!(world.collide_object(body).map_or(false, CollideObject::is_registered));

        assert_eq!(
            world.destroy_rigid_body(collider),
            Err(PhysicsError::WrongObjectKind { handle: collider, expected: "rigid body" })
        );
        assert_eq!(
            world.destroy_collide_object(body),
            Err(PhysicsError::WrongObjectKind { handle: body, expected: "collide object" })
        );

        assert_eq!(world.destroy_collide_object(collider), Ok(()));
        assert_eq!(world.destroy_rigid_body(body), Ok(()));
        assert_eq!(world.object_count(), 0);
        assert_eq!(world.collision.broadphase().len(), 0);

        // Stale handles are rejected, not reused.
        assert_eq!(world.destroy_rigid_body(body), Err(PhysicsError::UnknownObject(body)));
        assert!(world.body(body).is_err());
    }

    #[test]
    fn test_invalid_density_rejected() {
        let mut world = World::default();
        let info = BodyInfo { density: -1.0, ..Default::default() };
        assert_eq!(world.create_rigid_body(circle(1.0), &info), Err(PhysicsError::InvalidDensity(-1.0)));
        let info = BodyInfo { density: f64::NAN, ..Default::default() };
        assert!(world.create_rigid_body(circle(1.0), &info).is_err());
        assert_eq!(world.object_count(), 0);
    }

    #[test]
    fn test_destroy_drops_pairs() {
        let mut world = World::default();
        let a = world.create_rigid_body(circle(1.0), &at(0.0, 0.0)).unwrap();
        world.create_rigid_body(circle(1.0), &at(1.5, 0.0)).unwrap();
        world.simulate(1.0 / 60.0);
        assert_eq!(world.pair_count(), 1);
        assert_eq!(world.active_manifolds().count(), 1);

        assert!(world.destroy_rigid_body(a).is_ok());
        assert_eq!(world.pair_count(), 0);
        assert_eq!(world.active_manifolds().count(), 0);
    }

    #[test]
    fn test_free_fall() {
        let mut world = World::default();
        let h = world.create_rigid_body(circle(1.0), &at(0.0, 10.0)).unwrap();
        let dt = 0.1;
        world.simulate(dt);

        let body = world.body(h).unwrap();
        assert!((body.linear_velocity.y - -0.98).abs() < EPSILON);
        assert!((body.transform().position.y - (10.0 - 0.098)).abs() < EPSILON);
        assert!(body.linear_velocity.x.abs() < EPSILON);
    }

    #[test]
    fn test_static_and_kinematic_ignore_gravity() {
        let mut world = World::default();
        let static_info = BodyInfo { motion_type: MotionType::Static, ..at(0.0, 0.0) };
        let kinematic_info = BodyInfo { motion_type: MotionType::Kinematic, ..at(5.0, 0.0) };
        let s = world.create_rigid_body(circle(1.0), &static_info).unwrap();
        let k = world.create_rigid_body(circle(1.0), &kinematic_info).unwrap();
        if let Ok(body) = world.body_mut(k) {
            body.linear_velocity = Vec2::new(1.0, 0.0);
            body.apply_impulse(Vec2::new(0.0, 100.0));
        }

        world.simulate(0.5);
        assert_eq!(world.body(s).map(|b| b.transform().position), Ok(Vec2::ZERO));
        let kinematic = world.body(k).unwrap();
        assert!((kinematic.transform().position - Vec2::new(5.5, 0.0)).magnitude() < EPSILON);
        assert_eq!(kinematic.linear_velocity, Vec2::new(1.0, 0.0));
        assert_eq!(kinematic.pending_impulse(), (Vec2::ZERO, 0.0));
    }

    #[test]
    fn test_unusable_grid_falls_back_to_brute_force() {
        let settings = WorldSettings {
            gravity: Vec2::ZERO,
            broadphase: BroadphaseKind::Grid {
                bounds: AABB::new(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0)),
                cell_size: 0.0,
            },
            ..Default::default()
        };
        let mut world = World::new(settings);
        world.create_rigid_body(circle(1.0), &at(0.0, 0.0)).unwrap();
        world.create_rigid_body(circle(1.0), &at(1.5, 0.0)).unwrap();
        world.simulate(1.0 / 60.0);
        assert_eq!(world.active_manifolds().count(), 1);
    }

    #[test]
    fn test_damping_scales_velocity_once_per_step() {
        let mut world = World::new(WorldSettings { gravity: Vec2::ZERO, ..Default::default() });
        let info = BodyInfo { linear_damping: 1.0, angular_damping: 3.0, ..at(0.0, 0.0) };
        let h = world.create_rigid_body(circle(1.0), &info).unwrap();
        {
            let body = world.body_mut(h).unwrap();
            body.linear_velocity = Vec2::new(4.0, 0.0);
            body.angular_velocity = 2.0;
        }

        // The factor does not depend on dt
        world.simulate(1.0 / 60.0);
        let body = world.body(h).unwrap();
        assert!((body.linear_velocity.x - 2.0).abs() < EPSILON);
        assert!((body.angular_velocity - 0.5).abs() < EPSILON);

        world.simulate(1.0 / 120.0);
        let body = world.body(h).unwrap();
        assert!((body.linear_velocity.x - 1.0).abs() < EPSILON);
        assert!((body.angular_velocity - 0.125).abs() < EPSILON);
    }

    #[test]
    fn test_damping_applies_after_gravity() {
        let mut world = World::default();
        let info = BodyInfo { linear_damping: 1.0, ..at(0.0, 0.0) };
        let h = world.create_rigid_body(circle(1.0), &info).unwrap();
        world.simulate(0.1);
        let v = world.body(h).unwrap().linear_velocity;
        assert!((v.y - -0.98 * 0.5).abs() < EPSILON, "{:?}", v);
    }

    #[test]
    fn test_queued_impulse_applied_once() {
        let mut world = World::new(WorldSettings { gravity: Vec2::ZERO, ..Default::default() });
        let h = world.create_rigid_body(circle(1.0), &at(0.0, 0.0)).unwrap();
        let mass = world.body(h).map(RigidBody::mass).unwrap();
        if let Ok(body) = world.body_mut(h) {
            body.apply_impulse(Vec2::new(mass * 2.0, 0.0));
        }
        world.simulate(0.1);
        world.simulate(0.1);
        let body = world.body(h).unwrap();
        assert!((body.linear_velocity.x - 2.0).abs() < EPSILON);
        assert!((body.transform().position.x - 0.4).abs() < EPSILON);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut world = World::default();
        let h = world.create_rigid_body(circle(1.0), &at(0.0, 3.0)).unwrap();
        world.simulate(0.0);
        world.simulate(-1.0);
        let body = world.body(h).unwrap();
        assert_eq!(body.transform().position, Vec2::new(0.0, 3.0));
        assert_eq!(body.linear_velocity, Vec2::ZERO);
        assert_eq!(world.pair_count(), 0);
    }

    #[test]
    fn test_collider_never_produces_manifolds() {
        let mut world = World::default();
        world
            .create_collide_object(Rc::new(Shape::rect(5.0, 0.5)), Transform::identity())
            .unwrap();
        let ball = world.create_rigid_body(circle(0.5), &at(0.0, 0.8)).unwrap();
        world.simulate(1.0 / 60.0);
        assert_eq!(world.pair_count(), 1);
        assert_eq!(world.active_manifolds().count(), 0);
        // The ball falls straight through.
        let y = world.body(ball).map(|b| b.transform().position.y).unwrap();
        assert!(y < 0.8);
    }

    #[test]
    fn test_new_contact_flag() {
        let mut world = World::new(WorldSettings { gravity: Vec2::ZERO, ..Default::default() });
        world.create_rigid_body(circle(1.0), &at(0.0, 0.0)).unwrap();
        world.create_rigid_body(circle(1.0), &at(1.999, 0.0)).unwrap();

        world.simulate(1.0 / 60.0);
        let views: Vec<_> = world.active_manifolds().collect();
        assert_eq!(views.len(), 1);
        assert!(views[0].is_new());

        world.simulate(1.0 / 60.0);
        assert!(world.active_manifolds().all(|v| !v.is_new()));
    }

    #[test]
    fn test_set_transform_moves_collider() {
        let mut world = World::default();
        let h = world
            .create_collide_object(circle(1.0), Transform::identity())
            .unwrap();
        let target = Transform::new(Vec2::new(2.0, -1.0), 0.5);
        assert!(world.set_transform(h, target).is_ok());
        assert_eq!(world.collide_object(h).map(CollideObject::transform), Ok(target));
    }
}
