use std::rc::Rc;

use super::CollideObject;
use crate::math::{Transform, Vec2};
use crate::shapes::Shape;

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotionType {
    /// Never moves; infinite mass.
    Static,
    /// Moves with its own velocity but is not pushed by contacts or gravity.
    Kinematic,
    #[default]
    Dynamic,
}

impl MotionType {
    /// Static and kinematic bodies have infinite mass in the solver.
    pub fn is_immovable(self) -> bool {
        !matches!(self, MotionType::Dynamic)
    }
}

/// Creation parameters for a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyInfo {
    pub density: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub motion_type: MotionType,
    /// Initial placement of the shape origin.
    pub transform: Transform,
}

impl Default for BodyInfo {
    fn default() -> Self {
        Self {
            density: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            motion_type: MotionType::Dynamic,
            transform: Transform::identity(),
        }
    }
}

/// A collider that is driven by the solver.
///
/// `center` is the world position of the center of mass. The collider's transform
/// places the shape origin, so the two are kept in step by [`RigidBody::sync_transform`].
#[derive(Debug, Clone)]
pub struct RigidBody {
    collider: CollideObject,
    motion_type: MotionType,
    density: f64,

    mass: f64,
    inv_mass: f64,
    inertia: f64,
    inv_inertia: f64,
    local_center: Vec2,
    center: Vec2,

    pub linear_velocity: Vec2,
    pub angular_velocity: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,

    // Impulses accumulated since the last step; consumed by `apply_accumulated_impulses`.
    linear_impulse: Vec2,
    angular_impulse: f64,
}

impl RigidBody {
    pub(crate) fn new(shape: Rc<Shape>, info: &BodyInfo) -> Self {
        let mut body = Self {
            collider: CollideObject::new(shape, info.transform),
            motion_type: info.motion_type,
            density: info.density,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            local_center: Vec2::ZERO,
            center: info.transform.position,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: info.linear_damping,
            angular_damping: info.angular_damping,
            linear_impulse: Vec2::ZERO,
            angular_impulse: 0.0,
        };
        body.update_mass();
        body
    }

    /// Recomputes mass properties from the shape, density and motion type.
    fn update_mass(&mut self) {
        let props = self.collider.shape().compute_mass(self.density);
        self.local_center = props.centroid;

        if self.motion_type.is_immovable() || props.mass <= 0.0 {
            self.mass = 0.0;
            self.inv_mass = 0.0;
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        } else {
            self.mass = props.mass;
            self.inv_mass = 1.0 / props.mass;
            self.inertia = props.inertia;
            self.inv_inertia = if props.inertia > 0.0 { 1.0 / props.inertia } else { 0.0 };
        }

        self.center = self.collider.transform().apply(self.local_center);
    }

    pub fn collider(&self) -> &CollideObject {
        &self.collider
    }

    pub(crate) fn collider_mut(&mut self) -> &mut CollideObject {
        &mut self.collider
    }

    pub fn shape(&self) -> &Shape {
        self.collider.shape()
    }

    pub fn transform(&self) -> Transform {
        self.collider.transform()
    }

    pub fn rotation(&self) -> f64 {
        self.collider.rotation()
    }

    /// Places the shape origin; the center of mass follows.
    pub fn set_transform(&mut self, transform: Transform) {
        self.collider.set_transform(transform);
        self.center = transform.apply(self.local_center);
    }

    pub fn motion_type(&self) -> MotionType {
        self.motion_type
    }

    pub fn set_motion_type(&mut self, motion_type: MotionType) {
        if self.motion_type == motion_type {
            return;
        }
        self.motion_type = motion_type;
        if motion_type == MotionType::Static {
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
        }
        self.update_mass();
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    pub fn local_center(&self) -> Vec2 {
        self.local_center
    }

    /// World position of the center of mass.
    pub fn world_center(&self) -> Vec2 {
        self.center
    }

    /// Velocity of a world-space point rigidly attached to the body.
    pub fn velocity_at_point(&self, point: Vec2) -> Vec2 {
        self.linear_velocity + (point - self.center).cross_scalar(self.angular_velocity)
    }

    /// Queues a linear impulse through the center of mass; applied at the next step.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.linear_impulse += impulse;
    }

    pub fn apply_angular_impulse(&mut self, impulse: f64) {
        self.angular_impulse += impulse;
    }

    /// Queues an impulse at a world-space point, producing both a linear and an angular part.
    pub fn apply_impulse_at_point(&mut self, impulse: Vec2, point: Vec2) {
        self.linear_impulse += impulse;
        self.angular_impulse += (point - self.center).cross(impulse);
    }

    pub fn pending_impulse(&self) -> (Vec2, f64) {
        (self.linear_impulse, self.angular_impulse)
    }

    /// Turns the accumulated impulses into velocity and clears them.
    pub(crate) fn apply_accumulated_impulses(&mut self) {
        self.linear_velocity += self.linear_impulse * self.inv_mass;
        self.angular_velocity += self.angular_impulse * self.inv_inertia;
        self.clear_impulses();
    }

    pub(crate) fn clear_impulses(&mut self) {
        self.linear_impulse = Vec2::ZERO;
        self.angular_impulse = 0.0;
    }

    /// Per-step damping: `v *= 1 / (1 + damping)`.
    pub(crate) fn apply_damping(&mut self) {
        self.linear_velocity *= 1.0 / (1.0 + self.linear_damping);
        self.angular_velocity *= 1.0 / (1.0 + self.angular_damping);
    }

    /// Moves the center of mass and rotation, then re-derives the shape transform.
    pub(crate) fn set_center_and_rotation(&mut self, center: Vec2, rotation: f64) {
        self.center = center;
        let mut xform = self.collider.transform();
        xform.rotation = rotation;
        self.collider.set_transform(xform);
        self.sync_transform();
    }

    /// Places the shape origin so that the local center of mass lands on `center`.
    pub(crate) fn sync_transform(&mut self) {
        let mut xform = self.collider.transform();
        xform.position = self.center - self.local_center.rotate(xform.rotation);
        self.collider.set_transform(xform);
    }
}
