pub mod collide_object;
pub mod rigid_body;

pub use collide_object::CollideObject;
pub use rigid_body::{BodyInfo, MotionType, RigidBody};

slotmap::new_key_type! {
    /// Generation-checked handle to an object owned by the `World`.
    pub struct ObjectHandle;
}

/// Storage entry of the world: either a bare collider or a simulated body.
#[derive(Debug, Clone)]
pub enum PhyObject {
    Collider(CollideObject),
    Body(RigidBody),
}

impl PhyObject {
    pub fn collider(&self) -> &CollideObject {
        match self {
            PhyObject::Collider(c) => c,
            PhyObject::Body(b) => b.collider(),
        }
    }

    pub fn collider_mut(&mut self) -> &mut CollideObject {
        match self {
            PhyObject::Collider(c) => c,
            PhyObject::Body(b) => b.collider_mut(),
        }
    }

    pub fn as_body(&self) -> Option<&RigidBody> {
        match self {
            PhyObject::Body(b) => Some(b),
            PhyObject::Collider(_) => None,
        }
    }

    pub fn as_body_mut(&mut self) -> Option<&mut RigidBody> {
        match self {
            PhyObject::Body(b) => Some(b),
            PhyObject::Collider(_) => None,
        }
    }

    /// Motion type for pair filtering. Plain colliders never move on their own.
    pub fn motion_type(&self) -> Option<MotionType> {
        self.as_body().map(RigidBody::motion_type)
    }
}
