pub mod math;
pub mod shapes;
pub mod objects;
pub mod collision;
pub mod integration;
pub mod world;
pub mod common;

// Re-export key types for easier use
pub use math::vec2::Vec2;
pub use math::transform::Transform;
pub use shapes::{BoxShape, Circle, MassProperties, Polygon, Shape, ShapeType};
pub use objects::{BodyInfo, CollideObject, MotionType, ObjectHandle, RigidBody};
pub use collision::{ContactManifold, ConvexSolverKind, ManifoldPoint, AABB};
pub use world::{BroadphaseKind, ManifoldView, World, WorldSettings};
pub use common::{PhysicsError, Result};
