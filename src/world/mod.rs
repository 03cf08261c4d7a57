mod contact_solver;
pub mod frame_allocator;
pub mod physics_world;
pub mod settings;

pub use crate::collision::BroadphaseKind;
pub use frame_allocator::FrameAllocator;
pub use physics_world::{ManifoldView, World};
pub use settings::WorldSettings;
