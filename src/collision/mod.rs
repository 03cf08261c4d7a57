pub mod aabb;
pub mod broadphase;
pub mod contact_manager;
pub mod detection;
pub mod dispatch;
pub mod epa;
pub mod gjk;
pub mod manager;
pub mod manifold;
pub mod minkowski;
pub mod mpr;
pub mod spatial_grid;

// Re-export key types
pub use aabb::AABB;
pub use broadphase::{Broadphase, BroadphaseKind, CollisionProxy, ProxyKey};
pub use contact_manager::{ContactManager, PairKey, ProxyPair};
pub use dispatch::{NarrowPhase, NarrowPhaseSettings};
pub use manager::CollisionManager;
pub use manifold::{CollisionResult, Contact, ContactManifold, ManifoldPoint, MAX_MANIFOLD_POINTS};
pub use minkowski::{ConvexSolver, ConvexSolverKind, MinkowskiPair};
pub use spatial_grid::SpatialGrid;
