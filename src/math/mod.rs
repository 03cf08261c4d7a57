pub mod vec2;
pub mod transform;

pub use transform::Transform;
pub use vec2::Vec2;
