pub mod circle;
pub mod box_shape;
pub mod polygon;

// Re-export the specific shape types
pub use circle::Circle;
pub use box_shape::BoxShape;
pub use polygon::Polygon;

use crate::collision::AABB;
use crate::math::{Transform, Vec2};

/// Discriminant used by the narrow-phase dispatch table.
/// The numeric values index the table, so they must stay dense and start at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeType {
    Circle = 0,
    Box = 1,
    Polygon = 2,
}

impl ShapeType {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Mass, rotational inertia about the centroid, and the centroid in shape-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassProperties {
    pub mass: f64,
    pub inertia: f64,
    pub centroid: Vec2,
}

/// Convex collision geometry. Immutable once built; bodies share it through `Rc<Shape>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Box(BoxShape),
    Polygon(Polygon),
}

impl Shape {
    pub fn circle(radius: f64) -> Self {
        Shape::Circle(Circle::new(radius))
    }

    pub fn rect(half_width: f64, half_height: f64) -> Self {
        Shape::Box(BoxShape::new(Vec2::new(half_width, half_height)))
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle(_) => ShapeType::Circle,
            Shape::Box(_) => ShapeType::Box,
            Shape::Polygon(_) => ShapeType::Polygon,
        }
    }

    pub fn is_convex(&self) -> bool {
        match self {
            Shape::Circle(_) | Shape::Box(_) => true,
            Shape::Polygon(polygon) => polygon.is_convex(),
        }
    }

    /// Farthest point of the shape along `dir`, in shape-local space.
    pub fn support(&self, dir: Vec2) -> Vec2 {
        match self {
            Shape::Circle(circle) => circle.support(dir),
            Shape::Box(b) => b.support(dir),
            Shape::Polygon(polygon) => polygon.support(dir),
        }
    }

    /// World-space bounding box of the shape placed at `xform`.
    pub fn compute_aabb(&self, xform: &Transform) -> AABB {
        match self {
            Shape::Circle(circle) => circle.compute_aabb(xform),
            Shape::Box(b) => b.compute_aabb(xform),
            Shape::Polygon(polygon) => polygon.compute_aabb(xform),
        }
    }

    pub fn compute_mass(&self, density: f64) -> MassProperties {
        match self {
            Shape::Circle(circle) => circle.compute_mass(density),
            Shape::Box(b) => b.compute_mass(density),
            Shape::Polygon(polygon) => polygon.compute_mass(density),
        }
    }
}
