use std::rc::Rc;

use crate::collision::broadphase::ProxyKey;
use crate::collision::AABB;
use crate::math::{Transform, Vec2};
use crate::shapes::Shape;

/// A shape placed in the world. Takes part in the broad phase; on its own it is
/// never simulated.
#[derive(Debug, Clone)]
pub struct CollideObject {
    shape: Rc<Shape>,
    transform: Transform,
    pub(crate) proxy: Option<ProxyKey>,
}

impl CollideObject {
    pub(crate) fn new(shape: Rc<Shape>, transform: Transform) -> Self {
        Self {
            shape,
            transform,
            proxy: None,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_rc(&self) -> &Rc<Shape> {
        &self.shape
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    pub fn rotation(&self) -> f64 {
        self.transform.rotation
    }

    pub(crate) fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn is_registered(&self) -> bool {
        self.proxy.is_some()
    }

    pub fn compute_aabb(&self) -> AABB {
        self.shape.compute_aabb(&self.transform)
    }
}
