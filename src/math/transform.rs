use super::vec2::Vec2;

/// Rigid 2D transform: a rotation about the local origin followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f64, // Angle in radians
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Creates a new transform.
    pub fn new(position: Vec2, rotation: f64) -> Self {
        Self { position, rotation }
    }

    /// Creates an identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self {
            position: Vec2::new(0.0, 0.0),
            rotation: 0.0,
        }
    }

    /// Creates a pure translation.
    pub fn from_position(position: Vec2) -> Self {
        Self { position, rotation: 0.0 }
    }

    /// Rotates a vector by this transform's rotation (no translation).
    pub fn apply_vector(self, v: Vec2) -> Vec2 {
        let cos_a = self.rotation.cos();
        let sin_a = self.rotation.sin();
        Vec2::new(v.x * cos_a - v.y * sin_a, v.x * sin_a + v.y * cos_a)
    }

    /// Rotates a vector by the inverse rotation.
    pub fn apply_vector_inverse(self, v: Vec2) -> Vec2 {
        let cos_a = self.rotation.cos();
        let sin_a = self.rotation.sin();
        Vec2::new(v.x * cos_a + v.y * sin_a, -v.x * sin_a + v.y * cos_a)
    }

    /// Applies the transform (rotation then translation) to a point.
    pub fn apply(self, point: Vec2) -> Vec2 {
        self.apply_vector(point) + self.position
    }

    /// Applies the inverse transform (inverse translation then inverse rotation) to a point.
    pub fn apply_inverse(self, point: Vec2) -> Vec2 {
        self.apply_vector_inverse(point - self.position)
    }

    /// Composition `self * other`: applying the result equals applying `other` then `self`.
    pub fn mul(self, other: Transform) -> Transform {
        Transform {
            position: self.apply(other.position),
            rotation: self.rotation + other.rotation,
        }
    }

    /// The transform that undoes `self`.
    pub fn inverse(self) -> Transform {
        Transform {
            position: -self.apply_vector_inverse(self.position),
            rotation: -self.rotation,
        }
    }

    /// Expresses `self` in the local frame of `frame`: maps points from this
    /// transform's local space into `frame`'s local space.
    pub fn relative_to(self, frame: Transform) -> Transform {
        frame.inverse().mul(self)
    }

    /// Moves the transform by a world-space offset.
    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }
}
