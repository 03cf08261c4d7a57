use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Point or direction in the plane. Also used for linear velocities and impulses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    pub const X: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar 2D cross product, the z component of the 3D one.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// `w x r` for an angular velocity `w` and offset `self`: the tangential velocity
    /// of that point.
    pub fn cross_scalar(self, w: f64) -> Self {
        Self::new(-w * self.y, w * self.x)
    }

    /// `(a x b) x c` expanded for 2D: `b * (a.c) - a * (b.c)`.
    ///
    /// `triple_product(ab, ao, ab)` is the component of `ao` perpendicular to `ab`,
    /// which is how the simplex solvers pick search directions.
    pub fn triple_product(a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
        b * a.dot(c) - a * b.dot(c)
    }

    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    pub fn normalize(self) -> Self {
        self.normalize_or(Self::ZERO)
    }

    /// Unit vector in the same direction, or `fallback` when the length is
    /// (nearly) zero.
    pub fn normalize_or(self, fallback: Vec2) -> Self {
        let len_sq = self.magnitude_squared();
        if len_sq < 1e-20 {
            fallback
        } else {
            self / len_sq.sqrt()
        }
    }

    /// Counter-clockwise quarter turn.
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Rotated counter-clockwise by `angle` radians.
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos * self.x - sin * self.y, sin * self.x + cos * self.y)
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }
}

macro_rules! impl_vec_op {
    ($op:ident, $method:ident, $assign:ident, $assign_method:ident, $sym:tt) => {
        impl $op for Vec2 {
            type Output = Vec2;

            fn $method(self, rhs: Vec2) -> Vec2 {
                Vec2::new(self.x $sym rhs.x, self.y $sym rhs.y)
            }
        }

        impl $assign for Vec2 {
            fn $assign_method(&mut self, rhs: Vec2) {
                *self = *self $sym rhs;
            }
        }
    };
}

impl_vec_op!(Add, add, AddAssign, add_assign, +);
impl_vec_op!(Sub, sub, SubAssign, sub_assign, -);

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, v: Vec2) -> Vec2 {
        v * self
    }
}

impl MulAssign<f64> for Vec2 {
    fn mul_assign(&mut self, s: f64) {
        *self = *self * s;
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, s: f64) -> Vec2 {
        Vec2::new(self.x / s, self.y / s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}
