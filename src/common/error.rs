use thiserror::Error;

use crate::objects::ObjectHandle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("no object registered for handle {0:?}")]
    UnknownObject(ObjectHandle),
    #[error("object {handle:?} is not a {expected}")]
    WrongObjectKind {
        handle: ObjectHandle,
        expected: &'static str,
    },
    #[error("collision shapes must be convex")]
    NonConvexShape,
    #[error("density must be finite and non-negative, got {0}")]
    InvalidDensity(f64),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PhysicsError::NonConvexShape.to_string(),
            "collision shapes must be convex"
        );
        assert_eq!(
            PhysicsError::InvalidDensity(-1.0).to_string(),
            "density must be finite and non-negative, got -1"
        );
    }
}
