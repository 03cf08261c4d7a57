//! Types shared across the engine.

pub mod error;

pub use error::{PhysicsError, Result};
