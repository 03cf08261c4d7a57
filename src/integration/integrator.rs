use crate::objects::{MotionType, RigidBody};

/// Advances the body's pose by its current velocity (semi-implicit Euler; velocity
/// has already been updated by the solver).
///
/// Static bodies never move. Kinematic bodies follow their velocity untouched by forces.
pub fn integrate(body: &mut RigidBody, dt: f64) {
    if body.motion_type() == MotionType::Static {
        return;
    }

    let center = body.world_center() + body.linear_velocity * dt;
    // Keep the angle within [-PI, PI] so long runs don't lose precision.
    let rotation = wrap_angle(body.rotation() + body.angular_velocity * dt);
    body.set_center_and_rotation(center, rotation);
}

/// Wraps an angle in radians to the range [-PI, PI].
pub fn wrap_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}
