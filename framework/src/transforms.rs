/// Angle helpers: gravity tilt and range normalization
use crate::sensors::Vector3;

/// Roll and pitch (degrees) implied by the gravity vector
///
/// Only valid while the device is not under significant linear
/// acceleration; that is assumed, not checked.
///
/// # Arguments
/// * `accel` - Acceleration in body frame (any unit, only direction matters)
///
/// # Returns
/// * `(roll_deg, pitch_deg)`
///
/// An all-zero vector yields `(0.0, -0.0)` from `atan2(0, 0)`; NaN inputs
/// yield NaN outputs.
pub fn accel_tilt(accel: Vector3) -> (f64, f64) {
    let roll = accel.y.atan2(accel.z);
    let pitch = (-accel.x).atan2((accel.y * accel.y + accel.z * accel.z).sqrt());
    (roll.to_degrees(), pitch.to_degrees())
}

/// How reported angles are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleWrap {
    /// Raw accumulators, no wraparound
    #[default]
    Unbounded,
    /// Wrap into [-180, 180)
    Signed180,
}

impl AngleWrap {
    pub fn apply(self, angle_deg: f64) -> f64 {
        match self {
            AngleWrap::Unbounded => angle_deg,
            AngleWrap::Signed180 => wrap_degrees(angle_deg),
        }
    }
}

/// Normalize an angle to [-180, 180) degrees
pub fn wrap_degrees(angle_deg: f64) -> f64 {
    let wrapped = (angle_deg + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
