//! Complementary filter blend
//!
//! Mixes a high-bandwidth but drifting estimate (gyro integration) with a
//! noisy but drift-free reference (accelerometer tilt) using fixed weights.

/// Default weight of the gyro-integrated term
pub const DEFAULT_GYRO_WEIGHT: f64 = 0.96;

/// Fixed-weight complementary blend
///
/// The two weights always sum to one, so the output is a convex
/// combination of its inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplementaryFilter {
    gyro_weight: f64,
}

impl ComplementaryFilter {
    /// Create a filter; the weight is clamped to [0, 1]
    pub fn new(gyro_weight: f64) -> Self {
        let gyro_weight = if gyro_weight.is_nan() {
            DEFAULT_GYRO_WEIGHT
        } else {
            gyro_weight.clamp(0.0, 1.0)
        };
        Self { gyro_weight }
    }

    pub fn gyro_weight(&self) -> f64 {
        self.gyro_weight
    }

    pub fn accel_weight(&self) -> f64 {
        1.0 - self.gyro_weight
    }

    /// Blend one axis
    pub fn blend(&self, gyro_angle: f64, accel_angle: f64) -> f64 {
        self.gyro_weight * gyro_angle + self.accel_weight() * accel_angle
    }
}

impl Default for ComplementaryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_GYRO_WEIGHT)
    }
}
