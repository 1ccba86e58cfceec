/// Sensor abstraction layer for hardware independence
/// Enables testing, simulation, and support for multiple IMU parts
use core::ops::Sub;

use thiserror::Error;

/// Three-axis measurement in physical units
///
/// Acceleration samples are in g, angular-rate samples in degrees/second.
/// The sensitivity scale is applied by the [`SensorSource`] before a sample
/// ever reaches the estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Scale raw sensor counts by a per-LSB sensitivity
    pub fn from_counts(raw: [i16; 3], sensitivity: f64) -> Self {
        Self::new(
            raw[0] as f64 * sensitivity,
            raw[1] as f64 * sensitivity,
            raw[2] as f64 * sensitivity,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// One tick worth of inertial data
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuSample {
    /// Acceleration (g)
    pub accel: Vector3,
    /// Angular rate (deg/s)
    pub gyro: Vector3,
}

/// Errors that can occur when reading sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("sensor bus I/O failed")]
    IoError,
    #[error("sensor not ready")]
    NotReady,
    #[error("sensor read timed out")]
    Timeout,
}

/// Synchronous source of scaled accelerometer and gyroscope samples
/// Implementations: LSM6DSL over I2C, simulated sources in tests
pub trait SensorSource {
    /// Read one acceleration sample (g)
    fn read_acceleration(&mut self) -> Result<Vector3, SensorError>;

    /// Read one angular-rate sample (deg/s)
    fn read_angular_rate(&mut self) -> Result<Vector3, SensorError>;

    /// Read accelerometer then gyroscope as a single tick sample
    fn read_sample(&mut self) -> Result<ImuSample, SensorError> {
        let accel = self.read_acceleration()?;
        let gyro = self.read_angular_rate()?;
        Ok(ImuSample { accel, gyro })
    }
}
