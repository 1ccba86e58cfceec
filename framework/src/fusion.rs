//! Orientation Estimator
//!
//! Runs once per tick:
//! 1. Remove the startup gyro bias from the angular rate
//! 2. Integrate the rate into roll/pitch/yaw accumulators (deg/s * s = deg)
//! 3. Derive roll/pitch from the gravity direction
//! 4. Pull the integrated roll/pitch towards the gravity tilt with a
//!    complementary filter
//!
//! Yaw has no gravity reference, so it is pure integration and drifts
//! without bound. There is no magnetometer correction.
//!
//! The accumulators are never reset or wrapped. [`AngleWrap`] only changes
//! how the estimate is reported, which keeps the blend away from the ±180
//! discontinuity.
//!
//! Degenerate samples (NaN, all-zero gravity) are not masked: they propagate
//! into the estimate. Such ticks are counted in [`OrientationEstimator::nan_ticks`].

use core::time::Duration;

use log::warn;

use crate::calibration::GyroBias;
use crate::filter::{ComplementaryFilter, DEFAULT_GYRO_WEIGHT};
use crate::sensors::ImuSample;
use crate::transforms::{accel_tilt, AngleWrap};

/// Estimator configuration
#[derive(Debug, Clone, Copy)]
pub struct EstimatorConfig {
    /// Weight of the gyro-integrated roll/pitch (0.0-1.0)
    /// Accelerometer tilt gets the remainder
    pub gyro_weight: f64,
    /// Presentation of the reported angles
    pub wrap: AngleWrap,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            gyro_weight: DEFAULT_GYRO_WEIGHT,
            wrap: AngleWrap::Unbounded,
        }
    }
}

/// Roll, pitch and yaw in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationEstimate {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl OrientationEstimate {
    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

/// Intermediate values of the most recent tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FusionTerms {
    /// Roll after gyro integration, before blending (deg)
    pub gyro_roll: f64,
    /// Pitch after gyro integration, before blending (deg)
    pub gyro_pitch: f64,
    /// Roll from gravity (deg)
    pub accel_roll: f64,
    /// Pitch from gravity (deg)
    pub accel_pitch: f64,
}

pub struct OrientationEstimator {
    bias: GyroBias,
    filter: ComplementaryFilter,
    wrap: AngleWrap,
    angles: OrientationEstimate,
    last_terms: FusionTerms,
    ticks: u64,
    nan_ticks: u64,
}

impl OrientationEstimator {
    pub fn new(bias: GyroBias, config: EstimatorConfig) -> Self {
        Self {
            bias,
            filter: ComplementaryFilter::new(config.gyro_weight),
            wrap: config.wrap,
            angles: OrientationEstimate::default(),
            last_terms: FusionTerms::default(),
            ticks: 0,
            nan_ticks: 0,
        }
    }

    /// Advance the estimate by one sample taken `dt` after the previous one
    pub fn tick(&mut self, sample: &ImuSample, dt: Duration) -> OrientationEstimate {
        let rate = self.bias.remove_from(sample.gyro);
        let dt_s = dt.as_secs_f64();

        self.angles.roll += rate.x * dt_s;
        self.angles.pitch += rate.y * dt_s;
        self.angles.yaw += rate.z * dt_s;

        let (accel_roll, accel_pitch) = accel_tilt(sample.accel);
        self.last_terms = FusionTerms {
            gyro_roll: self.angles.roll,
            gyro_pitch: self.angles.pitch,
            accel_roll,
            accel_pitch,
        };

        self.angles.roll = self.filter.blend(self.angles.roll, accel_roll);
        self.angles.pitch = self.filter.blend(self.angles.pitch, accel_pitch);

        self.ticks += 1;
        if !self.angles.is_finite() {
            self.nan_ticks += 1;
            if self.nan_ticks == 1 {
                warn!(
                    "Non-finite attitude at tick {} (accel={:?}, gyro={:?})",
                    self.ticks, sample.accel, sample.gyro
                );
            }
        }

        self.estimate()
    }

    /// Current estimate with the configured wrap applied
    pub fn estimate(&self) -> OrientationEstimate {
        OrientationEstimate {
            roll: self.wrap.apply(self.angles.roll),
            pitch: self.wrap.apply(self.angles.pitch),
            yaw: self.wrap.apply(self.angles.yaw),
        }
    }

    /// Raw accumulators, never wrapped
    pub fn accumulators(&self) -> OrientationEstimate {
        self.angles
    }

    pub fn last_terms(&self) -> FusionTerms {
        self.last_terms
    }

    pub fn bias(&self) -> GyroBias {
        self.bias
    }

    /// Ticks processed since start
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that left a NaN or infinite angle in the estimate
    pub fn nan_ticks(&self) -> u64 {
        self.nan_ticks
    }
}
