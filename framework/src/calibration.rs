//! Startup gyroscope bias calibration
//!
//! The node is assumed stationary while the bias is measured. After a short
//! settle delay (the sensor output is not stable right after power-up) one or
//! more angular-rate samples are averaged, and the mean is subtracted from
//! every later reading by the estimator.
//!
//! The bias is measured once per boot. Slow drift over long runs is not
//! tracked.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::sensors::{SensorError, SensorSource, Vector3};

/// Calibration configuration
#[derive(Debug, Clone, Copy)]
pub struct CalibrationConfig {
    /// Number of angular-rate samples to average (0 is treated as 1)
    pub samples: usize,
    /// Wait after sensor init before the first sample (ms)
    pub settle_ms: u32,
    /// Spacing between consecutive calibration samples (ms)
    pub sample_interval_ms: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: 1,
            settle_ms: 100,
            sample_interval_ms: 1,
        }
    }
}

/// Angular-rate offset measured at rest (deg/s)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GyroBias(Vector3);

impl GyroBias {
    pub fn new(offset: Vector3) -> Self {
        Self(offset)
    }

    pub fn offset(&self) -> Vector3 {
        self.0
    }

    /// Subtract the bias from an angular-rate sample
    pub fn remove_from(&self, gyro: Vector3) -> Vector3 {
        gyro - self.0
    }
}

/// Collects stationary gyro samples and averages them into a [`GyroBias`]
pub struct BiasCalibrator {
    sum: Vector3,
    count: usize,
    target_samples: usize,
}

impl BiasCalibrator {
    pub fn new(target_samples: usize) -> Self {
        Self {
            sum: Vector3::ZERO,
            count: 0,
            target_samples: target_samples.max(1),
        }
    }

    /// Add one angular-rate sample; ignored once the target is reached
    pub fn add_sample(&mut self, gyro: Vector3) {
        if self.is_complete() {
            return;
        }
        self.sum.x += gyro.x;
        self.sum.y += gyro.y;
        self.sum.z += gyro.z;
        self.count += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.count >= self.target_samples
    }

    /// Progress from 0.0 to 1.0
    pub fn progress(&self) -> f32 {
        self.count as f32 / self.target_samples as f32
    }

    /// Mean of the collected samples, `None` until enough were added
    pub fn compute_bias(&self) -> Option<GyroBias> {
        if !self.is_complete() {
            return None;
        }
        let n = self.count as f64;
        Some(GyroBias(Vector3::new(
            self.sum.x / n,
            self.sum.y / n,
            self.sum.z / n,
        )))
    }
}

/// Bias from a single stationary sample
pub fn calibrate(sample: Vector3) -> GyroBias {
    GyroBias(sample)
}

/// Settle, then average `config.samples` angular-rate readings
///
/// Any read failure aborts calibration; the caller must not start streaming
/// with a zero bias.
pub fn calibrate_from_source<S, D>(
    source: &mut S,
    delay: &mut D,
    config: &CalibrationConfig,
) -> Result<GyroBias, SensorError>
where
    S: SensorSource,
    D: DelayNs,
{
    let mut calibrator = BiasCalibrator::new(config.samples);

    info!(
        "Gyro calibration: settling {} ms, averaging {} sample(s), keep device still",
        config.settle_ms, calibrator.target_samples
    );
    delay.delay_ms(config.settle_ms);

    while !calibrator.is_complete() {
        calibrator.add_sample(source.read_angular_rate()?);
        if !calibrator.is_complete() {
            delay.delay_ms(config.sample_interval_ms);
        }
    }

    let bias = calibrator.compute_bias().ok_or(SensorError::NotReady)?;
    let offset = bias.offset();
    info!(
        "Gyro bias: x={:.4} y={:.4} z={:.4} deg/s",
        offset.x, offset.y, offset.z
    );
    Ok(bias)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingDelay {
        total_ms: u64,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += (ns / 1_000_000) as u64;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms as u64;
        }
    }

    struct GyroSequence {
        readings: Vec<Result<Vector3, SensorError>>,
        reads: usize,
    }

    impl SensorSource for GyroSequence {
        fn read_acceleration(&mut self) -> Result<Vector3, SensorError> {
            Ok(Vector3::new(0.0, 0.0, 1.0))
        }

        fn read_angular_rate(&mut self) -> Result<Vector3, SensorError> {
            let reading = self.readings[self.reads % self.readings.len()];
            self.reads += 1;
            reading
        }
    }

    #[test]
    fn test_single_sample_bias_equals_sample() {
        let bias = calibrate(Vector3::new(0.7, -0.35, 1.4));
        assert_eq!(bias.offset(), Vector3::new(0.7, -0.35, 1.4));
    }

    #[test]
    fn test_calibrator_averages() {
        let mut cal = BiasCalibrator::new(4);
        assert!(!cal.is_complete());
        assert!(cal.compute_bias().is_none());

        cal.add_sample(Vector3::new(1.0, 0.0, -2.0));
        cal.add_sample(Vector3::new(3.0, 0.0, -2.0));
        assert_eq!(cal.progress(), 0.5);
        cal.add_sample(Vector3::new(1.0, 4.0, -2.0));
        cal.add_sample(Vector3::new(3.0, 0.0, -2.0));

        // Extra samples past the target are ignored
        cal.add_sample(Vector3::new(100.0, 100.0, 100.0));

        let bias = cal.compute_bias().unwrap().offset();
        assert!((bias.x - 2.0).abs() < 1e-12);
        assert!((bias.y - 1.0).abs() < 1e-12);
        assert!((bias.z + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_target_is_one_sample() {
        let mut cal = BiasCalibrator::new(0);
        cal.add_sample(Vector3::new(0.1, 0.2, 0.3));
        assert!(cal.is_complete());
        assert_eq!(
            cal.compute_bias().unwrap().offset(),
            Vector3::new(0.1, 0.2, 0.3)
        );
    }

    #[test]
    fn test_remove_from() {
        let bias = GyroBias::new(Vector3::new(0.5, 0.5, 0.5));
        assert_eq!(
            bias.remove_from(Vector3::new(1.5, 2.5, 3.5)),
            Vector3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_calibrate_from_source_settles_then_samples() {
        let mut source = GyroSequence {
            readings: vec![Ok(Vector3::new(0.2, -0.1, 0.05))],
            reads: 0,
        };
        let mut delay = RecordingDelay { total_ms: 0 };
        let config = CalibrationConfig::default();

        let bias = calibrate_from_source(&mut source, &mut delay, &config).unwrap();

        assert_eq!(source.reads, 1);
        assert_eq!(delay.total_ms, 100);
        assert_eq!(bias.offset(), Vector3::new(0.2, -0.1, 0.05));
    }

    #[test]
    fn test_calibrate_from_source_multi_sample_spacing() {
        let mut source = GyroSequence {
            readings: vec![Ok(Vector3::new(1.0, 0.0, 0.0)), Ok(Vector3::new(3.0, 0.0, 0.0))],
            reads: 0,
        };
        let mut delay = RecordingDelay { total_ms: 0 };
        let config = CalibrationConfig {
            samples: 10,
            settle_ms: 100,
            sample_interval_ms: 2,
        };

        let bias = calibrate_from_source(&mut source, &mut delay, &config).unwrap();

        assert_eq!(source.reads, 10);
        // Settle plus nine gaps between ten samples
        assert_eq!(delay.total_ms, 100 + 9 * 2);
        assert!((bias.offset().x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_calibrate_from_source_read_failure_is_fatal() {
        let mut source = GyroSequence {
            readings: vec![Ok(Vector3::ZERO), Err(SensorError::IoError)],
            reads: 0,
        };
        let mut delay = RecordingDelay { total_ms: 0 };
        let config = CalibrationConfig {
            samples: 3,
            ..Default::default()
        };

        let result = calibrate_from_source(&mut source, &mut delay, &config);
        assert_eq!(result, Err(SensorError::IoError));
    }
}
