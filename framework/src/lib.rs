//! Attitude Telemetry Framework
//!
//! Estimates roll, pitch and yaw from a 6-axis IMU and streams the result as
//! compact JSON text over a byte-stream connection.
//!
//! ## Features
//!
//! - **Bias Calibration**: Startup gyro offset from one or N stationary samples
//! - **Complementary Filter**: Gyro integration pulled towards gravity tilt
//! - **Bounded Encoding**: Fixed-capacity record buffer, fail fast on overflow
//! - **Best-Effort Streaming**: Dropped sends never stall or reset estimation
//! - **Stream Decoding**: Consumer-side splitter for undelimited record streams
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────┐   ┌──────────────────┐   ┌─────────┐
//! │ SensorSource │──▶│ OrientationEstimator │──▶│ TelemetryEncoder │──▶│ Channel │
//! └──────────────┘   └──────────────────────┘   └──────────────────┘   └─────────┘
//!          ▲                     driven by TelemetryStreamer
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use attitude_telemetry::{
//!     calibrate_from_source, CalibrationConfig, EstimatorConfig, OrientationEstimator,
//!     SensorError, SensorSource, StdDelay, StreamConfig, TcpChannel, TelemetryStreamer,
//!     Vector3,
//! };
//!
//! struct Imu;
//!
//! impl SensorSource for Imu {
//!     fn read_acceleration(&mut self) -> Result<Vector3, SensorError> {
//!         Ok(Vector3::new(0.0, 0.0, 1.0))
//!     }
//!     fn read_angular_rate(&mut self) -> Result<Vector3, SensorError> {
//!         Ok(Vector3::ZERO)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut imu = Imu;
//! let mut delay = StdDelay;
//! let bias = calibrate_from_source(&mut imu, &mut delay, &CalibrationConfig::default())?;
//!
//! let config = StreamConfig::default();
//! let channel = TcpChannel::connect("192.168.1.104:30000", config.send_timeout())?;
//! let estimator = OrientationEstimator::new(bias, EstimatorConfig::default());
//!
//! TelemetryStreamer::new(imu, channel, delay, estimator, config).run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`sensors`] - Sample types and the sensor trait
//! - [`calibration`] - Startup gyro bias
//! - [`transforms`] - Gravity tilt and angle wrapping
//! - [`filter`] - Complementary blend
//! - [`fusion`] - Orientation estimator
//! - [`telemetry`] - Record encoding
//! - [`decoder`] - Record decoding for consumers
//! - [`channel`] - Transport trait and TCP implementation
//! - [`streamer`] - The tick loop

pub mod calibration;
pub mod channel;
pub mod decoder;
pub mod filter;
pub mod fusion;
pub mod sensors;
pub mod streamer;
pub mod telemetry;
pub mod transforms;

// Re-export commonly used types
pub use calibration::{calibrate, calibrate_from_source, BiasCalibrator, CalibrationConfig, GyroBias};
pub use channel::{Channel, ChannelError, TcpChannel};
pub use decoder::{DecodeError, SequenceTracker, TelemetryDecoder, TelemetryRecord};
pub use filter::ComplementaryFilter;
pub use fusion::{EstimatorConfig, OrientationEstimate, OrientationEstimator};
pub use sensors::{ImuSample, SensorError, SensorSource, Vector3};
pub use streamer::{DropCause, StdDelay, StreamConfig, StreamError, StreamStats, TelemetryStreamer, TickOutcome};
pub use telemetry::{EncodeError, Framing, SampleCounter, TelemetryEncoder, TelemetryMessage, MAX_MESSAGE_LEN};
pub use transforms::AngleWrap;
