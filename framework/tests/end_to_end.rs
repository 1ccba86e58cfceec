//! Node to monitor: calibrate, stream through the loop, decode on the far side.

use attitude_telemetry::{
    calibrate_from_source, CalibrationConfig, Channel, ChannelError, EstimatorConfig, Framing,
    OrientationEstimator, SensorError, SensorSource, SequenceTracker, StreamConfig, StreamError,
    TelemetryDecoder, TelemetryRecord, TelemetryStreamer, Vector3,
};
use embedded_hal::delay::DelayNs;

/// Binary-exact bias so calibration removes it without rounding
const BIAS: Vector3 = Vector3::new(0.5, -0.25, 0.125);

/// Level device with a constant rotation; acceleration reads past `budget` fail
struct BenchImu {
    rate: Vector3,
    budget: usize,
    reads: usize,
}

impl BenchImu {
    fn new(rate: Vector3, budget: usize) -> Self {
        Self {
            rate,
            budget,
            reads: 0,
        }
    }
}

impl SensorSource for BenchImu {
    fn read_acceleration(&mut self) -> Result<Vector3, SensorError> {
        self.reads += 1;
        if self.reads > self.budget {
            return Err(SensorError::IoError);
        }
        Ok(Vector3::new(0.0, 0.0, 1.0))
    }

    fn read_angular_rate(&mut self) -> Result<Vector3, SensorError> {
        Ok(Vector3::new(
            BIAS.x + self.rate.x,
            BIAS.y + self.rate.y,
            BIAS.z + self.rate.z,
        ))
    }
}

/// Collects the byte stream; every `drop_every`-th send times out
#[derive(Default)]
struct Wire {
    bytes: Vec<u8>,
    sends: usize,
    drop_every: Option<usize>,
}

impl Channel for Wire {
    fn send(&mut self, bytes: &[u8]) -> Result<usize, ChannelError> {
        self.sends += 1;
        if let Some(n) = self.drop_every {
            if self.sends % n == 0 {
                return Err(ChannelError::Timeout);
            }
        }
        self.bytes.extend_from_slice(bytes);
        Ok(bytes.len())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fn calibrated(imu: &mut BenchImu) -> OrientationEstimator {
    let config = CalibrationConfig {
        samples: 10,
        ..Default::default()
    };
    // Calibration only sees the bias while the device is still
    let rate = imu.rate;
    imu.rate = Vector3::ZERO;
    let bias = calibrate_from_source(imu, &mut NoDelay, &config).unwrap();
    imu.rate = rate;
    assert_eq!(bias.offset(), BIAS);
    OrientationEstimator::new(bias, EstimatorConfig::default())
}

fn decode_all(bytes: &[u8]) -> Vec<TelemetryRecord> {
    let mut decoder = TelemetryDecoder::new();
    decoder.push_data(bytes);
    let mut records = Vec::new();
    while let Some(record) = decoder.next_record() {
        records.push(record.unwrap());
    }
    records
}

#[test]
fn stationary_node_streams_zero_orientation() {
    let mut imu = BenchImu::new(Vector3::ZERO, 50);
    let estimator = calibrated(&mut imu);

    let mut streamer = TelemetryStreamer::new(
        imu,
        Wire::default(),
        NoDelay,
        estimator,
        StreamConfig::default(),
    );
    let err = streamer.run().unwrap_err();
    assert!(matches!(
        err,
        StreamError::Sensor {
            source: SensorError::IoError,
            ..
        }
    ));

    let (_, wire, _) = streamer.into_parts();
    let records = decode_all(&wire.bytes);
    assert_eq!(records.len(), 50);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.sequence, i as u32 + 1);
        assert_eq!(record.roll, 0.0);
        assert_eq!(record.pitch, 0.0);
        assert_eq!(record.yaw, 0.0);
    }
}

#[test]
fn yaw_rate_accumulates_on_the_wire() {
    // 10 deg/s for 100 ticks of 1 ms
    let mut imu = BenchImu::new(Vector3::new(0.0, 0.0, 10.0), 100);
    let estimator = calibrated(&mut imu);

    let config = StreamConfig {
        framing: Framing::Newline,
        ..Default::default()
    };
    let mut streamer = TelemetryStreamer::new(imu, Wire::default(), NoDelay, estimator, config);
    assert!(streamer.run().is_err());

    let (_, wire, _) = streamer.into_parts();
    let text = String::from_utf8(wire.bytes.clone()).unwrap();
    assert_eq!(text.lines().count(), 100);

    let records = decode_all(&wire.bytes);
    let last = records.last().unwrap();
    assert_eq!(last.sequence, 100);
    assert!((last.yaw - 1.0).abs() < 1e-6, "yaw {}", last.yaw);
    assert_eq!(last.roll, 0.0);
    assert_eq!(last.pitch, 0.0);
}

#[test]
fn dropped_sends_show_up_as_sequence_gaps() {
    let mut imu = BenchImu::new(Vector3::new(0.0, 0.0, 10.0), 30);
    let estimator = calibrated(&mut imu);

    let wire = Wire {
        drop_every: Some(10),
        ..Default::default()
    };
    let mut streamer =
        TelemetryStreamer::new(imu, wire, NoDelay, estimator, StreamConfig::default());
    assert!(streamer.run().is_err());

    let stats = streamer.stats();
    assert_eq!(stats.ticks, 30);
    assert_eq!(stats.sent, 27);
    assert_eq!(stats.dropped, 3);

    let (_, wire, _) = streamer.into_parts();
    let records = decode_all(&wire.bytes);
    assert_eq!(records.len(), 27);

    let mut tracker = SequenceTracker::new();
    let gaps: Vec<u32> = records.iter().map(|r| tracker.observe(r.sequence)).collect();
    assert_eq!(tracker.missing(), 2); // tick 30 was last, nothing follows it
    assert_eq!(gaps.iter().filter(|&&g| g == 1).count(), 2);

    // Drops never pause integration
    let last = records.last().unwrap();
    assert_eq!(last.sequence, 29);
    assert!((last.yaw - 0.29).abs() < 1e-6);
}
