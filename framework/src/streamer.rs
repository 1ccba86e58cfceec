//! Telemetry streaming loop
//!
//! One thread, one state. Every tick runs the same sequence:
//!
//! ```text
//! read sensors -> update estimate -> encode -> send -> sleep(period)
//! ```
//!
//! Delivery is best effort. A failed send (or a record that does not fit the
//! encode buffer) is logged and dropped; there is no retry, backoff or
//! reconnect, and the estimator is never reset. The loop must keep
//! integrating even while the network is unhappy.
//!
//! Sensor reads are the only fatal path. By default the first failed read
//! ends the loop; `read_retries` allows a bounded number of immediate
//! re-reads first.
//!
//! The sleep is a fixed period with no drift compensation, so the real tick
//! rate is slightly below nominal.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use thiserror::Error;

use crate::channel::{Channel, ChannelError};
use crate::fusion::{OrientationEstimate, OrientationEstimator};
use crate::sensors::{ImuSample, SensorError, SensorSource};
use crate::telemetry::{EncodeError, Framing, SampleCounter, TelemetryEncoder};

/// Streaming loop configuration
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Nominal tick period, also used as the integration step (ms)
    pub tick_period_ms: u32,
    /// Extra read attempts before a sensor failure becomes fatal
    pub read_retries: u8,
    /// Upper bound for one send on the TCP channel (ms)
    pub send_timeout_ms: u32,
    /// Record delimiter on the wire
    pub framing: Framing,
    /// Ticks between debug stats lines (0 disables)
    pub stats_interval: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1,
            read_retries: 0,
            send_timeout_ms: 100,
            framing: Framing::Bare,
            stats_interval: 1000,
        }
    }
}

impl StreamConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms as u64)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms as u64)
    }
}

/// Loop counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub ticks: u64,
    pub sent: u64,
    pub dropped: u64,
    pub read_retries: u64,
    pub nan_ticks: u64,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("sensor read failed after {attempts} attempt(s): {source}")]
    Sensor {
        attempts: u32,
        #[source]
        source: SensorError,
    },
}

/// Why a record did not reach the channel
#[derive(Debug)]
pub enum DropCause {
    Encode(EncodeError),
    Send(ChannelError),
}

/// Result of one tick
#[derive(Debug)]
pub enum TickOutcome {
    Sent {
        sequence: u32,
        bytes: usize,
        estimate: OrientationEstimate,
    },
    Dropped {
        sequence: u32,
        cause: DropCause,
        estimate: OrientationEstimate,
    },
}

impl TickOutcome {
    pub fn estimate(&self) -> OrientationEstimate {
        match self {
            TickOutcome::Sent { estimate, .. } | TickOutcome::Dropped { estimate, .. } => *estimate,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, TickOutcome::Sent { .. })
    }
}

pub struct TelemetryStreamer<S, C, D> {
    source: S,
    channel: C,
    delay: D,
    estimator: OrientationEstimator,
    encoder: TelemetryEncoder,
    counter: SampleCounter,
    config: StreamConfig,
    stats: StreamStats,
    consecutive_drops: u64,
}

impl<S, C, D> TelemetryStreamer<S, C, D>
where
    S: SensorSource,
    C: Channel,
    D: DelayNs,
{
    pub fn new(
        source: S,
        channel: C,
        delay: D,
        estimator: OrientationEstimator,
        config: StreamConfig,
    ) -> Self {
        Self {
            source,
            channel,
            delay,
            estimator,
            encoder: TelemetryEncoder::new(config.framing),
            counter: SampleCounter::default(),
            config,
            stats: StreamStats::default(),
            consecutive_drops: 0,
        }
    }

    /// Stream forever. Only returns on a fatal sensor error.
    pub fn run(&mut self) -> Result<(), StreamError> {
        info!(
            "Streaming telemetry every {} ms ({:?} framing)",
            self.config.tick_period_ms, self.config.framing
        );
        loop {
            self.step()?;
            self.delay.delay_ms(self.config.tick_period_ms);
        }
    }

    /// One tick without the trailing sleep
    pub fn step(&mut self) -> Result<TickOutcome, StreamError> {
        let sample = self.read_sample()?;

        let estimate = self.estimator.tick(&sample, self.config.tick_period());
        let sequence = self.counter.advance();
        self.stats.ticks += 1;
        self.stats.nan_ticks = self.estimator.nan_ticks();

        let result = match self.encoder.encode(&estimate, self.counter) {
            Ok(message) => match self.channel.send(message.as_bytes()) {
                Ok(0) => Err(DropCause::Send(ChannelError::Closed)),
                Ok(bytes) => Ok(bytes),
                Err(e) => Err(DropCause::Send(e)),
            },
            Err(e) => Err(DropCause::Encode(e)),
        };

        let outcome = match result {
            Ok(bytes) => {
                self.stats.sent += 1;
                if self.consecutive_drops > 0 {
                    info!(
                        "Telemetry sending again after {} dropped record(s)",
                        self.consecutive_drops
                    );
                    self.consecutive_drops = 0;
                }
                TickOutcome::Sent {
                    sequence,
                    bytes,
                    estimate,
                }
            }
            Err(cause) => {
                self.stats.dropped += 1;
                self.consecutive_drops += 1;
                if self.consecutive_drops == 1 || self.consecutive_drops % 1000 == 0 {
                    warn!(
                        "Telemetry record {} dropped ({} in a row): {:?}",
                        sequence, self.consecutive_drops, cause
                    );
                }
                TickOutcome::Dropped {
                    sequence,
                    cause,
                    estimate,
                }
            }
        };

        if self.config.stats_interval > 0
            && self.stats.ticks % self.config.stats_interval as u64 == 0
        {
            debug!(
                "ticks={} sent={} dropped={} nan={} roll={:.2} pitch={:.2} yaw={:.2}",
                self.stats.ticks,
                self.stats.sent,
                self.stats.dropped,
                self.stats.nan_ticks,
                estimate.roll,
                estimate.pitch,
                estimate.yaw
            );
        }

        Ok(outcome)
    }

    fn read_sample(&mut self) -> Result<ImuSample, StreamError> {
        let max_attempts = self.config.read_retries as u32 + 1;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.source.read_sample() {
                Ok(sample) => return Ok(sample),
                Err(source) if attempts >= max_attempts => {
                    return Err(StreamError::Sensor { attempts, source });
                }
                Err(e) => {
                    self.stats.read_retries += 1;
                    debug!("Sensor read failed ({}), retrying", e);
                }
            }
        }
    }

    pub fn estimator(&self) -> &OrientationEstimator {
        &self.estimator
    }

    pub fn counter(&self) -> SampleCounter {
        self.counter
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Give back the collaborators
    pub fn into_parts(self) -> (S, C, D) {
        (self.source, self.channel, self.delay)
    }
}

/// `DelayNs` on top of `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}
