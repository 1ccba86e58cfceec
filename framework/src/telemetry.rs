/// JSON text telemetry encoding
///
/// One record per tick:
///
/// ```text
/// {"x":<roll>,"y":<pitch>,"z":<yaw>,"s":<sample>}
/// ```
///
/// Angles use fixed 6 fractional digits (same rendering as C `%f`), the
/// sample counter is a plain decimal integer. Non-finite angles are written
/// as `NaN` / `inf` / `-inf` and are therefore not strict JSON; they are
/// passed through rather than hidden.
///
/// Records are built in a fixed buffer of [`MAX_MESSAGE_LEN`] bytes. A record
/// that does not fit is rejected, never truncated. Angles within ±180 always
/// fit: the worst case is 64 bytes, 65 with a newline.
use core::fmt::Write;

use heapless::String;
use thiserror::Error;

use crate::fusion::OrientationEstimate;

/// Capacity of the encode buffer (bytes)
pub const MAX_MESSAGE_LEN: usize = 128;

/// How consecutive records are separated on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// No delimiter, one record per send call
    #[default]
    Bare,
    /// Each record ends with `\n`
    Newline,
}

/// Per-tick sequence number
///
/// The first transmitted tick carries 1. After `u32::MAX` the counter wraps
/// to 0; consumers must treat the sequence as modulo 2^32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleCounter(u32);

impl SampleCounter {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Increment (wrapping) and return the new value
    pub fn advance(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("telemetry record exceeds {max} bytes", max = MAX_MESSAGE_LEN)]
    Overflow,
}

/// Encoded record, ready to hand to a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryMessage {
    text: String<MAX_MESSAGE_LEN>,
}

impl TelemetryMessage {
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Formats orientation estimates into telemetry records
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryEncoder {
    framing: Framing,
}

impl TelemetryEncoder {
    pub fn new(framing: Framing) -> Self {
        Self { framing }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Encode one record. Pure: same inputs give the same bytes.
    pub fn encode(
        &self,
        estimate: &OrientationEstimate,
        counter: SampleCounter,
    ) -> Result<TelemetryMessage, EncodeError> {
        let mut text: String<MAX_MESSAGE_LEN> = String::new();
        write!(
            text,
            "{{\"x\":{:.6},\"y\":{:.6},\"z\":{:.6},\"s\":{}}}",
            estimate.roll,
            estimate.pitch,
            estimate.yaw,
            counter.value()
        )
        .map_err(|_| EncodeError::Overflow)?;

        if self.framing == Framing::Newline {
            text.push('\n').map_err(|_| EncodeError::Overflow)?;
        }

        Ok(TelemetryMessage { text })
    }
}
