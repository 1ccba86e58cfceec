use serde::Deserialize;
use thiserror::Error;

/// Bytes kept while waiting for a record to close
pub const MAX_PENDING_BYTES: usize = 4096;

/// One decoded telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TelemetryRecord {
    /// Roll (deg)
    #[serde(rename = "x")]
    pub roll: f64,
    /// Pitch (deg)
    #[serde(rename = "y")]
    pub pitch: f64,
    /// Yaw (deg)
    #[serde(rename = "z")]
    pub yaw: f64,
    /// Sample counter
    #[serde(rename = "s")]
    pub sequence: u32,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// `sequence` is recovered when only the angles are unparsable, as with
    /// a non-finite estimate written as `NaN`
    #[error("malformed telemetry record: {source}")]
    Malformed {
        sequence: Option<u32>,
        #[source]
        source: serde_json::Error,
    },
    #[error("no record closed within {discarded} bytes, buffer discarded")]
    Overflow { discarded: usize },
}

/// Streaming splitter for telemetry records
///
/// The node may send records without any delimiter, so a single read can
/// hold several records, a fraction of one, or both. Feed raw bytes via
/// `push_data`, then drain records via `next_record`. Bytes outside
/// `{ ... }` (newlines, a truncated record head) are skipped.
pub struct TelemetryDecoder {
    buffer: Vec<u8>,
}

impl TelemetryDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes waiting for a closing brace
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Try to extract the next complete record from the buffer.
    /// Returns `None` if no complete record is available yet.
    pub fn next_record(&mut self) -> Option<Result<TelemetryRecord, DecodeError>> {
        let Some(open) = self.buffer.iter().position(|&b| b == b'{') else {
            // Nothing here can start a record
            self.buffer.clear();
            return None;
        };
        self.buffer.drain(..open);

        let Some(close) = self.buffer.iter().position(|&b| b == b'}') else {
            if self.buffer.len() > MAX_PENDING_BYTES {
                let discarded = self.buffer.len();
                self.buffer.clear();
                return Some(Err(DecodeError::Overflow { discarded }));
            }
            return None;
        };

        // A record cut short by a dropped send leaves a stray '{' ahead of
        // the next complete record; start from the last opening brace.
        let start = self.buffer[..close]
            .iter()
            .rposition(|&b| b == b'{')
            .unwrap_or(0);
        if start > 0 {
            log::debug!("Skipping {} bytes of truncated record", start);
        }

        let record = &self.buffer[start..=close];
        let parsed = serde_json::from_slice::<TelemetryRecord>(record).map_err(|source| {
            DecodeError::Malformed {
                sequence: scan_sequence(record),
                source,
            }
        });
        self.buffer.drain(..=close);

        Some(parsed)
    }
}

/// Lenient lookup of `"s":<digits>` in a record serde rejected
fn scan_sequence(record: &[u8]) -> Option<u32> {
    const KEY: &[u8] = b"\"s\":";
    let at = record.windows(KEY.len()).position(|w| w == KEY)? + KEY.len();
    let digits = record[at..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    core::str::from_utf8(&record[at..at + digits])
        .ok()?
        .parse()
        .ok()
}

impl Default for TelemetryDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Detects missing sample numbers in a wrapping u32 sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceTracker {
    last: Option<u32>,
    missing: u64,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sequence number and return how many were skipped before it
    ///
    /// A jump backwards (node restart, reordering) resets the tracker and
    /// counts nothing.
    pub fn observe(&mut self, sequence: u32) -> u32 {
        let gap = match self.last {
            Some(last) => {
                let gap = sequence.wrapping_sub(last.wrapping_add(1));
                if gap > u32::MAX / 2 {
                    0
                } else {
                    gap
                }
            }
            None => 0,
        };
        self.last = Some(sequence);
        self.missing += gap as u64;
        gap
    }

    /// Total records skipped so far
    pub fn missing(&self) -> u64 {
        self.missing
    }
}
