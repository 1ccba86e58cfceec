//! Attitude Telemetry Monitor
//!
//! Listens for one attitude node, decodes its record stream and prints
//! pitch / roll / yaw per record. Gaps in the sample counter are reported as
//! dropped records.
//!
//! Run with: cargo run -p telemetry-monitor -- --port 30000

use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};

use anyhow::{Context, Result};
use attitude_telemetry::{DecodeError, SequenceTracker, TelemetryDecoder, TelemetryRecord};
use clap::Parser;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "telemetry-monitor")]
#[command(about = "Print attitude telemetry streamed by an attitude node", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// TCP port the node connects to
    #[arg(short, long, default_value_t = 30000)]
    port: u16,

    /// Print only gap reports, not every record
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

/// What one session looked like
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Summary {
    records: u64,
    malformed: u64,
    missing: u64,
}

fn format_record(record: &TelemetryRecord) -> String {
    format!(
        "pitch: {:.2}  roll: {:.2}  yaw: {:.2}",
        record.pitch, record.roll, record.yaw
    )
}

/// Decode until the peer closes the stream
fn pump<R: Read, W: Write>(mut reader: R, out: &mut W, quiet: bool) -> Result<Summary> {
    let mut decoder = TelemetryDecoder::new();
    let mut tracker = SequenceTracker::new();
    let mut summary = Summary::default();
    let mut buf = [0u8; 1024];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("reading telemetry stream"),
        };
        decoder.push_data(&buf[..n]);

        while let Some(result) = decoder.next_record() {
            match result {
                Ok(record) => {
                    summary.records += 1;
                    let gap = tracker.observe(record.sequence);
                    if gap > 0 {
                        writeln!(out, "-- {} record(s) dropped before s={}", gap, record.sequence)?;
                    }
                    if !quiet {
                        writeln!(out, "{}", format_record(&record))?;
                    }
                }
                Err(DecodeError::Malformed { sequence, source }) => {
                    summary.malformed += 1;
                    warn!("Skipping malformed record (s={:?}): {}", sequence, source);
                    // Received, just not printable; keep it out of the gap count
                    if let Some(sequence) = sequence {
                        let gap = tracker.observe(sequence);
                        if gap > 0 {
                            writeln!(out, "-- {} record(s) dropped before s={}", gap, sequence)?;
                        }
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    }

    summary.missing = tracker.missing();
    Ok(summary)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telemetry_monitor=info,attitude_telemetry=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = SocketAddr::new(args.bind, args.port);

    let listener = TcpListener::bind(addr).with_context(|| format!("binding {}", addr))?;
    info!("Waiting for an attitude node on {}", addr);

    let (stream, peer) = listener.accept().context("accepting connection")?;
    info!("Node connected from {}", peer);

    let stdout = io::stdout();
    let summary = pump(stream, &mut stdout.lock(), args.quiet)?;

    info!(
        "Node disconnected: {} record(s), {} dropped, {} malformed",
        summary.records, summary.missing, summary.malformed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_format_two_decimals_pitch_first() {
        let record = TelemetryRecord {
            roll: 1.234,
            pitch: -5.678,
            yaw: 90.0,
            sequence: 1,
        };
        assert_eq!(
            format_record(&record),
            "pitch: -5.68  roll: 1.23  yaw: 90.00"
        );
    }

    #[test]
    fn test_pump_reports_gaps() {
        let stream = concat!(
            r#"{"x":0.000000,"y":0.000000,"z":0.000000,"s":1}"#,
            r#"{"x":0.000000,"y":0.000000,"z":1.000000,"s":2}"#,
            r#"{"x":0.000000,"y":0.000000,"z":4.000000,"s":5}"#,
        );
        let mut out = Vec::new();
        let summary = pump(Cursor::new(stream), &mut out, false).unwrap();

        assert_eq!(
            summary,
            Summary {
                records: 3,
                malformed: 0,
                missing: 2,
            }
        );
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "-- 2 record(s) dropped before s=5");
        assert_eq!(lines[3], "pitch: 0.00  roll: 0.00  yaw: 4.00");
    }

    #[test]
    fn test_pump_counts_malformed_and_continues() {
        let stream = concat!(
            r#"{"x":NaN,"y":0.000000,"z":0.000000,"s":1}"#,
            "\n",
            r#"{"x":0.500000,"y":0.000000,"z":0.000000,"s":2}"#,
            "\n",
        );
        let mut out = Vec::new();
        let summary = pump(Cursor::new(stream), &mut out, true).unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(summary.malformed, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_malformed_record_is_not_reported_as_dropped() {
        let stream = concat!(
            r#"{"x":0.000000,"y":0.000000,"z":0.000000,"s":1}"#,
            r#"{"x":NaN,"y":0.000000,"z":0.000000,"s":2}"#,
            r#"{"x":0.000000,"y":0.000000,"z":0.000000,"s":3}"#,
        );
        let mut out = Vec::new();
        let summary = pump(Cursor::new(stream), &mut out, false).unwrap();

        assert_eq!(
            summary,
            Summary {
                records: 2,
                malformed: 1,
                missing: 0,
            }
        );
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("dropped"));
    }
}
