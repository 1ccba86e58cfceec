/// Configuration management for the attitude node
/// Everything is fixed at compile time; there is no runtime config store
use attitude_telemetry::{AngleWrap, CalibrationConfig, EstimatorConfig, Framing, StreamConfig};
use log::warn;

/// Network configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network to join (station mode only)
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    /// Telemetry receiver, `host:port`
    pub telemetry_server: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            // Placeholders - MUST set via environment variables
            wifi_ssid: "AttitudeNet",
            wifi_password: "",
            telemetry_server: "192.168.1.104:30000",
        }
    }
}

/// IMU bus configuration
#[derive(Debug, Clone, Copy)]
pub struct ImuConfig {
    pub address: u8,
    pub i2c_khz: u32,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            address: lsm6dsl::ADDR_SA0_LOW,
            i2c_khz: 400,
        }
    }
}

/// Master system configuration
#[derive(Debug, Clone, Default)]
pub struct SystemConfig {
    pub network: NetworkConfig,
    pub imu: ImuConfig,
    pub calibration: CalibrationConfig,
    pub estimator: EstimatorConfig,
    pub stream: StreamConfig,
}

impl SystemConfig {
    /// Create configuration from environment variables (compile-time)
    ///
    /// ```bash
    /// export WIFI_SSID="YourNetworkName"
    /// export WIFI_PASSWORD="YourPassword"
    /// export TELEMETRY_SERVER="192.168.1.104:30000"  # Your laptop IP
    /// export TELEMETRY_FRAMING="newline"             # bare (default) | newline
    /// export ANGLE_WRAP="signed180"                  # unbounded (default) | signed180
    /// export CALIB_SAMPLES="200"                     # default 1
    /// cargo build --release
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ssid) = option_env!("WIFI_SSID") {
            config.network.wifi_ssid = ssid;
        }
        if let Some(password) = option_env!("WIFI_PASSWORD") {
            config.network.wifi_password = password;
        }
        if let Some(server) = option_env!("TELEMETRY_SERVER") {
            config.network.telemetry_server = server;
        }

        if let Some(framing) = option_env!("TELEMETRY_FRAMING") {
            config.stream.framing = match framing.to_lowercase().as_str() {
                "newline" | "line" | "nl" => Framing::Newline,
                "bare" | "none" => Framing::Bare,
                other => {
                    warn!("Unknown TELEMETRY_FRAMING '{}', using bare", other);
                    Framing::Bare
                }
            };
        }

        if let Some(wrap) = option_env!("ANGLE_WRAP") {
            config.estimator.wrap = match wrap.to_lowercase().as_str() {
                "signed180" | "wrap" | "180" => AngleWrap::Signed180,
                "unbounded" | "none" => AngleWrap::Unbounded,
                other => {
                    warn!("Unknown ANGLE_WRAP '{}', angles unbounded", other);
                    AngleWrap::Unbounded
                }
            };
        }

        if let Some(samples) = option_env!("CALIB_SAMPLES") {
            match samples.parse::<usize>() {
                Ok(n) => config.calibration.samples = n,
                Err(_) => warn!("Invalid CALIB_SAMPLES '{}', using 1", samples),
            }
        }
        // Calibration samples follow the loop rate
        config.calibration.sample_interval_ms = config.stream.tick_period_ms;

        config
    }
}
