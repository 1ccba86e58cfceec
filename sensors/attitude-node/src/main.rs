mod config;
mod imu;
mod wifi;

use attitude_telemetry::{
    calibrate_from_source, OrientationEstimator, TcpChannel, TelemetryStreamer,
};
use config::SystemConfig;
use esp_idf_hal::{
    delay::{Delay, FreeRtos},
    i2c::{I2cConfig, I2cDriver},
    peripherals::Peripherals,
    units::FromValueType,
};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use imu::ImuSensor;
use log::{error, info};
use lsm6dsl::Lsm6dsl;
use wifi::WifiManager;

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = SystemConfig::from_env();

    info!("=== ESP32-C3 Attitude Node ===");
    info!(
        "SSID: {}, Server: {}, Period: {} ms, Framing: {:?}, Wrap: {:?}, Calib samples: {}",
        config.network.wifi_ssid,
        config.network.telemetry_server,
        config.stream.tick_period_ms,
        config.stream.framing,
        config.estimator.wrap,
        config.calibration.samples
    );

    if let Err(e) = run(&config) {
        error!("Attitude node stopped: {}", e);
    }

    // Nothing left to do; stay alive so the log stays readable
    loop {
        FreeRtos::delay_ms(1000);
    }
}

/// Bring everything up and stream. Only returns on a fatal error.
fn run(config: &SystemConfig) -> Result<(), Box<dyn std::error::Error>> {
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    // Initialize WiFi
    info!("Initializing WiFi");
    let mut wifi = WifiManager::new(peripherals.modem, sysloop, nvs)?;
    wifi.connect(config.network.wifi_ssid, config.network.wifi_password)?;

    info!("Connecting to {}", config.network.telemetry_server);
    let channel = TcpChannel::connect(
        config.network.telemetry_server,
        config.stream.send_timeout(),
    )?;

    // LSM6DSL on I2C0: SDA=GPIO6, SCL=GPIO7
    let i2c_config = I2cConfig::new().baudrate(config.imu.i2c_khz.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6,
        peripherals.pins.gpio7,
        &i2c_config,
    )?;

    let mut delay = Delay::new_default();
    let mut driver = Lsm6dsl::new(i2c, config.imu.address);
    driver
        .init(&mut delay)
        .map_err(|e| format!("LSM6DSL init failed: {:?}", e))?;
    info!("LSM6DSL ready at 0x{:02X}", driver.address());

    let mut sensor = ImuSensor::new(driver);
    let bias = calibrate_from_source(&mut sensor, &mut delay, &config.calibration)?;

    let estimator = OrientationEstimator::new(bias, config.estimator);
    let mut streamer = TelemetryStreamer::new(sensor, channel, delay, estimator, config.stream);
    streamer.run()?;

    Ok(())
}
