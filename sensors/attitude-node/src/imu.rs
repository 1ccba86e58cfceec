/// IMU sensor adapter for the LSM6DSL driver
///
/// Turns raw driver counts into the scaled samples the estimator consumes.
use core::fmt::Debug;

use attitude_telemetry::{SensorError, SensorSource, Vector3};
use embedded_hal::i2c::I2c;
use log::error;
use lsm6dsl::{Error, Lsm6dsl, ACCEL_SENSITIVITY_G, GYRO_SENSITIVITY_DPS};

pub struct ImuSensor<I2C> {
    driver: Lsm6dsl<I2C>,
}

impl<I2C, E> ImuSensor<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    /// Wrap an initialised driver
    pub fn new(driver: Lsm6dsl<I2C>) -> Self {
        Self { driver }
    }
}

fn to_sensor_error<E: Debug>(err: Error<E>) -> SensorError {
    error!("LSM6DSL read failed: {:?}", err);
    match err {
        Error::Bus(_) => SensorError::IoError,
        Error::WrongDevice(_) => SensorError::NotReady,
    }
}

impl<I2C, E> SensorSource for ImuSensor<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    fn read_acceleration(&mut self) -> Result<Vector3, SensorError> {
        let raw = self.driver.read_accel_raw().map_err(to_sensor_error)?;
        Ok(Vector3::from_counts(raw, ACCEL_SENSITIVITY_G))
    }

    fn read_angular_rate(&mut self) -> Result<Vector3, SensorError> {
        let raw = self.driver.read_gyro_raw().map_err(to_sensor_error)?;
        Ok(Vector3::from_counts(raw, GYRO_SENSITIVITY_DPS))
    }
}
