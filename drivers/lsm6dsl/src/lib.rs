//! LSM6DSL 6-Axis IMU I2C Driver
//!
//! Blocking driver for the ST LSM6DSL accelerometer + gyroscope on any
//! `embedded-hal` 1.0 I2C bus.
//!
//! # Features
//!
//! - WHO_AM_I check and software reset on init
//! - Fixed 416 Hz output rate, ±2 g and ±2000 dps full scale
//! - Raw counts or scaled g / deg/s readings
//! - `no_std` compatible
//!
//! # Example
//!
//! ```ignore
//! use lsm6dsl::{Lsm6dsl, ADDR_SA0_LOW};
//!
//! let mut imu = Lsm6dsl::new(i2c, ADDR_SA0_LOW);
//! imu.init(&mut delay)?;
//!
//! let [ax, ay, az] = imu.read_accel_g()?;
//! let [gx, gy, gz] = imu.read_gyro_dps()?;
//! ```

#![cfg_attr(not(test), no_std)]

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

#[cfg(feature = "logging")]
use log::{debug, warn};

/// I2C address with SA0 tied low
pub const ADDR_SA0_LOW: u8 = 0x6A;
/// I2C address with SA0 tied high
pub const ADDR_SA0_HIGH: u8 = 0x6B;

/// Expected WHO_AM_I response
pub const DEVICE_ID: u8 = 0x6A;

/// Accelerometer sensitivity at ±2 g (0.061 mg/LSB)
pub const ACCEL_SENSITIVITY_G: f64 = 0.000061;
/// Gyroscope sensitivity at ±2000 dps (70 mdps/LSB)
pub const GYRO_SENSITIVITY_DPS: f64 = 0.07;

/// Register map (subset)
mod reg {
    pub const WHO_AM_I: u8 = 0x0F;
    pub const CTRL1_XL: u8 = 0x10;
    pub const CTRL2_G: u8 = 0x11;
    pub const CTRL3_C: u8 = 0x12;
    pub const STATUS_REG: u8 = 0x1E;
    pub const OUTX_L_G: u8 = 0x22;
    pub const OUTX_L_XL: u8 = 0x28;
}

/// 416 Hz, ±2 g
const CTRL1_XL_416HZ_2G: u8 = 0x60;
/// 416 Hz, ±2000 dps
const CTRL2_G_416HZ_2000DPS: u8 = 0x6C;
/// Block data update + register auto-increment
const CTRL3_C_BDU_IF_INC: u8 = 0x44;
const CTRL3_C_SW_RESET: u8 = 0x01;

const STATUS_XLDA: u8 = 0x01;
const STATUS_GDA: u8 = 0x02;

/// Reset completes in ~50 µs; leave margin
const RESET_DELAY_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Underlying bus error
    Bus(E),
    /// WHO_AM_I returned something other than [`DEVICE_ID`]
    WrongDevice(u8),
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Bus(err)
    }
}

/// One burst read of both sensors, raw counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub gyro: [i16; 3],
    pub accel: [i16; 3],
}

pub struct Lsm6dsl<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Lsm6dsl<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Verify the part, reset it and configure both sensors
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        let id = self.who_am_i()?;
        if id != DEVICE_ID {
            #[cfg(feature = "logging")]
            warn!("LSM6DSL: unexpected WHO_AM_I 0x{:02X}", id);
            return Err(Error::WrongDevice(id));
        }

        self.write_register(reg::CTRL3_C, CTRL3_C_SW_RESET)?;
        delay.delay_ms(RESET_DELAY_MS);

        self.write_register(reg::CTRL3_C, CTRL3_C_BDU_IF_INC)?;
        self.write_register(reg::CTRL1_XL, CTRL1_XL_416HZ_2G)?;
        self.write_register(reg::CTRL2_G, CTRL2_G_416HZ_2000DPS)?;

        #[cfg(feature = "logging")]
        debug!("LSM6DSL at 0x{:02X}: 416 Hz, ±2 g, ±2000 dps", self.address);

        Ok(())
    }

    pub fn who_am_i(&mut self) -> Result<u8, Error<E>> {
        self.read_register(reg::WHO_AM_I)
    }

    /// True when both sensors have a new sample
    pub fn data_ready(&mut self) -> Result<bool, Error<E>> {
        let status = self.read_register(reg::STATUS_REG)?;
        Ok(status & (STATUS_XLDA | STATUS_GDA) == (STATUS_XLDA | STATUS_GDA))
    }

    pub fn read_accel_raw(&mut self) -> Result<[i16; 3], Error<E>> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[reg::OUTX_L_XL], &mut buf)?;
        Ok(axes(&buf))
    }

    pub fn read_gyro_raw(&mut self) -> Result<[i16; 3], Error<E>> {
        let mut buf = [0u8; 6];
        self.i2c.write_read(self.address, &[reg::OUTX_L_G], &mut buf)?;
        Ok(axes(&buf))
    }

    /// Gyro (0x22-0x27) and accel (0x28-0x2D) in one transaction
    pub fn read_raw(&mut self) -> Result<RawSample, Error<E>> {
        let mut buf = [0u8; 12];
        self.i2c.write_read(self.address, &[reg::OUTX_L_G], &mut buf)?;
        Ok(RawSample {
            gyro: axes(&buf[..6]),
            accel: axes(&buf[6..]),
        })
    }

    /// Acceleration in g
    pub fn read_accel_g(&mut self) -> Result<[f64; 3], Error<E>> {
        Ok(scale(self.read_accel_raw()?, ACCEL_SENSITIVITY_G))
    }

    /// Angular rate in deg/s
    pub fn read_gyro_dps(&mut self) -> Result<[f64; 3], Error<E>> {
        Ok(scale(self.read_gyro_raw()?, GYRO_SENSITIVITY_DPS))
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c.write(self.address, &[register, value])?;
        Ok(())
    }
}

/// Little-endian X, Y, Z
fn axes(buf: &[u8]) -> [i16; 3] {
    [
        i16::from_le_bytes([buf[0], buf[1]]),
        i16::from_le_bytes([buf[2], buf[3]]),
        i16::from_le_bytes([buf[4], buf[5]]),
    ]
}

fn scale(raw: [i16; 3], sensitivity: f64) -> [f64; 3] {
    raw.map(|v| v as f64 * sensitivity)
}
