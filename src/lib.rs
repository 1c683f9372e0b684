#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

//! # BME680/BME688 Environmental Sensor Driver
//!
//! Async driver for the Bosch BME680/BME688 temperature, pressure and
//! humidity sensor, over I2C or SPI.
//!
//! Measurements run in forced mode: every cycle triggers exactly one
//! conversion and the device returns to sleep by itself. One-shot readings go
//! through [`Bme68x::measure`]; [`sampler::Sampler`] adds a supervised
//! continuous-sampling worker with a single-slot hand-off channel and clean
//! start/stop semantics.
//!
//! ## Units
//! - **Temperature**: degrees Celsius.
//! - **Pressure**: Pascal, end to end. `101325.0` is 1013.25 hPa; convert at
//!   the presentation layer if hectopascal is wanted.
//! - **Humidity**: percent relative humidity, clamped to `[0, 100]`.
//!
//! ## Scope
//! The gas-resistance channel and its heater control are not supported; the
//! gas calibration words are decoded and otherwise ignored. The BME688's
//! parallel mode is never used.

mod calib;
mod calc;
mod regs;
pub mod sampler;
mod settings;
#[cfg(test)]
mod testutil;
mod transport;

pub use calc::CompensatedTemp;
pub use calib::Calibration;
pub use sampler::Sampler;
pub use settings::{Config, ConfigBuilder, IirFilter, Milliseconds, Oversampling};
pub use transport::{Address, Bme68xBus, I2cBus, SpiBus};

use embedded_hal_async::delay::DelayNs;

/// Value of the chip-ID register on every supported part.
pub const CHIP_ID: u8 = 0x61;

/// Errors produced by the BME68x driver.
pub mod error {
    /// Driver error, generic over the underlying bus error.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Bme68xError<E> {
        /// Bus I/O failure. Carries the raw bus error and the name of the
        /// device the transaction was addressed to. The driver never retries;
        /// retry policy belongs to the caller.
        Transport { device: &'static str, source: E },
        /// The chip-ID register did not read back [`crate::CHIP_ID`].
        /// Construction fails; the part on the bus is not a BME680/BME688.
        UnsupportedDevice { chip_id: u8 },
        /// A one-shot measurement was requested while continuous sampling
        /// owns the device. Stop the sampler first, or read its output.
        AlreadySampling,
        /// The conversion did not finish within the configured
        /// [`crate::Config::max_conversion_wait`].
        Timeout,
        /// Pressure or humidity oversampling enabled without temperature
        /// oversampling, which their compensation depends on.
        InvalidConfig,
    }

    /// Result type alias for BME68x operations.
    pub type Result<T, E> = core::result::Result<T, Bme68xError<E>>;
}

use error::{Bme68xError, Result};

/// Hardware variant, distinguished by the variant-ID register.
///
/// The two parts share a register map; the BME688 adds gas-scanning features
/// this driver does not use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    Bme680,
    Bme688,
}

impl Variant {
    pub const fn name(&self) -> &'static str {
        match self {
            Variant::Bme680 => "BME680",
            Variant::Bme688 => "BME688",
        }
    }
}

/// A compensated measurement in physical units.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Pascal. 0.0 when pressure sampling is disabled.
    pub pressure: f64,
    /// Percent relative humidity. `None` when humidity sampling is disabled.
    pub humidity: Option<f64>,
}

/// Raw ADC counts extracted from the 8-byte data block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawSample {
    /// 20-bit pressure count.
    pub pressure: u32,
    /// 20-bit temperature count.
    pub temperature: u32,
    /// 16-bit humidity count.
    pub humidity: u16,
}

impl RawSample {
    /// Pressure and temperature are `(MSB << 12) | (LSB << 4) | (XLSB >> 4)`;
    /// humidity is a plain big-endian 16-bit value.
    pub(crate) fn from_block(block: &[u8; regs::DATA_LEN]) -> Self {
        RawSample {
            pressure: (block[0] as u32) << 12 | (block[1] as u32) << 4 | (block[2] as u32) >> 4,
            temperature: (block[3] as u32) << 12 | (block[4] as u32) << 4 | (block[5] as u32) >> 4,
            humidity: u16::from_be_bytes([block[6], block[7]]),
        }
    }
}

/// An initialized BME680/BME688.
///
/// Construction via [`Bme68x::init`] validates the chip ID, decodes the
/// calibration coefficients and writes the acquisition configuration; the
/// returned device is ready to measure. The configuration stays fixed for
/// the device's lifetime.
#[derive(Debug)]
pub struct Bme68x<B, D> {
    bus: B,
    delay: D,
    config: Config,
    variant: Variant,
    calib: Calibration,
}

impl<B, D> Bme68x<B, D>
where
    B: Bme68xBus,
    D: DelayNs,
{
    /// Probes and configures the sensor.
    ///
    /// Reads the variant and chip-ID registers, fails with
    /// [`Bme68xError::UnsupportedDevice`] on a foreign part, decodes both
    /// calibration windows and writes the oversampling/filter configuration
    /// with the device held in sleep mode.
    pub async fn init(mut bus: B, delay: D, config: Config) -> Result<Self, B::Error> {
        if !config.is_valid() {
            return Err(Bme68xError::InvalidConfig);
        }

        let mut byte = [0u8; 1];
        bus.read_regs(regs::ADDR_VARIANT_ID, &mut byte)
            .await
            .map_err(|source| Bme68xError::Transport {
                device: "BME68x",
                source,
            })?;
        let variant = if byte[0] == 1 {
            Variant::Bme688
        } else {
            Variant::Bme680
        };
        let wrap = |source| Bme68xError::Transport {
            device: variant.name(),
            source,
        };

        bus.read_regs(regs::ADDR_CHIP_ID, &mut byte)
            .await
            .map_err(wrap)?;
        if byte[0] != CHIP_ID {
            return Err(Bme68xError::UnsupportedDevice { chip_id: byte[0] });
        }

        let mut cal1 = [0u8; regs::CAL_1_LEN];
        bus.read_regs(regs::ADDR_CAL_1, &mut cal1).await.map_err(wrap)?;
        let mut cal2 = [0u8; regs::CAL_2_LEN];
        bus.read_regs(regs::ADDR_CAL_2, &mut cal2).await.map_err(wrap)?;
        let calib = Calibration::parse(&cal1, &cal2);

        // Sleep first: a device left measuring would ignore the settings.
        // ctrl_meas is written again last so the mode bits land on top of the
        // final acquisition configuration.
        bus.write_regs(&[
            (regs::ADDR_CTRL_MEAS, config.ctrl_meas(regs::MODE_SLEEP)),
            (regs::ADDR_CTRL_HUM, config.ctrl_hum()),
            (regs::ADDR_CONFIG, config.config_reg()),
            (regs::ADDR_CTRL_MEAS, config.ctrl_meas(regs::MODE_SLEEP)),
        ])
        .await
        .map_err(wrap)?;

        Ok(Bme68x {
            bus,
            delay,
            config,
            variant,
            calib,
        })
    }

    /// Runs one forced-mode measurement cycle.
    ///
    /// Triggers the conversion, polls the status register until the new-data
    /// flag is set, reads the data block and compensates it. The device
    /// returns to sleep on its own; no partial measurement is ever returned.
    pub async fn measure(&mut self) -> Result<Measurement, B::Error> {
        if self.config.is_all_off() {
            // nothing to convert, skip the bus entirely
            return Ok(Measurement::default());
        }
        self.trigger_forced().await?;
        self.wait_for_new_data().await?;
        let raw = self.read_raw().await?;
        Ok(self.compensate(&raw))
    }

    /// Clears the IIR filter and writes sleep mode.
    pub async fn sleep(&mut self) -> Result<(), B::Error> {
        self.write_reg(&[
            (regs::ADDR_CONFIG, (IirFilter::Off as u8) << 2),
            (regs::ADDR_CTRL_MEAS, self.config.ctrl_meas(regs::MODE_SLEEP)),
        ])
        .await
    }

    /// The variant detected at initialization.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The decoded factory calibration.
    pub fn calibration(&self) -> &Calibration {
        &self.calib
    }

    /// The acquisition configuration the device was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Releases the underlying bus.
    pub fn free(self) -> B {
        self.bus
    }

    /// Writes the acquisition settings with the mode bits set to forced,
    /// starting one conversion. The mode write goes last.
    async fn trigger_forced(&mut self) -> Result<(), B::Error> {
        self.write_reg(&[
            (regs::ADDR_CTRL_HUM, self.config.ctrl_hum()),
            (regs::ADDR_CONFIG, self.config.config_reg()),
            (regs::ADDR_CTRL_MEAS, self.config.ctrl_meas(regs::MODE_FORCED)),
        ])
        .await
    }

    /// Polls eas_status_0 until the new-data flag is set.
    ///
    /// Without a configured wait limit the hardware's worst-case conversion
    /// time is trusted and the loop has no timeout of its own.
    async fn wait_for_new_data(&mut self) -> Result<(), B::Error> {
        let mut waited = 0u32;
        loop {
            let status = self.read_reg_byte(regs::ADDR_EAS_STATUS_0).await?;
            if status & regs::STATUS_NEW_DATA != 0 {
                return Ok(());
            }
            if let Some(limit) = self.config.max_conversion_wait {
                if waited >= limit.0 {
                    return Err(Bme68xError::Timeout);
                }
            }
            self.delay.delay_ms(self.config.poll_interval.0).await;
            waited = waited.saturating_add(self.config.poll_interval.0);
        }
    }

    /// Burst-reads the 8-byte pressure/temperature/humidity block.
    async fn read_raw(&mut self) -> Result<RawSample, B::Error> {
        let mut block = [0u8; regs::DATA_LEN];
        self.read_into(regs::ADDR_PRESS_MSB, &mut block).await?;
        Ok(RawSample::from_block(&block))
    }

    fn compensate(&self, raw: &RawSample) -> Measurement {
        let temp = self.calib.compensate_temperature(raw.temperature);
        let pressure = if self.config.pressure != Oversampling::Off {
            self.calib.compensate_pressure(raw.pressure, temp.t_fine)
        } else {
            0.0
        };
        let humidity = if self.config.humidity != Oversampling::Off {
            Some(self.calib.compensate_humidity(raw.humidity, temp.t_fine))
        } else {
            None
        };
        Measurement {
            temperature: temp.celsius,
            pressure,
            humidity,
        }
    }

    async fn read_into(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), B::Error> {
        let device = self.variant.name();
        self.bus
            .read_regs(reg, buf)
            .await
            .map_err(|source| Bme68xError::Transport { device, source })
    }

    async fn read_reg_byte(&mut self, reg: u8) -> Result<u8, B::Error> {
        let mut buf = [0u8; 1];
        self.read_into(reg, &mut buf).await?;
        Ok(buf[0])
    }

    async fn write_reg(&mut self, pairs: &[(u8, u8)]) -> Result<(), B::Error> {
        let device = self.variant.name();
        self.bus
            .write_regs(pairs)
            .await
            .map_err(|source| Bme68xError::Transport { device, source })
    }
}
