//! BME68x register map.
//!
//! Addresses are the same for the BME680 and the BME688; the two parts are
//! told apart by [`ADDR_VARIANT_ID`].

#![allow(dead_code)]

/// Variant ID, read-only. 0 on the BME680, 1 on the BME688.
pub const ADDR_VARIANT_ID: u8 = 0xF0;
/// Chip ID, read-only. Reads back [`crate::CHIP_ID`] on both variants.
pub const ADDR_CHIP_ID: u8 = 0xD0;

/// Soft-reset register. Writing [`RESET_CMD`] restores power-on defaults.
pub const ADDR_RESET: u8 = 0xE0;
pub const RESET_CMD: u8 = 0xB6;

/// First calibration window, 0xE1..=0xEE.
pub const ADDR_CAL_1: u8 = 0xE1;
pub const CAL_1_LEN: usize = 14;
/// Second calibration window, 0x8A..=0xA0.
pub const ADDR_CAL_2: u8 = 0x8A;
pub const CAL_2_LEN: usize = 23;

/// IIR filter configuration.
pub const ADDR_CONFIG: u8 = 0x75;
/// Temperature/pressure oversampling and operating mode.
pub const ADDR_CTRL_MEAS: u8 = 0x74;
/// Humidity oversampling.
pub const ADDR_CTRL_HUM: u8 = 0x72;

/// Measurement status flags.
pub const ADDR_EAS_STATUS_0: u8 = 0x1D;
/// Set once the results of a completed measurement can be read.
pub const STATUS_NEW_DATA: u8 = 1 << 7;
/// Set while the gas heater phase runs. Unused, gas sensing is not supported.
pub const STATUS_GAS_MEASURING: u8 = 1 << 6;
/// Set while a conversion is in progress.
pub const STATUS_MEASURING: u8 = 1 << 5;

/// Start of the contiguous data block: pressure MSB/LSB/XLSB, temperature
/// MSB/LSB/XLSB, humidity MSB/LSB.
pub const ADDR_PRESS_MSB: u8 = 0x1F;
pub const DATA_LEN: usize = 8;

/// Operating mode bits in ctrl_meas[1:0].
pub const MODE_SLEEP: u8 = 0b00;
pub const MODE_FORCED: u8 = 0b01;
