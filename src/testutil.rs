//! Shared fixtures for the unit tests: a realistic calibration set, its
//! encoded register windows, reference compensation outputs and canned bus
//! transactions.

use embedded_hal_mock::eh1::i2c::Transaction as I2cTransaction;

use crate::{regs, Calibration, Config, ConfigBuilder, IirFilter, Milliseconds};

pub const ADDR: u8 = 0x76;

/// Window 0xE1..=0xEE, encoding the coefficient set below.
pub const CAL_1: [u8; 14] = [
    0x3F, 0xDF, 0x2C, 0x00, 0x2D, 0x14, 0x78, 0x9C, 0x18, 0x66, 0xAF, 0xE8, 0xE2, 0x12,
];
/// Window 0x8A..=0xA0.
pub const CAL_2: [u8; 23] = [
    0xDF, 0x67, 0x03, 0x00, 0xAA, 0x8D, 0x8A, 0xD7, 0x58, 0x00, 0x50, 0x20, 0x84, 0xFF, 0x2D,
    0x1E, 0x00, 0x00, 0x80, 0xF0, 0xD9, 0xF5, 0x1E,
];

pub fn reference_calibration() -> Calibration {
    Calibration {
        t1: 26136,
        t2: 26591,
        t3: 3,
        p1: 36266,
        p2: -10358,
        p3: 88,
        p4: 8272,
        p5: -124,
        p6: 30,
        p7: 45,
        p8: -3968,
        p9: -2599,
        p10: 30,
        h1: 719,
        h2: 1021,
        h3: 0,
        h4: 45,
        h5: 20,
        h6: 120,
        h7: -100,
        gh1: -30,
        gh2: -5969,
        gh3: 18,
    }
}

/// Raw counts encoded in [`DATA_BLOCK`].
pub const RAW_PRESSURE: u32 = 326_343;
pub const RAW_TEMPERATURE: u32 = 492_418;
pub const RAW_HUMIDITY: u16 = 25_574;

/// Expected compensation outputs for the raw counts above.
pub const REF_T_FINE: f64 = 120509.1147213094;
pub const REF_TEMPERATURE: f64 = 23.53693646900574;
pub const REF_PRESSURE: f64 = 101123.34239036379;
pub const REF_HUMIDITY: f64 = 80.45297946956313;

pub const DATA_BLOCK: [u8; 8] = [0x4F, 0xAC, 0x70, 0x78, 0x38, 0x20, 0x63, 0xE6];
/// Same pressure and humidity bytes as [`DATA_BLOCK`], colder temperature.
pub const DATA_BLOCK_COLD: [u8; 8] = [0x4F, 0xAC, 0x70, 0x70, 0x38, 0x20, 0x63, 0xE6];
pub const REF_TEMPERATURE_COLD: f64 = 13.147757930683293;

/// Register bytes [`test_config`] encodes to.
pub const CTRL_MEAS_SLEEP: u8 = 0x6C;
pub const CTRL_MEAS_FORCED: u8 = 0x6D;
pub const CTRL_HUM: u8 = 0x03;
pub const CONFIG_REG: u8 = 0x08;

/// 4x oversampling on every channel, filter 4, fast polls.
pub fn test_config() -> Config {
    ConfigBuilder::new()
        .filter(IirFilter::X4)
        .poll_interval(Milliseconds(1))
        .build()
}

pub fn init_transactions() -> Vec<I2cTransaction> {
    vec![
        I2cTransaction::write_read(ADDR, vec![regs::ADDR_VARIANT_ID], vec![0x00]),
        I2cTransaction::write_read(ADDR, vec![regs::ADDR_CHIP_ID], vec![crate::CHIP_ID]),
        I2cTransaction::write_read(ADDR, vec![regs::ADDR_CAL_1], CAL_1.to_vec()),
        I2cTransaction::write_read(ADDR, vec![regs::ADDR_CAL_2], CAL_2.to_vec()),
        I2cTransaction::write(
            ADDR,
            vec![
                regs::ADDR_CTRL_MEAS,
                CTRL_MEAS_SLEEP,
                regs::ADDR_CTRL_HUM,
                CTRL_HUM,
                regs::ADDR_CONFIG,
                CONFIG_REG,
                regs::ADDR_CTRL_MEAS,
                CTRL_MEAS_SLEEP,
            ],
        ),
    ]
}

/// One forced cycle: trigger, one busy poll, the ready poll, the block read.
pub fn measurement_transactions(block: &[u8; 8]) -> Vec<I2cTransaction> {
    vec![
        I2cTransaction::write(
            ADDR,
            vec![
                regs::ADDR_CTRL_HUM,
                CTRL_HUM,
                regs::ADDR_CONFIG,
                CONFIG_REG,
                regs::ADDR_CTRL_MEAS,
                CTRL_MEAS_FORCED,
            ],
        ),
        I2cTransaction::write_read(
            ADDR,
            vec![regs::ADDR_EAS_STATUS_0],
            vec![regs::STATUS_MEASURING],
        ),
        I2cTransaction::write_read(
            ADDR,
            vec![regs::ADDR_EAS_STATUS_0],
            vec![regs::STATUS_NEW_DATA],
        ),
        I2cTransaction::write_read(ADDR, vec![regs::ADDR_PRESS_MSB], block.to_vec()),
    ]
}

/// The filter-off/sleep write issued when the sampler halts the device.
pub fn sleep_transactions() -> Vec<I2cTransaction> {
    vec![I2cTransaction::write(
        ADDR,
        vec![regs::ADDR_CONFIG, 0x00, regs::ADDR_CTRL_MEAS, CTRL_MEAS_SLEEP],
    )]
}
