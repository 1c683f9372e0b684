//! Compensation formulas mapping raw ADC counts to physical units.
//!
//! These are the floating-point formulas from the Bosch reference
//! implementation, kept free of any bus I/O so they can be verified against
//! fixed vectors. Pressure and humidity compensation both consume the fine
//! temperature value produced by [`Calibration::compensate_temperature`];
//! the value must come from the same measurement cycle as the raw pressure
//! and humidity counts.

use crate::calib::Calibration;

/// Result of temperature compensation.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedTemp {
    /// Temperature in degrees Celsius, 0.01 degree resolution.
    pub celsius: f64,
    /// Unit-less fine temperature accumulator. Required input for pressure
    /// and humidity compensation of the same cycle.
    pub t_fine: f64,
}

impl Calibration {
    /// Compensates a raw 20-bit temperature reading.
    pub fn compensate_temperature(&self, raw: u32) -> CompensatedTemp {
        let adc = raw as f64;
        let var1 = (adc / 16384.0 - (self.t1 as f64) / 1024.0) * self.t2 as f64;
        let var2 = ((adc / 131072.0 - (self.t1 as f64) / 8192.0)
            * (adc / 131072.0 - (self.t1 as f64) / 8192.0))
            * (self.t3 as f64 * 16.0);
        let t_fine = var1 + var2;
        CompensatedTemp {
            celsius: t_fine / 5120.0,
            t_fine,
        }
    }

    /// Compensates a raw 20-bit pressure reading. Returns pascal.
    ///
    /// `t_fine` must come from [`Self::compensate_temperature`] of the same
    /// measurement cycle; pressure drifts with die temperature and the
    /// polynomial corrects for it.
    pub fn compensate_pressure(&self, raw: u32, t_fine: f64) -> f64 {
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * (self.p6 as f64 / 131072.0);
        var2 += var1 * self.p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.p4 as f64 * 65536.0;
        var1 = (self.p3 as f64 * var1 * var1 / 16384.0 + self.p2 as f64 * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.p1 as f64;

        // guards the division below, as in the reference implementation
        if var1 as i32 == 0 {
            return 0.0;
        }

        let mut pressure = 1048576.0 - raw as f64;
        pressure = (pressure - var2 / 4096.0) * 6250.0 / var1;
        var1 = self.p9 as f64 * pressure * pressure / 2147483648.0;
        var2 = pressure * (self.p8 as f64 / 32768.0);
        let var3 = (pressure / 256.0)
            * (pressure / 256.0)
            * (pressure / 256.0)
            * (self.p10 as f64 / 131072.0);

        pressure + (var1 + var2 + var3 + self.p7 as f64 * 128.0) / 16.0
    }

    /// Compensates a raw 16-bit humidity reading. Returns percent relative
    /// humidity, clamped to the physical range `[0, 100]`.
    ///
    /// The temperature term is derived from `t_fine` here rather than taken
    /// as a separate argument, so humidity can never be paired with a
    /// temperature from a different cycle.
    pub fn compensate_humidity(&self, raw: u16, t_fine: f64) -> f64 {
        let temp_comp = t_fine / 5120.0;
        let var1 =
            raw as f64 - ((self.h1 as f64 * 16.0) + ((self.h3 as f64 / 2.0) * temp_comp));
        let var2 = var1
            * ((self.h2 as f64 / 262144.0)
                * (1.0
                    + ((self.h4 as f64 / 16384.0) * temp_comp)
                    + ((self.h5 as f64 / 1048576.0) * temp_comp * temp_comp)));
        let var3 = self.h6 as f64 / 16384.0;
        let var4 = self.h7 as f64 / 2097152.0;
        let humidity = var2 + ((var3 + var4 * temp_comp) * var2 * var2);

        humidity.clamp(0.0, 100.0)
    }
}
