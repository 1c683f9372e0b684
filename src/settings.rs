use crate::regs;

/// Oversampling settings for temperature, pressure and humidity.
///
/// Higher oversampling rates reduce noise through in-hardware averaging, at
/// the cost of a longer conversion and more power per measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement. Disables the channel entirely.
    Off = 0,
    /// 1x oversampling.
    X1 = 1,
    /// 2x oversampling.
    X2 = 2,
    /// 4x oversampling.
    X4 = 3,
    /// 8x oversampling.
    X8 = 4,
    /// 16x oversampling. Best precision, longest conversion.
    X16 = 5,
}

/// Coefficient of the IIR low-pass filter applied to temperature and
/// pressure readings.
///
/// The filter smooths short-lived disturbances (slammed doors, gusts of
/// wind). It is distinct from oversampling and has no effect on humidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IirFilter {
    /// Filter disabled.
    Off = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
    X32 = 5,
    X64 = 6,
    X128 = 7,
}

/// Duration wrapper for type-safety. Stored in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Milliseconds(pub u32);

/// Acquisition configuration, fixed at device construction.
///
/// Temperature oversampling must be enabled whenever pressure or humidity is:
/// both compensations take the fine temperature value of the same cycle as
/// input. [`crate::Bme68x::init`] rejects a configuration that violates this.
///
/// Recommended starting points from the datasheet:
///
/// * Weather monitoring: one manual sample per minute, all channels
///   [`Oversampling::X1`], no filter.
/// * Humidity sensing: one sample per second, pressure off, temperature and
///   humidity [`Oversampling::X1`], no filter.
/// * Indoor navigation: continuous sampling, pressure [`Oversampling::X16`],
///   temperature [`Oversampling::X2`], humidity [`Oversampling::X1`],
///   filter [`IirFilter::X16`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Temperature oversampling.
    pub temperature: Oversampling,
    /// Pressure oversampling.
    pub pressure: Oversampling,
    /// Humidity oversampling.
    pub humidity: Oversampling,
    /// IIR filter coefficient.
    pub filter: IirFilter,
    /// Pause between status-register polls while a conversion runs.
    pub poll_interval: Milliseconds,
    /// Upper bound on the total time spent polling for a result. `None`
    /// trusts the hardware to finish within its worst-case conversion time.
    pub max_conversion_wait: Option<Milliseconds>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            temperature: Oversampling::X4,
            pressure: Oversampling::X4,
            humidity: Oversampling::X4,
            filter: IirFilter::Off,
            poll_interval: Milliseconds(10),
            max_conversion_wait: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Returns `true` if every channel is set to `Off`.
    ///
    /// Used to skip the measurement cycle entirely when there is nothing to
    /// convert.
    pub(crate) fn is_all_off(&self) -> bool {
        self.temperature == Oversampling::Off
            && self.pressure == Oversampling::Off
            && self.humidity == Oversampling::Off
    }

    /// Pressure and humidity compensation require a same-cycle temperature.
    pub(crate) fn is_valid(&self) -> bool {
        self.temperature != Oversampling::Off
            || (self.pressure == Oversampling::Off && self.humidity == Oversampling::Off)
    }

    /// ctrl_meas register value: osrs_t[7:5], osrs_p[4:2], mode[1:0].
    pub(crate) fn ctrl_meas(&self, mode: u8) -> u8 {
        (self.temperature as u8) << 5 | (self.pressure as u8) << 2 | mode
    }

    /// ctrl_hum register value: osrs_h[2:0].
    pub(crate) fn ctrl_hum(&self) -> u8 {
        self.humidity as u8
    }

    /// config register value: filter[4:2].
    pub(crate) fn config_reg(&self) -> u8 {
        (self.filter as u8) << 2
    }
}

/// Builder for [`Config`], starting from the default 4x/4x/4x profile.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the temperature oversampling.
    pub fn temperature_oversampling(mut self, os: Oversampling) -> Self {
        self.config.temperature = os;
        self
    }

    /// Sets the pressure oversampling.
    pub fn pressure_oversampling(mut self, os: Oversampling) -> Self {
        self.config.pressure = os;
        self
    }

    /// Sets the humidity oversampling.
    pub fn humidity_oversampling(mut self, os: Oversampling) -> Self {
        self.config.humidity = os;
        self
    }

    /// Sets the IIR filter coefficient.
    pub fn filter(mut self, filter: IirFilter) -> Self {
        self.config.filter = filter;
        self
    }

    /// Sets the pause between conversion-status polls.
    pub fn poll_interval(mut self, interval: Milliseconds) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Bounds the total time spent waiting for a conversion.
    pub fn max_conversion_wait(mut self, limit: Milliseconds) -> Self {
        self.config.max_conversion_wait = Some(limit);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

const _: () = {
    assert!(Oversampling::X16 as u8 <= 0b111);
    assert!(IirFilter::X128 as u8 <= 0b111);
    assert!(regs::MODE_FORCED <= 0b11);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_meas_packs_oversampling_and_mode() {
        let config = Config::builder()
            .temperature_oversampling(Oversampling::X4)
            .pressure_oversampling(Oversampling::X4)
            .humidity_oversampling(Oversampling::X4)
            .filter(IirFilter::X4)
            .build();
        assert_eq!(config.ctrl_meas(regs::MODE_FORCED), 0b011_011_01);
        assert_eq!(config.ctrl_meas(regs::MODE_SLEEP), 0b011_011_00);
        assert_eq!(config.ctrl_hum(), 0b011);
        assert_eq!(config.config_reg(), 0b000_010_00);
    }

    #[test]
    fn pressure_and_humidity_require_temperature() {
        let config = Config::builder()
            .temperature_oversampling(Oversampling::Off)
            .pressure_oversampling(Oversampling::Off)
            .humidity_oversampling(Oversampling::X1)
            .build();
        assert!(!config.is_valid());

        let config = Config::builder()
            .temperature_oversampling(Oversampling::Off)
            .pressure_oversampling(Oversampling::Off)
            .humidity_oversampling(Oversampling::Off)
            .build();
        assert!(config.is_valid());
        assert!(config.is_all_off());

        assert!(Config::default().is_valid());
    }
}
