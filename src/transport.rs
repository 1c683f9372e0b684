//! Register transport over I2C or SPI.
//!
//! Both buses expose the same register map; the framing differs. I2C sends
//! the register address and transfers data in the same transaction. SPI
//! carries a read/write flag in the most-significant address bit and clocks
//! a dummy byte ahead of every read response.

use embedded_hal::spi::Operation;
use embedded_hal_async::{i2c, spi};

/// Largest register run the driver reads (the second calibration window).
const MAX_READ: usize = crate::regs::CAL_2_LEN;
/// Largest register/value sequence the driver writes in one transaction.
const MAX_PAIRS: usize = 4;
/// SPI address bit selecting read (1) over write (0).
const SPI_READ: u8 = 0x80;

/// Register-level access to a BME68x, independent of the bus flavor.
///
/// `read_regs` fills `buf` starting at register `reg`; `write_regs` writes a
/// sequence of register/value pairs in a single bus transaction. Failures
/// surface the raw bus error; no retries happen at this layer.
pub trait Bme68xBus {
    type Error;

    async fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    async fn write_regs(&mut self, pairs: &[(u8, u8)]) -> Result<(), Self::Error>;
}

/// I2C device address, selected by the level of the SDO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    /// SDO tied to ground.
    SdoGnd = 0x76,
    /// SDO tied to V_DDIO.
    SdoVddio = 0x77,
}

/// BME68x behind an I2C bus.
#[derive(Debug)]
pub struct I2cBus<I> {
    i2c: I,
    address: u8,
}

impl<I: i2c::I2c> I2cBus<I> {
    pub fn new(i2c: I, address: Address) -> Self {
        I2cBus {
            i2c,
            address: address as u8,
        }
    }

    /// Releases the underlying bus.
    pub fn free(self) -> I {
        self.i2c
    }
}

impl<I: i2c::I2c> Bme68xBus for I2cBus<I> {
    type Error = I::Error;

    async fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[reg], buf).await
    }

    async fn write_regs(&mut self, pairs: &[(u8, u8)]) -> Result<(), Self::Error> {
        debug_assert!(pairs.len() <= MAX_PAIRS);
        let mut frame = [0u8; 2 * MAX_PAIRS];
        for (i, (reg, value)) in pairs.iter().enumerate() {
            frame[2 * i] = *reg;
            frame[2 * i + 1] = *value;
        }
        self.i2c.write(self.address, &frame[..2 * pairs.len()]).await
    }
}

/// BME68x behind a SPI device (chip select handled by the `SpiDevice`).
#[derive(Debug)]
pub struct SpiBus<S> {
    spi: S,
}

impl<S: spi::SpiDevice> SpiBus<S> {
    pub fn new(spi: S) -> Self {
        SpiBus { spi }
    }

    /// Releases the underlying device.
    pub fn free(self) -> S {
        self.spi
    }
}

impl<S: spi::SpiDevice> Bme68xBus for SpiBus<S> {
    type Error = S::Error;

    async fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        debug_assert!(buf.len() <= MAX_READ);
        // Full-duplex frame: while the address byte shifts out, the device
        // clocks back one dummy byte that precedes the register data.
        let mut frame = [0u8; MAX_READ + 1];
        frame[0] = reg | SPI_READ;
        let frame = &mut frame[..buf.len() + 1];
        self.spi
            .transaction(&mut [Operation::TransferInPlace(frame)])
            .await?;
        buf.copy_from_slice(&frame[1..]);
        Ok(())
    }

    async fn write_regs(&mut self, pairs: &[(u8, u8)]) -> Result<(), Self::Error> {
        debug_assert!(pairs.len() <= MAX_PAIRS);
        let mut frame = [0u8; 2 * MAX_PAIRS];
        for (i, (reg, value)) in pairs.iter().enumerate() {
            frame[2 * i] = *reg & !SPI_READ;
            frame[2 * i + 1] = *value;
        }
        self.spi.write(&frame[..2 * pairs.len()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn i2c_read_writes_address_then_reads() {
        let expectations = [I2cTransaction::write_read(
            0x76,
            vec![0x1D],
            vec![0b1000_0000],
        )];
        let mut bus = I2cBus::new(I2cMock::new(&expectations), Address::SdoGnd);

        let mut buf = [0u8; 1];
        block_on(bus.read_regs(0x1D, &mut buf)).unwrap();
        assert_eq!(buf, [0b1000_0000]);

        bus.free().done();
    }

    #[test]
    fn i2c_write_flattens_pairs_into_one_transaction() {
        let expectations = [I2cTransaction::write(
            0x77,
            vec![0x72, 0x03, 0x75, 0x08, 0x74, 0x6D],
        )];
        let mut bus = I2cBus::new(I2cMock::new(&expectations), Address::SdoVddio);

        block_on(bus.write_regs(&[(0x72, 0x03), (0x75, 0x08), (0x74, 0x6D)])).unwrap();

        bus.free().done();
    }

    #[test]
    fn spi_read_sets_read_flag_and_discards_dummy_byte() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0x9D, 0x00, 0x00], vec![0xFF, 0xAA, 0xBB]),
            SpiTransaction::transaction_end(),
        ];
        let mut bus = SpiBus::new(SpiMock::new(&expectations));

        let mut buf = [0u8; 2];
        block_on(bus.read_regs(0x1D, &mut buf)).unwrap();
        // 0xFF is the dummy clocked out during the address byte
        assert_eq!(buf, [0xAA, 0xBB]);

        bus.free().done();
    }

    #[test]
    fn spi_write_clears_the_read_flag() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x60, 0xB6, 0x74, 0x6D]),
            SpiTransaction::transaction_end(),
        ];
        let mut bus = SpiBus::new(SpiMock::new(&expectations));

        // 0xE0 carries the read flag bit; it must leave the bus as 0x60.
        block_on(bus.write_regs(&[(0xE0, 0xB6), (0x74, 0x6D)])).unwrap();

        bus.free().done();
    }
}
