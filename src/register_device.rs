//! Register access over I2C.
//!
//! Single-byte writes, burst reads (the device auto-increments its register pointer)
//! and a masked read-modify-write that skips the write when nothing would change.

use crate::mp2722::regs::Field;
use crate::mp2722::ChargerError;
use embedded_hal::i2c::I2c;

#[derive(Debug)]
pub struct BlockingRegisterDevice<I2C> {
    i2c: Option<I2C>,
    pub(crate) adr: u8,
}

impl<I2C> BlockingRegisterDevice<I2C> {
    pub fn new(i2c: Option<I2C>, adr: u8) -> Self {
        Self { i2c, adr }
    }

    pub fn is_bound(&self) -> bool {
        self.i2c.is_some()
    }

    pub fn release(self) -> Option<I2C> {
        self.i2c
    }
}

impl<I2C> BlockingRegisterDevice<I2C>
where
    I2C: I2c,
{
    fn bus(&mut self) -> Result<&mut I2C, ChargerError> {
        self.i2c.as_mut().ok_or(ChargerError::InvalidState)
    }

    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), ChargerError> {
        let adr = self.adr;
        self.bus()?.write(adr, &[register, value])?;
        Ok(())
    }

    /// Reads `N` consecutive registers starting at `start`
    pub fn read_registers<const N: usize>(&mut self, start: u8) -> Result<[u8; N], ChargerError> {
        let adr = self.adr;
        let mut buffer = [0u8; N];
        self.bus()?.write_read(adr, &[start], &mut buffer)?;
        Ok(buffer)
    }

    pub fn read_register(&mut self, register: u8) -> Result<u8, ChargerError> {
        let [value] = self.read_registers::<1>(register)?;
        Ok(value)
    }

    /// Replaces the bits selected by `mask` with those of `value`.
    ///
    /// Bits outside `mask` keep their current value. No write is issued when the
    /// register already holds the result.
    pub fn update_register(&mut self, register: u8, mask: u8, value: u8) -> Result<(), ChargerError> {
        let old = self.read_register(register)?;
        let new = (old & !mask) | (value & mask);
        if new != old {
            self.write_register(register, new)?;
        }
        Ok(())
    }

    pub fn update_field(&mut self, field: Field, value: u8) -> Result<(), ChargerError> {
        self.update_register(field.reg, field.mask, value)
    }

    pub fn read_field(&mut self, field: Field) -> Result<u8, ChargerError> {
        let raw = self.read_register(field.reg)?;
        Ok(field.decode(raw))
    }
}

#[cfg(feature = "async")]
#[derive(Debug)]
pub struct AsyncRegisterDevice<I2C> {
    i2c: Option<I2C>,
    pub(crate) adr: u8,
}

#[cfg(feature = "async")]
impl<I2C> AsyncRegisterDevice<I2C> {
    pub fn new(i2c: Option<I2C>, adr: u8) -> Self {
        Self { i2c, adr }
    }

    pub fn is_bound(&self) -> bool {
        self.i2c.is_some()
    }

    pub fn release(self) -> Option<I2C> {
        self.i2c
    }
}

#[cfg(feature = "async")]
impl<I2C> AsyncRegisterDevice<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    fn bus(&mut self) -> Result<&mut I2C, ChargerError> {
        self.i2c.as_mut().ok_or(ChargerError::InvalidState)
    }

    pub async fn write_register(&mut self, register: u8, value: u8) -> Result<(), ChargerError> {
        let adr = self.adr;
        self.bus()?.write(adr, &[register, value]).await?;
        Ok(())
    }

    pub async fn read_registers<const N: usize>(
        &mut self,
        start: u8,
    ) -> Result<[u8; N], ChargerError> {
        let adr = self.adr;
        let mut buffer = [0u8; N];
        self.bus()?.write_read(adr, &[start], &mut buffer).await?;
        Ok(buffer)
    }

    pub async fn read_register(&mut self, register: u8) -> Result<u8, ChargerError> {
        let [value] = self.read_registers::<1>(register).await?;
        Ok(value)
    }

    pub async fn update_register(
        &mut self,
        register: u8,
        mask: u8,
        value: u8,
    ) -> Result<(), ChargerError> {
        let old = self.read_register(register).await?;
        let new = (old & !mask) | (value & mask);
        if new != old {
            self.write_register(register, new).await?;
        }
        Ok(())
    }

    pub async fn update_field(&mut self, field: Field, value: u8) -> Result<(), ChargerError> {
        self.update_register(field.reg, field.mask, value).await
    }

    pub async fn read_field(&mut self, field: Field) -> Result<u8, ChargerError> {
        let raw = self.read_register(field.reg).await?;
        Ok(field.decode(raw))
    }
}
