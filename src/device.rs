use crate::bus::{ByteOrder, I2cBus, I2cTransport};
use crate::errors::{DeviceError, DeviceResult};
use crate::registry::{self, SharedBus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One device address on a shared bus.
///
/// Drivers build on this and interpret the raw bytes and words themselves.
pub struct Peripheral<T: I2cTransport = crate::bus::PlatformTransport> {
    address: u16,
    bus: Arc<Mutex<I2cBus<T>>>,
}

impl Peripheral {
    /// Bind `address` to `bus`, or to the default bus when `bus` is `None`
    pub fn new(address: u16, bus: Option<SharedBus>) -> DeviceResult<Self> {
        let bus = bus.or_else(registry::default_bus).ok_or(DeviceError::NoBus)?;
        Ok(Self { address, bus })
    }
}

impl<T: I2cTransport> Peripheral<T> {
    pub fn on_bus(address: u16, bus: Arc<Mutex<I2cBus<T>>>) -> Self {
        Self { address, bus }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    fn bus(&self) -> MutexGuard<'_, I2cBus<T>> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read(&self, register: u16, out: &mut [u8]) -> DeviceResult<usize> {
        Ok(self.bus().read(self.address, register, out.len(), out, true)?)
    }

    pub fn read_only(&self, out: &mut [u8]) -> DeviceResult<usize> {
        Ok(self.bus().read_only(self.address, out.len(), out)?)
    }

    pub fn read_words(&self, register: u16, out: &mut [u16], order: ByteOrder) -> DeviceResult<usize> {
        Ok(self.bus().read_words(self.address, register, out.len(), out, order, true)?)
    }

    pub fn read_words_only(&self, out: &mut [u16], order: ByteOrder) -> DeviceResult<usize> {
        Ok(self.bus().read_words_only(self.address, out.len(), out, order)?)
    }

    pub fn write(&self, register: u16, data: &[u8]) -> DeviceResult<usize> {
        Ok(self.bus().write(self.address, register, data.len(), data, true)?)
    }

    pub fn write_words(&self, register: u16, data: &[u16], order: ByteOrder) -> DeviceResult<usize> {
        Ok(self.bus().write_words(self.address, register, data.len(), data, order, true)?)
    }

    /// Replace the bus error state with a driver-level message
    pub fn annotate(&self, message: &str) {
        self.bus().set_error(Some(message));
    }

    /// Duration of the last request on the bus, when it is measuring
    pub fn transfer_time_us(&self) -> u64 {
        self.bus().transfer_time_us()
    }

    pub fn last_error(&self) -> String {
        self.bus().last_error().to_string()
    }
}
