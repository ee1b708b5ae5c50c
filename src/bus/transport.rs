use std::io;

#[cfg(target_os = "linux")]
use i2cdev::core::{I2CMessage, I2CTransfer};
#[cfg(target_os = "linux")]
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CMessage};

/// Raw bus access underneath [`I2cBus`](super::i2c::I2cBus).
///
/// Every data method is one bus transaction addressed to whatever device the
/// last `select` named. Chunking and register addressing live above this layer.
pub trait I2cTransport: Sized {
    fn open(path: &str) -> io::Result<Self>;

    /// Target subsequent transactions at a 7-bit device address.
    fn select(&mut self, address: u16) -> io::Result<()>;

    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Write then read in a single transaction, with a repeated start between
    /// the two phases.
    fn write_read(&mut self, bytes: &[u8], buf: &mut [u8]) -> io::Result<()>;
}

/// `/dev/i2c-*` character device driven through the `I2C_SLAVE` and
/// `I2C_RDWR` ioctls
#[cfg(target_os = "linux")]
pub struct LinuxTransport {
    device: LinuxI2CDevice,
}

#[cfg(target_os = "linux")]
impl I2cTransport for LinuxTransport {
    fn open(path: &str) -> io::Result<Self> {
        let device = LinuxI2CDevice::new(path, 0).map_err(io::Error::other)?;
        Ok(Self { device })
    }

    fn select(&mut self, address: u16) -> io::Result<()> {
        self.device.set_slave_address(address).map_err(io::Error::other)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut msgs = [LinuxI2CMessage::write(bytes)];
        self.device.transfer(&mut msgs).map_err(io::Error::other)?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut msgs = [LinuxI2CMessage::read(buf)];
        self.device.transfer(&mut msgs).map_err(io::Error::other)?;
        Ok(())
    }

    fn write_read(&mut self, bytes: &[u8], buf: &mut [u8]) -> io::Result<()> {
        let mut msgs = [LinuxI2CMessage::write(bytes), LinuxI2CMessage::read(buf)];
        self.device.transfer(&mut msgs).map_err(io::Error::other)?;
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
pub struct UnsupportedTransport {
    _phantom: std::marker::PhantomData<()>,
}

#[cfg(not(target_os = "linux"))]
fn unsupported() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "I2C is only supported on Linux")
}

#[cfg(not(target_os = "linux"))]
impl I2cTransport for UnsupportedTransport {
    fn open(_path: &str) -> io::Result<Self> {
        Err(unsupported())
    }

    fn select(&mut self, _address: u16) -> io::Result<()> {
        Err(unsupported())
    }

    fn write(&mut self, _bytes: &[u8]) -> io::Result<()> {
        Err(unsupported())
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<()> {
        Err(unsupported())
    }

    fn write_read(&mut self, _bytes: &[u8], _buf: &mut [u8]) -> io::Result<()> {
        Err(unsupported())
    }
}

/// Transport used by default on this platform
#[cfg(target_os = "linux")]
pub type PlatformTransport = LinuxTransport;

#[cfg(not(target_os = "linux"))]
pub type PlatformTransport = UnsupportedTransport;
