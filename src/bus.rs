pub mod i2c;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod transport;

pub use i2c::{ByteOrder, I2cBus, BUFFER_LEN, DEFAULT_BUS, WORD_BUFFER_LEN};
pub use transport::{I2cTransport, PlatformTransport};
