//! Linux stand-ins for the I2C bus and timing primitives that
//! microcontroller sensor drivers expect.

// Public modules
pub mod bus;
pub mod config;
pub mod device;
pub mod errors;
pub mod probe;
pub mod registry;
pub mod timing;

// Re-export commonly used types
pub use bus::{ByteOrder, I2cBus, BUFFER_LEN, DEFAULT_BUS};
pub use device::Peripheral;
pub use errors::{BusError, BusResult, ConfigError, DeviceError};
pub use probe::run_probe;
pub use registry::{default_bus, set_default_bus, SharedBus};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}
