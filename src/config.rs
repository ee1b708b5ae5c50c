pub mod bus_config;
pub mod device_config;

pub use bus_config::{load_bus_config, BusSettings};
pub use device_config::{load_device_config, DeviceConfig, DeviceEntry, WordFormat};
