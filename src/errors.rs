use std::io;
use thiserror::Error;

/// Failures reported by [`I2cBus`](crate::bus::i2c::I2cBus) operations.
///
/// The `Display` text is stable; it is what `last_error()` reports.
#[derive(Error, Debug)]
pub enum BusError {
    #[error("I2C bus already open")]
    AlreadyOpen,

    #[error("Invalid bus name")]
    InvalidBusName,

    #[error("Unable to open I2C bus '{path}': {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("No open I2C bus")]
    NotOpen,

    #[error("Failed to put device {address:#04x} into slave mode: {source}")]
    SlaveSelectFailed {
        address: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to transfer data with device {address:#04x}: {source}")]
    TransferFailed {
        address: u16,
        #[source]
        source: io::Error,
    },

    #[error("Invalid buffer: {needed} element(s) requested, buffer holds {len}")]
    InvalidBuffer { needed: usize, len: usize },
}

/// Failures of a [`Peripheral`](crate::device::Peripheral) bound to a bus.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("No bus given and no default bus registered")]
    NoBus,

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration format in '{path}': {source}")]
    FormatError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type aliases for convenience
pub type BusResult<T> = Result<T, BusError>;
pub type DeviceResult<T> = Result<T, DeviceError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
