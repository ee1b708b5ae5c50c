use crate::bus::ByteOrder;
use crate::errors::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::fs;

/// Root configuration struct expecting `[[device]]` TOML array format
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    #[serde(rename = "device", default)]
    pub devices: Vec<DeviceEntry>,
}

/// One device entry, matching each `[[device]]` section
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    pub address: u16,
    /// Register to start from; omitted means read from the current pointer
    pub register: Option<u16>,
    #[serde(default = "default_length")]
    pub length: usize,
    /// Read `length` 16-bit words instead of bytes
    pub words: Option<WordFormat>,
    /// Wait this long before touching the device
    pub settle_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordFormat {
    LsbFirst,
    MsbFirst,
}

impl From<WordFormat> for ByteOrder {
    fn from(format: WordFormat) -> Self {
        match format {
            WordFormat::LsbFirst => ByteOrder::LsbFirst,
            WordFormat::MsbFirst => ByteOrder::MsbFirst,
        }
    }
}

fn default_length() -> usize {
    1
}

pub fn parse_device_config(path: &str, content: &str) -> ConfigResult<DeviceConfig> {
    let parsed: DeviceConfig = toml::from_str(content).map_err(|source| ConfigError::FormatError {
        path: path.to_string(),
        source,
    })?;
    for d in parsed.devices.iter() {
        if d.address > 0x7F {
            return Err(ConfigError::InvalidValue {
                field: format!("device.{}.address", d.id),
                reason: format!("{:#x} is not a 7-bit address", d.address),
            });
        }
    }
    Ok(parsed)
}

/// Loads device list from TOML file
pub fn load_device_config(path: &str) -> ConfigResult<DeviceConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })?;
    parse_device_config(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_entries() {
        let toml = r#"
            [[device]]
            id = "adxl345"
            address = 0x53
            register = 0x00

            [[device]]
            id = "iaq2000"
            address = 0x5A
            length = 1
            words = "msb_first"
            settle_ms = 10
        "#;
        let config = parse_device_config("devices.toml", toml).unwrap();
        assert_eq!(config.devices.len(), 2);

        let accel = &config.devices[0];
        assert_eq!(accel.address, 0x53);
        assert_eq!(accel.register, Some(0x00));
        assert_eq!(accel.length, 1);
        assert!(accel.words.is_none());

        let iaq = &config.devices[1];
        assert_eq!(iaq.register, None);
        assert_eq!(iaq.words, Some(WordFormat::MsbFirst));
        assert_eq!(ByteOrder::from(WordFormat::MsbFirst), ByteOrder::MsbFirst);
        assert_eq!(iaq.settle_ms, Some(10));
    }

    #[test]
    fn test_empty_file_has_no_devices() {
        let config = parse_device_config("devices.toml", "").unwrap();
        assert!(config.devices.is_empty());
    }

    #[test]
    fn test_rejects_ten_bit_address() {
        let toml = "[[device]]\nid = \"x\"\naddress = 0x1A0\n";
        let err = parse_device_config("devices.toml", toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let err = parse_device_config("devices.toml", "[[device]]\nid = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::FormatError { .. }));
    }
}
