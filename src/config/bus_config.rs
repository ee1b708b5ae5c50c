use crate::bus::DEFAULT_BUS;
use crate::errors::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::fs;

/// Root structure for loading a `[bus]` TOML table
#[derive(Debug, Deserialize)]
struct BusFile {
    bus: BusSettings,
}

/// How to open and drive the I2C bus
#[derive(Debug, Clone, Deserialize)]
pub struct BusSettings {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_repeat_start")]
    pub repeat_start: bool,
    /// Measure each request's duration
    #[serde(default)]
    pub transfer_time: bool,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            path: default_path(),
            repeat_start: default_repeat_start(),
            transfer_time: false,
        }
    }
}

fn default_path() -> String {
    DEFAULT_BUS.to_string()
}

fn default_repeat_start() -> bool {
    true
}

pub fn parse_bus_config(path: &str, content: &str) -> ConfigResult<BusSettings> {
    let parsed: BusFile = toml::from_str(content).map_err(|source| ConfigError::FormatError {
        path: path.to_string(),
        source,
    })?;
    if parsed.bus.path.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "bus.path".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(parsed.bus)
}

/// Load bus config file
pub fn load_bus_config(path: &str) -> ConfigResult<BusSettings> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })?;
    parse_bus_config(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings = parse_bus_config("bus.toml", "[bus]\n").unwrap();
        assert_eq!(settings.path, "/dev/i2c-1");
        assert!(settings.repeat_start);
        assert!(!settings.transfer_time);
    }

    #[test]
    fn test_explicit_settings() {
        let toml = r#"
            [bus]
            path = "/dev/i2c-0"
            repeat_start = false
            transfer_time = true
        "#;
        let settings = parse_bus_config("bus.toml", toml).unwrap();
        assert_eq!(settings.path, "/dev/i2c-0");
        assert!(!settings.repeat_start);
        assert!(settings.transfer_time);
    }

    #[test]
    fn test_rejects_empty_path() {
        let err = parse_bus_config("bus.toml", "[bus]\npath = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_bus_config("/nonexistent/bus.toml").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError { .. }));
    }
}
