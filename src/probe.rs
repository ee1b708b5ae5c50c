use crate::bus::{ByteOrder, I2cTransport};
use crate::config::{load_bus_config, load_device_config, DeviceEntry};
use crate::device::Peripheral;
use crate::errors::DeviceResult;
use crate::registry::{open_shared, DefaultBusGuard};
use crate::timing::{delay, MillisClock};
use std::fmt;
use tracing::{info, warn};

/// Raw data returned by one probe read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Bytes(Vec<u8>),
    Words(Vec<u16>),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Bytes(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
            }
            Reading::Words(words) => {
                for (i, w) in words.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:04x}", w)?;
                }
            }
        }
        Ok(())
    }
}

/// Perform the single read described by `entry`
pub fn probe_device<T: I2cTransport>(entry: &DeviceEntry, dev: &Peripheral<T>) -> DeviceResult<Reading> {
    if let Some(ms) = entry.settle_ms {
        delay(ms);
    }

    match entry.words {
        Some(format) => {
            let order = ByteOrder::from(format);
            let mut words = vec![0u16; entry.length];
            match entry.register {
                Some(reg) => dev.read_words(reg, &mut words, order)?,
                None => dev.read_words_only(&mut words, order)?,
            };
            Ok(Reading::Words(words))
        }
        None => {
            let mut bytes = vec![0u8; entry.length];
            match entry.register {
                Some(reg) => dev.read(reg, &mut bytes)?,
                None => dev.read_only(&mut bytes)?,
            };
            Ok(Reading::Bytes(bytes))
        }
    }
}

/// Open the configured bus, install it as the default bus and read once
/// from every configured device.
///
/// Returns how many devices answered.
pub fn run_probe(config_path: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let clock = MillisClock::new();

    let bus_settings = load_bus_config(&format!("{}/bus.toml", config_path))?;
    let device_config = load_device_config(&format!("{}/devices.toml", config_path))?;
    info!("[config] loaded {} device(s)", device_config.devices.len());

    let bus = open_shared(&bus_settings)?;
    let _default = DefaultBusGuard::install(bus);

    let mut answered = 0;
    for entry in device_config.devices.iter() {
        let dev = Peripheral::new(entry.address, None)?;
        match probe_device(entry, &dev) {
            Ok(reading) => {
                answered += 1;
                if bus_settings.transfer_time {
                    info!(
                        "[{}] {:#04x}: {} ({}us)",
                        entry.id,
                        entry.address,
                        reading,
                        dev.transfer_time_us()
                    );
                } else {
                    info!("[{}] {:#04x}: {}", entry.id, entry.address, reading);
                }
            }
            Err(e) => {
                dev.annotate(&format!("{}: no answer at {:#04x} ({})", entry.id, entry.address, e));
                warn!("[{}] probe failed: {}", entry.id, dev.last_error());
            }
        }
    }

    info!(
        "[probe] {} of {} device(s) answered in {}ms",
        answered,
        device_config.devices.len(),
        clock.millis()
    );
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{MockTransport, Transaction};
    use crate::bus::I2cBus;
    use crate::config::WordFormat;
    use std::sync::{Arc, Mutex};

    fn entry(register: Option<u16>, length: usize, words: Option<WordFormat>) -> DeviceEntry {
        DeviceEntry {
            id: "test".to_string(),
            address: 0x53,
            register,
            length,
            words,
            settle_ms: None,
        }
    }

    fn mock_bus() -> Arc<Mutex<I2cBus<MockTransport>>> {
        let mut transport = MockTransport::new(0x53, 1);
        transport.memory[..4].copy_from_slice(&[0xE5, 0x00, 0x12, 0x34]);
        Arc::new(Mutex::new(I2cBus::with_transport(transport)))
    }

    #[test]
    fn test_byte_probe() {
        let bus = mock_bus();
        let dev = Peripheral::on_bus(0x53, bus.clone());
        let reading = probe_device(&entry(Some(0x00), 1, None), &dev).unwrap();
        assert_eq!(reading, Reading::Bytes(vec![0xE5]));
        assert_eq!(reading.to_string(), "e5");
    }

    #[test]
    fn test_word_probe_without_register() {
        let bus = mock_bus();
        bus.lock().unwrap().transport_mut().unwrap().pointer = 2;
        let dev = Peripheral::on_bus(0x53, bus.clone());

        let reading = probe_device(&entry(None, 1, Some(WordFormat::MsbFirst)), &dev).unwrap();
        assert_eq!(reading, Reading::Words(vec![0x1234]));
        assert_eq!(reading.to_string(), "1234");
        assert_eq!(
            bus.lock().unwrap().transport().unwrap().transfers(),
            vec![Transaction::Read(2)]
        );
    }

    #[test]
    fn test_probe_of_absent_device_fails() {
        let dev = Peripheral::on_bus(0x68, mock_bus());
        assert!(probe_device(&entry(Some(0x75), 1, None), &dev).is_err());
    }

    #[test]
    fn test_missing_config_dir() {
        assert!(run_probe("/nonexistent-config-dir").is_err());
    }
}
