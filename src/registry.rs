//! Process-wide default bus, for drivers that assume a single ambient bus.
//!
//! Prefer handing a [`SharedBus`] to each driver explicitly; the default slot
//! only saves threading it through code that cannot take one.

use crate::bus::I2cBus;
use crate::config::BusSettings;
use crate::errors::BusResult;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

/// A bus shared between drivers. Lock it for the duration of one request.
pub type SharedBus = Arc<Mutex<I2cBus>>;

static DEFAULT_BUS: Mutex<Option<SharedBus>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<SharedBus>> {
    DEFAULT_BUS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install (or with `None`, clear) the default bus
pub fn set_default_bus(bus: Option<SharedBus>) {
    *slot() = bus;
}

/// Whatever was last passed to [`set_default_bus`]
pub fn default_bus() -> Option<SharedBus> {
    slot().clone()
}

/// Keeps a bus installed as the default until dropped
#[must_use = "the default bus is cleared when the guard is dropped"]
pub struct DefaultBusGuard {
    _private: (),
}

impl DefaultBusGuard {
    pub fn install(bus: SharedBus) -> Self {
        set_default_bus(Some(bus));
        Self { _private: () }
    }
}

impl Drop for DefaultBusGuard {
    fn drop(&mut self) {
        set_default_bus(None);
    }
}

/// Open a bus as described by `settings`, ready to be shared
pub fn open_shared(settings: &BusSettings) -> BusResult<SharedBus> {
    let mut bus = I2cBus::new();
    bus.set_repeat_start(settings.repeat_start);
    bus.set_transfer_time(settings.transfer_time);
    bus.open(&settings.path)?;
    info!(
        "[registry] bus {} open (repeat_start={}, transfer_time={})",
        settings.path, settings.repeat_start, settings.transfer_time
    );
    Ok(Arc::new(Mutex::new(bus)))
}
