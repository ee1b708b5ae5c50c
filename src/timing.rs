//! Millisecond counter and sleep primitives for drivers written against a
//! microcontroller-style `millis()` / `delay()` API.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

static EPOCH: Mutex<Option<Instant>> = Mutex::new(None);

/// Milliseconds since the last [`millis_reset`]. The first call starts the
/// counter and returns 0.
pub fn millis() -> u64 {
    let mut epoch = EPOCH.lock().unwrap_or_else(PoisonError::into_inner);
    match *epoch {
        Some(started) => as_millis(started.elapsed()),
        None => {
            *epoch = Some(Instant::now());
            0
        }
    }
}

pub fn millis_reset() {
    *EPOCH.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
}

/// Block the calling thread for `ms` milliseconds
pub fn delay(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

pub fn delay_us(us: u64) {
    thread::sleep(Duration::from_micros(us));
}

/// Owned millisecond counter, for callers that want their own epoch
#[derive(Debug, Clone, Copy)]
pub struct MillisClock {
    started: Instant,
}

impl Default for MillisClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MillisClock {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }

    pub fn reset(&mut self) {
        self.started = Instant::now();
    }

    pub fn millis(&self) -> u64 {
        as_millis(self.started.elapsed())
    }

    pub fn micros(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

fn as_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
