use super::transport::{I2cTransport, PlatformTransport};
use crate::errors::{BusError, BusResult};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Largest payload moved in a single bus transaction. SMBus and some
/// controllers reject longer blocks.
pub const BUFFER_LEN: usize = 32;

/// Largest number of 16-bit words moved in a single bus transaction
pub const WORD_BUFFER_LEN: usize = BUFFER_LEN / 2;

/// Bus device on newer Raspberry Pi boards
pub const DEFAULT_BUS: &str = "/dev/i2c-1";

const NO_ERROR: &str = "(none)";

/// How 16-bit words map onto the byte stream on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// First byte is the low byte.
    LsbFirst,
    /// First byte is the high byte.
    MsbFirst,
}

impl ByteOrder {
    pub fn decode(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LsbFirst => u16::from_le_bytes(bytes),
            ByteOrder::MsbFirst => u16::from_be_bytes(bytes),
        }
    }

    pub fn encode(self, word: u16) -> [u8; 2] {
        match self {
            ByteOrder::LsbFirst => word.to_le_bytes(),
            ByteOrder::MsbFirst => word.to_be_bytes(),
        }
    }
}

/// Two register-address slots followed by one chunk of payload, laid out so
/// that the address bytes in use sit directly in front of the data.
struct Scratch {
    buf: [u8; BUFFER_LEN + 2],
    start: usize,
}

impl Scratch {
    fn new(register: Option<u16>) -> Self {
        let mut buf = [0u8; BUFFER_LEN + 2];
        let start = match register {
            None => 2,
            Some(reg) if reg & 0xFF00 != 0 => {
                buf[..2].copy_from_slice(&reg.to_be_bytes());
                0
            }
            Some(reg) => {
                buf[1] = (reg & 0x00FF) as u8;
                1
            }
        };
        Self { buf, start }
    }

    fn address(&self) -> &[u8] {
        &self.buf[self.start..2]
    }

    fn split(&mut self, len: usize) -> (&[u8], &mut [u8]) {
        let (head, tail) = self.buf.split_at_mut(2);
        (&head[self.start..], &mut tail[..len])
    }

    fn payload_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.buf[2..2 + len]
    }

    fn frame(&self, len: usize) -> &[u8] {
        &self.buf[self.start..2 + len]
    }
}

/// Chunked register access to devices on one I2C bus.
///
/// Requests larger than [`BUFFER_LEN`] bytes are split into independent
/// transactions. Only the first one names the register; the rest rely on the
/// device auto-incrementing its register pointer. A failed chunk aborts the
/// whole request, and how much of the output was filled is not reported.
///
/// Not safe for concurrent use; share it behind a lock (see
/// [`SharedBus`](crate::registry::SharedBus)).
pub struct I2cBus<T: I2cTransport = PlatformTransport> {
    transport: Option<T>,
    path: Option<String>,
    repeat_start: bool,
    measure_transfer_time: bool,
    transfer_time_us: u64,
    last_error: Option<String>,
}

impl<T: I2cTransport> Default for I2cBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: I2cTransport> I2cBus<T> {
    /// Create a closed bus. Call [`open`](Self::open) before transferring.
    pub fn new() -> Self {
        Self {
            transport: None,
            path: None,
            repeat_start: true,
            measure_transfer_time: false,
            transfer_time_us: 0,
            last_error: None,
        }
    }

    /// Create a bus that is already open on the given transport
    pub fn with_transport(transport: T) -> Self {
        let mut bus = Self::new();
        bus.transport = Some(transport);
        bus
    }

    pub fn open(&mut self, path: &str) -> BusResult<()> {
        self.last_error = None;
        let result = self.try_open(path);
        self.finish(result)
    }

    fn try_open(&mut self, path: &str) -> BusResult<()> {
        if self.transport.is_some() {
            return Err(BusError::AlreadyOpen);
        }
        if path.is_empty() {
            return Err(BusError::InvalidBusName);
        }
        let transport = T::open(path).map_err(|source| BusError::OpenFailed {
            path: path.to_string(),
            source,
        })?;
        self.transport = Some(transport);
        self.path = Some(path.to_string());
        info!("[i2c] opened bus {}", path);
        Ok(())
    }

    /// Close the bus. Safe to call on a bus that is not open.
    pub fn close(&mut self) {
        self.last_error = None;
        if self.transport.take().is_some() {
            debug!("[i2c] closed bus {}", self.path.as_deref().unwrap_or("<attached>"));
        }
        self.path = None;
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Device path the bus was opened from, if it was opened by path
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Combine the register write and the data read of a read request into one
    /// transaction with a repeated start. Enabled by default.
    pub fn set_repeat_start(&mut self, enable: bool) {
        self.repeat_start = enable;
    }

    pub fn repeat_start(&self) -> bool {
        self.repeat_start
    }

    /// Measure the wall-clock duration of each read/write request
    pub fn set_transfer_time(&mut self, enable: bool) {
        self.measure_transfer_time = enable;
    }

    /// Microseconds spent in the last read/write request; 0 unless measuring
    pub fn transfer_time_us(&self) -> u64 {
        self.transfer_time_us
    }

    /// Message describing the last failure, or `"(none)"`
    pub fn last_error(&self) -> &str {
        self.last_error.as_deref().unwrap_or(NO_ERROR)
    }

    /// Overwrite the error state, e.g. with a driver-level explanation.
    /// `None` clears it.
    pub fn set_error(&mut self, message: Option<&str>) {
        self.last_error = message.map(str::to_string);
    }

    /// Read `count` bytes starting at `register` into `out`.
    ///
    /// With `specify_register` false no register address is sent at all and
    /// the device answers from wherever its pointer stands.
    pub fn read(
        &mut self,
        device: u16,
        register: u16,
        count: usize,
        out: &mut [u8],
        specify_register: bool,
    ) -> BusResult<usize> {
        let register = specify_register.then_some(register);
        self.run(|bus| bus.read_chunks(device, register, count, out))
    }

    pub fn read_only(&mut self, device: u16, count: usize, out: &mut [u8]) -> BusResult<usize> {
        self.read(device, 0, count, out, false)
    }

    /// Read `count` 16-bit words starting at `register` into `out`
    pub fn read_words(
        &mut self,
        device: u16,
        register: u16,
        count: usize,
        out: &mut [u16],
        order: ByteOrder,
        specify_register: bool,
    ) -> BusResult<usize> {
        let register = specify_register.then_some(register);
        self.run(|bus| bus.read_word_chunks(device, register, count, out, order))
    }

    pub fn read_words_only(
        &mut self,
        device: u16,
        count: usize,
        out: &mut [u16],
        order: ByteOrder,
    ) -> BusResult<usize> {
        self.read_words(device, 0, count, out, order, false)
    }

    /// Write the first `count` bytes of `data` starting at `register`
    pub fn write(
        &mut self,
        device: u16,
        register: u16,
        count: usize,
        data: &[u8],
        specify_register: bool,
    ) -> BusResult<usize> {
        let register = specify_register.then_some(register);
        self.run(|bus| bus.write_chunks(device, register, count, data))
    }

    pub fn write_only(&mut self, device: u16, count: usize, data: &[u8]) -> BusResult<usize> {
        self.write(device, 0, count, data, false)
    }

    /// Write the first `count` words of `data` starting at `register`
    pub fn write_words(
        &mut self,
        device: u16,
        register: u16,
        count: usize,
        data: &[u16],
        order: ByteOrder,
        specify_register: bool,
    ) -> BusResult<usize> {
        let register = specify_register.then_some(register);
        self.run(|bus| bus.write_word_chunks(device, register, count, data, order))
    }

    pub fn write_words_only(
        &mut self,
        device: u16,
        count: usize,
        data: &[u16],
        order: ByteOrder,
    ) -> BusResult<usize> {
        self.write_words(device, 0, count, data, order, false)
    }

    /// Reset error state and timing, run one request, then record both.
    fn run<R>(&mut self, op: impl FnOnce(&mut Self) -> BusResult<R>) -> BusResult<R> {
        self.last_error = None;
        self.transfer_time_us = 0;
        let started = self.measure_transfer_time.then(Instant::now);
        let result = op(self);
        if let Some(started) = started {
            self.transfer_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        }
        self.finish(result)
    }

    fn finish<R>(&mut self, result: BusResult<R>) -> BusResult<R> {
        if let Err(e) = &result {
            debug!("[i2c] {}", e);
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn read_chunks(
        &mut self,
        device: u16,
        mut register: Option<u16>,
        count: usize,
        out: &mut [u8],
    ) -> BusResult<usize> {
        if count == 0 {
            return Ok(0);
        }
        check_buffer(count, out.len())?;
        self.ensure_open()?;
        for chunk in out[..count].chunks_mut(BUFFER_LEN) {
            self.read_chunk(device, register, chunk)?;
            register = None;
        }
        Ok(count)
    }

    fn read_word_chunks(
        &mut self,
        device: u16,
        mut register: Option<u16>,
        count: usize,
        out: &mut [u16],
        order: ByteOrder,
    ) -> BusResult<usize> {
        if count == 0 {
            return Ok(0);
        }
        check_buffer(count, out.len())?;
        self.ensure_open()?;
        let mut raw = [0u8; BUFFER_LEN];
        for chunk in out[..count].chunks_mut(WORD_BUFFER_LEN) {
            let bytes = &mut raw[..chunk.len() * 2];
            self.read_chunk(device, register, bytes)?;
            for (word, pair) in chunk.iter_mut().zip(bytes.chunks_exact(2)) {
                *word = order.decode([pair[0], pair[1]]);
            }
            register = None;
        }
        Ok(count)
    }

    fn write_chunks(
        &mut self,
        device: u16,
        mut register: Option<u16>,
        count: usize,
        data: &[u8],
    ) -> BusResult<usize> {
        if count == 0 {
            return Ok(0);
        }
        check_buffer(count, data.len())?;
        self.ensure_open()?;
        for chunk in data[..count].chunks(BUFFER_LEN) {
            self.write_chunk(device, register, chunk)?;
            register = None;
        }
        Ok(count)
    }

    fn write_word_chunks(
        &mut self,
        device: u16,
        mut register: Option<u16>,
        count: usize,
        data: &[u16],
        order: ByteOrder,
    ) -> BusResult<usize> {
        if count == 0 {
            return Ok(0);
        }
        check_buffer(count, data.len())?;
        self.ensure_open()?;
        let mut raw = [0u8; BUFFER_LEN];
        for chunk in data[..count].chunks(WORD_BUFFER_LEN) {
            for (pair, word) in raw.chunks_exact_mut(2).zip(chunk) {
                pair.copy_from_slice(&order.encode(*word));
            }
            self.write_chunk(device, register, &raw[..chunk.len() * 2])?;
            register = None;
        }
        Ok(count)
    }

    fn ensure_open(&self) -> BusResult<()> {
        if self.transport.is_none() {
            return Err(BusError::NotOpen);
        }
        Ok(())
    }

    fn select(&mut self, device: u16) -> BusResult<&mut T> {
        let transport = self.transport.as_mut().ok_or(BusError::NotOpen)?;
        transport
            .select(device)
            .map_err(|source| BusError::SlaveSelectFailed { address: device, source })?;
        Ok(transport)
    }

    /// One read transaction (two without repeat-start) of at most
    /// [`BUFFER_LEN`] bytes.
    fn read_chunk(&mut self, device: u16, register: Option<u16>, out: &mut [u8]) -> BusResult<()> {
        let repeat_start = self.repeat_start;
        let transport = self.select(device)?;
        let mut scratch = Scratch::new(register);
        let (address, payload) = scratch.split(out.len());
        trace!(
            "[i2c] read dev={:#04x} addr={:02x?} len={} rs={}",
            device,
            address,
            payload.len(),
            repeat_start
        );

        let result = if address.is_empty() {
            transport.read(payload)
        } else if repeat_start {
            transport.write_read(address, payload)
        } else {
            transport.write(address).and_then(|()| transport.read(payload))
        };
        result.map_err(|source| BusError::TransferFailed { address: device, source })?;

        out.copy_from_slice(payload);
        Ok(())
    }

    /// One write transaction of the address bytes followed by at most
    /// [`BUFFER_LEN`] data bytes.
    fn write_chunk(&mut self, device: u16, register: Option<u16>, data: &[u8]) -> BusResult<()> {
        let transport = self.select(device)?;
        let mut scratch = Scratch::new(register);
        scratch.payload_mut(data.len()).copy_from_slice(data);
        trace!(
            "[i2c] write dev={:#04x} addr={:02x?} len={}",
            device,
            scratch.address(),
            data.len()
        );

        transport
            .write(scratch.frame(data.len()))
            .map_err(|source| BusError::TransferFailed { address: device, source })
    }
}

impl<T: I2cTransport> Drop for I2cBus<T> {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_buffer(needed: usize, len: usize) -> BusResult<()> {
    if len < needed {
        return Err(BusError::InvalidBuffer { needed, len });
    }
    Ok(())
}
