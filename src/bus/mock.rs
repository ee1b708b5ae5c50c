//! In-memory transport for exercising bus logic without hardware.
//!
//! Models a single register-file device with an auto-incrementing register
//! pointer, and records every transaction it sees.

use super::i2c::BUFFER_LEN;
use super::transport::I2cTransport;
use std::io;
use std::thread;
use std::time::Duration;

/// One bus-level event seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Select(u16),
    Write(Vec<u8>),
    Read(usize),
    WriteRead(Vec<u8>, usize),
}

pub struct MockTransport {
    /// Device address that answers; other addresses NACK.
    pub device: u16,
    /// Width in bytes of the register address the device expects (1 or 2).
    pub register_width: usize,
    pub memory: Vec<u8>,
    pub pointer: usize,
    pub log: Vec<Transaction>,
    /// Fail the transaction with this index (counting data transactions only).
    pub fail_at: Option<usize>,
    /// Reject every `select` call.
    pub fail_select: bool,
    /// Time each data transaction takes.
    pub latency: Duration,
    selected: Option<u16>,
    data_transactions: usize,
    continue_write: bool,
}

impl MockTransport {
    pub fn new(device: u16, register_width: usize) -> Self {
        Self {
            device,
            register_width,
            memory: vec![0; 0x1_0000],
            pointer: 0,
            log: Vec::new(),
            fail_at: None,
            fail_select: false,
            latency: Duration::ZERO,
            selected: None,
            data_transactions: 0,
            continue_write: false,
        }
    }

    /// Data transactions only, without the select events.
    pub fn transfers(&self) -> Vec<Transaction> {
        self.log
            .iter()
            .filter(|t| !matches!(t, Transaction::Select(_)))
            .cloned()
            .collect()
    }

    fn begin(&mut self) -> io::Result<()> {
        let index = self.data_transactions;
        self.data_transactions += 1;
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        if self.fail_at == Some(index) {
            return Err(io::Error::other("NACK"));
        }
        if self.selected != Some(self.device) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no device at address"));
        }
        Ok(())
    }

    fn set_pointer(&mut self, address: &[u8]) {
        self.pointer = address.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
    }

    fn store(&mut self, data: &[u8]) {
        for byte in data {
            self.memory[self.pointer] = *byte;
            self.pointer = (self.pointer + 1) % self.memory.len();
        }
    }

    fn load(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.memory[self.pointer];
            self.pointer = (self.pointer + 1) % self.memory.len();
        }
    }
}

impl I2cTransport for MockTransport {
    /// Paths starting with `mock:` open a fresh device at 0x53.
    fn open(path: &str) -> io::Result<Self> {
        if !path.starts_with("mock:") {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such bus"));
        }
        Ok(Self::new(0x53, 1))
    }

    fn select(&mut self, address: u16) -> io::Result<()> {
        self.log.push(Transaction::Select(address));
        if self.fail_select {
            return Err(io::Error::new(io::ErrorKind::ResourceBusy, "address in use"));
        }
        if self.selected != Some(address) {
            self.continue_write = false;
        }
        self.selected = Some(address);
        Ok(())
    }

    /// The leading `register_width` bytes set the register pointer; the rest
    /// are stored from there on. A write that follows a full-length write to
    /// the same device continues at the current pointer instead.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.log.push(Transaction::Write(bytes.to_vec()));
        if let Err(e) = self.begin() {
            self.continue_write = false;
            return Err(e);
        }
        let data = if self.continue_write {
            bytes
        } else {
            let width = self.register_width.min(bytes.len());
            let (address, data) = bytes.split_at(width);
            self.set_pointer(address);
            data
        };
        self.store(data);
        self.continue_write = data.len() == BUFFER_LEN;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.log.push(Transaction::Read(buf.len()));
        self.continue_write = false;
        self.begin()?;
        self.load(buf);
        Ok(())
    }

    fn write_read(&mut self, bytes: &[u8], buf: &mut [u8]) -> io::Result<()> {
        self.log.push(Transaction::WriteRead(bytes.to_vec(), buf.len()));
        self.continue_write = false;
        self.begin()?;
        self.set_pointer(bytes);
        self.load(buf);
        Ok(())
    }
}
