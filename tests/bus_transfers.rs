use i2c_shim::bus::mock::{MockTransport, Transaction};
use i2c_shim::{BusError, ByteOrder, I2cBus, Peripheral, BUFFER_LEN};
use std::sync::{Arc, Mutex};

#[test]
fn forty_byte_read_from_accelerometer() {
    let mut transport = MockTransport::new(0x53, 1);
    transport.memory[0] = 0xE5;
    let mut bus = I2cBus::with_transport(transport);

    let mut out = [0u8; 40];
    assert_eq!(bus.read(0x53, 0x00, 40, &mut out, true).unwrap(), 40);
    assert_eq!(out[0], 0xE5);
    assert_eq!(
        bus.transport().unwrap().transfers(),
        vec![
            Transaction::WriteRead(vec![0x00], BUFFER_LEN),
            Transaction::Read(40 - BUFFER_LEN),
        ]
    );
    assert_eq!(bus.last_error(), "(none)");
}

#[test]
fn multi_chunk_word_round_trip_through_peripheral() {
    let bus = Arc::new(Mutex::new(I2cBus::with_transport(MockTransport::new(0x29, 2))));
    let dev = Peripheral::on_bus(0x29, bus.clone());

    let words: Vec<u16> = (0..20).map(|i| 0x0101 * i).collect();
    assert_eq!(dev.write_words(0x0200, &words, ByteOrder::LsbFirst).unwrap(), 20);

    let mut back = vec![0u16; 20];
    assert_eq!(dev.read_words(0x0200, &mut back, ByteOrder::LsbFirst).unwrap(), 20);
    assert_eq!(back, words);

    let transfers = bus.lock().unwrap().transport().unwrap().transfers();
    assert_eq!(transfers.len(), 4);
    assert!(matches!(&transfers[0], Transaction::Write(bytes) if bytes.len() == 2 + BUFFER_LEN));
    assert_eq!(transfers[1], Transaction::Write(words[16..].iter().flat_map(|w| w.to_le_bytes()).collect()));
    assert_eq!(transfers[2], Transaction::WriteRead(vec![0x02, 0x00], BUFFER_LEN));
    assert_eq!(transfers[3], Transaction::Read(8));
}

#[test]
fn never_opened_bus_and_double_open() {
    let mut bus: I2cBus<MockTransport> = I2cBus::new();
    let mut out = [0u8; 8];
    assert!(matches!(bus.read(0x53, 0x32, 8, &mut out, true), Err(BusError::NotOpen)));
    assert_eq!(bus.last_error(), "No open I2C bus");

    bus.open("mock:i2c-1").unwrap();
    assert!(matches!(bus.open("mock:i2c-1"), Err(BusError::AlreadyOpen)));
    assert_eq!(bus.last_error(), "I2C bus already open");
}
