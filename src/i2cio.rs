use i2c_linux::I2c;
use log::debug;
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("i2c bus i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("no device responding at address {0:#04x}")]
    NoResponse(u16),
}

// -- errno values the i2c adapters report for a missing acknowledge
const ENXIO: i32 = 6;
const EREMOTEIO: i32 = 121;

impl TransportError {
    fn from_io(err: io::Error, dev_addr: u16) -> TransportError {
        match err.raw_os_error() {
            Some(ENXIO) | Some(EREMOTEIO) => TransportError::NoResponse(dev_addr),
            _ => TransportError::Io(err),
        }
    }
}

// -- the register level capability set the drivers need from a bus
pub trait BusTransport {
    fn read_byte(&mut self, register: u8) -> Result<u8, TransportError>;
    // -- smbus word, little-endian on the wire
    fn read_word(&mut self, register: u8) -> Result<u16, TransportError>;
    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), TransportError>;
}

pub fn get_bus(bus_path: &Path)  -> Result<I2c<File>, io::Error> {
    I2c::from_path(bus_path)
}

pub fn set_slave(i2c: &mut I2c<File>, dev_addr: u16) -> Result<(), io::Error> {
    i2c.smbus_set_slave_address(dev_addr, false)
}

pub fn read_word(i2c: &mut I2c<File>, register: u8) -> Result<u16, io::Error> {
    i2c.smbus_read_word_data(register)
}

pub fn read_byte(i2c: &mut I2c<File>, register: u8) -> Result<u8, io::Error> {
    i2c.smbus_read_byte_data(register)
}

pub fn write_byte(i2c: &mut I2c<File>, register: u8, data: u8) -> Result<(), io::Error> {
    i2c.smbus_write_byte_data(register, data)
}

/// A Linux `/dev/i2c-N` bus with one slave address selected.
pub struct I2cBus {
    i2c: I2c<File>,
    dev_addr: u16,
}

impl I2cBus {

    pub fn open(bus_path: &Path, dev_addr: u16) -> Result<I2cBus, TransportError> {
        // -- get the bus
        let mut i2c = get_bus(bus_path)?;
        // -- set device address
        set_slave(&mut i2c, dev_addr).map_err(|err| TransportError::from_io(err, dev_addr))?;
        debug!("Opened i2c bus {} for device {dev_addr:#04x}", bus_path.display());
        Ok(I2cBus { i2c, dev_addr })
    }

    pub fn get_device_addr(&self) -> u16 {
        self.dev_addr
    }
}

impl BusTransport for I2cBus {
    fn read_byte(&mut self, register: u8) -> Result<u8, TransportError> {
        read_byte(&mut self.i2c, register).map_err(|err| TransportError::from_io(err, self.dev_addr))
    }

    fn read_word(&mut self, register: u8) -> Result<u16, TransportError> {
        read_word(&mut self.i2c, register).map_err(|err| TransportError::from_io(err, self.dev_addr))
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), TransportError> {
        write_byte(&mut self.i2c, register, value).map_err(|err| TransportError::from_io(err, self.dev_addr))
    }
}

#[cfg(test)]
mockall::mock! {
    pub Bus {}
    impl BusTransport for Bus {
        fn read_byte(&mut self, register: u8) -> Result<u8, TransportError>;
        fn read_word(&mut self, register: u8) -> Result<u16, TransportError>;
        fn write_byte(&mut self, register: u8, value: u8) -> Result<(), TransportError>;
    }
}
