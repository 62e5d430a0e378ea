#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use bmp280_sensor::i2cio::{BusTransport, TransportError};

pub const FAKE_BUS_ADDR: u16 = 0x76;

// -- holds a transfer on one register until the test lets it proceed
struct Gate {
    register: u8,
    entered: Sender<()>,
    proceed: Receiver<()>,
}

#[derive(Default)]
struct Registers {
    bytes: HashMap<u8, u8>,
    words: HashMap<u8, u16>,
    failing: HashSet<u8>,
    writes: Vec<(u8, u8)>,
    byte_reads: usize,
    gate: Option<Gate>,
}

/// Register-level stand-in for a BMP280 on an I2C bus.
#[derive(Clone, Default)]
pub struct FakeBus {
    registers: Arc<Mutex<Registers>>,
}

impl FakeBus {

    /// A healthy sensor: chip id 0x58, reference calibration, raw reading 519888.
    pub fn bmp280() -> FakeBus {
        let bus = FakeBus::default();
        {
            let mut registers = bus.registers.lock().unwrap();
            registers.bytes.insert(0xd0, 0x58);
            registers.words.insert(0x88, 27504);
            registers.words.insert(0x8a, 26435);
            registers.words.insert(0x8c, (-1000i16) as u16);
            registers.bytes.insert(0xfa, 0x7e);
            registers.bytes.insert(0xfb, 0xed);
            registers.bytes.insert(0xfc, 0x00);
        }
        bus
    }

    pub fn set_byte(&self, register: u8, value: u8) {
        self.registers.lock().unwrap().bytes.insert(register, value);
    }

    pub fn fail(&self, register: u8) {
        self.registers.lock().unwrap().failing.insert(register);
    }

    pub fn heal(&self, register: u8) {
        self.registers.lock().unwrap().failing.remove(&register);
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.registers.lock().unwrap().writes.clone()
    }

    pub fn byte_reads(&self) -> usize {
        self.registers.lock().unwrap().byte_reads
    }

    /// Blocks the next byte or word read of `register`; returns (entered, proceed) channels.
    pub fn gate(&self, register: u8) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (proceed_tx, proceed_rx) = mpsc::channel();
        self.registers.lock().unwrap().gate = Some(Gate {
            register,
            entered: entered_tx,
            proceed: proceed_rx,
        });
        (entered_rx, proceed_tx)
    }

    fn pass_gate(&self, register: u8) {
        let gate = {
            let mut registers = self.registers.lock().unwrap();
            let gated = registers.gate.as_ref().map_or(false, |gate| gate.register == register);
            if gated { registers.gate.take() } else { None }
        };
        if let Some(gate) = gate {
            gate.entered.send(()).unwrap();
            gate.proceed.recv().unwrap();
        }
    }
}

impl BusTransport for FakeBus {
    fn read_byte(&mut self, register: u8) -> Result<u8, TransportError> {
        self.pass_gate(register);
        let mut registers = self.registers.lock().unwrap();
        registers.byte_reads += 1;
        if registers.failing.contains(&register) {
            return Err(TransportError::NoResponse(FAKE_BUS_ADDR));
        }
        Ok(registers.bytes.get(&register).copied().unwrap_or(0))
    }

    fn read_word(&mut self, register: u8) -> Result<u16, TransportError> {
        self.pass_gate(register);
        let registers = self.registers.lock().unwrap();
        if registers.failing.contains(&register) {
            return Err(TransportError::NoResponse(FAKE_BUS_ADDR));
        }
        Ok(registers.words.get(&register).copied().unwrap_or(0))
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), TransportError> {
        let mut registers = self.registers.lock().unwrap();
        if registers.failing.contains(&register) {
            return Err(TransportError::NoResponse(FAKE_BUS_ADDR));
        }
        registers.writes.push((register, value));
        Ok(())
    }
}
