//! Factory calibration coefficients for temperature compensation.
//!
//! The BMP280 stores `dig_T1..dig_T3` as little-endian words at 0x88..0x8D.
//! `dig_T1` is unsigned, `dig_T2` and `dig_T3` are two's-complement.

#[allow(unused_imports)]
use log::{debug, warn};
use thiserror::Error;

use crate::i2cio::{BusTransport, TransportError};

const BMP280_REG_CALIB_DIG_T1: u8 = 0x88;
const BMP280_REG_CALIB_DIG_T2: u8 = 0x8a;
const BMP280_REG_CALIB_DIG_T3: u8 = 0x8c;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("failed to read calibration data: {0}")]
    Unreadable(#[source] TransportError),
    #[error("invalid calibration data, {coefficient} is zero")]
    Invalid { coefficient: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
}

impl Calibration {

    /// Reads T1, T2 and T3 in register order and rejects all-zero words.
    ///
    /// The first failing transfer aborts the load; nothing is retried.
    pub fn load<T: BusTransport + ?Sized>(transport: &mut T) -> Result<Calibration, CalibrationError> {
        let dig_t1 = transport.read_word(BMP280_REG_CALIB_DIG_T1).map_err(CalibrationError::Unreadable)?;
        let dig_t2 = transport.read_word(BMP280_REG_CALIB_DIG_T2).map_err(CalibrationError::Unreadable)? as i16;
        let dig_t3 = transport.read_word(BMP280_REG_CALIB_DIG_T3).map_err(CalibrationError::Unreadable)? as i16;
        let calib = Calibration { dig_t1, dig_t2, dig_t3 };
        calib.validate()?;
        debug!("Got calibration data: {calib:?}");
        Ok(calib)
    }

    // -- a zero coefficient is never a factory value, it means the device did not answer properly
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let coefficient = if self.dig_t1 == 0 {
            "dig_T1"
        } else if self.dig_t2 == 0 {
            "dig_T2"
        } else if self.dig_t3 == 0 {
            "dig_T3"
        } else {
            return Ok(())
        };
        warn!("Calibration coefficient {coefficient} read as zero");
        Err(CalibrationError::Invalid { coefficient })
    }
}
