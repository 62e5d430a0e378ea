use thiserror::Error;

use crate::i2cio::TransportError;

use super::bmp280_calib::CalibrationError;
use super::bmp280_enums::Bmp280LifecycleState;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("bus transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("found unknown chip id '{found:#04x}', expected '{expected:#04x}'")]
    ChipIdMismatch { found: u8, expected: u8 },
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("device busy, another session is open")]
    Busy,
    #[error("device not ready (state {0})")]
    NotReady(Bmp280LifecycleState),
    #[error("failed to read temperature data: {0}")]
    Read(TransportError),
    #[error("device removed")]
    Removed,
    #[error("session already closed")]
    SessionClosed,
    #[error("device already attached (state {0})")]
    AlreadyAttached(Bmp280LifecycleState),
}
