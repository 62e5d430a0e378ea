use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::i2cio::BusTransport;

use super::bmp280_calib::Calibration;
use super::bmp280_compensation::{compensate, format_centi_celsius, raw_from_bytes};
use super::bmp280_enums::*;
use super::bmp280_errors::DeviceError;
use super::bmp280_session::{SessionHandle, SessionToken};

pub const BMP280_DEVICE_NAME: &str = "bmp280";

// -- chip id
const BMP280_CHIP_ID: u8 = 0x58;

// -- registers
const BMP280_REG_CHIP_ID: u8 = 0xd0;
const BMP280_REG_CTRL_MEAS: u8 = 0xf4;
const BMP280_REG_TEMP_MSB: u8 = 0xfa;
const BMP280_REG_TEMP_LSB: u8 = 0xfb;
const BMP280_REG_TEMP_XLSB: u8 = 0xfc;

// -- normal mode, temperature x1, pressure x1
const BMP280_CTRL_MEAS: u8 = ctrl_meas_value(Bmp280OverSampling::X1, Bmp280OverSampling::X1,
    Bmp280PowerMode::Normal);

/// The byte-stream file operations a host harness dispatches to.
pub trait CharDevice {
    type Session;

    fn open(&self) -> Result<Self::Session, DeviceError>;
    fn read(&self, session: &mut Self::Session, max_bytes: usize) -> Result<String, DeviceError>;
    fn release(&self, session: &mut Self::Session);
}

struct ContextState<T> {
    lifecycle: Bmp280LifecycleState,
    transport: Option<T>,
    chip_id: Option<u8>,
    calibration: Option<Calibration>,
}

/// Everything known about one attached sensor.
///
/// All bus traffic goes through `state`, detection included. `removal_pending`
/// is raised before detach takes the lock so that a running transfer sequence
/// gives up at its next register access.
pub(crate) struct DeviceContext<T: BusTransport> {
    state: Mutex<ContextState<T>>,
    removal_pending: AtomicBool,
    pub(crate) session: SessionToken,
}

impl<T: BusTransport> DeviceContext<T> {

    fn new() -> DeviceContext<T> {
        DeviceContext {
            state: Mutex::new(ContextState {
                lifecycle: Bmp280LifecycleState::Unattached,
                transport: None,
                chip_id: None,
                calibration: None,
            }),
            removal_pending: AtomicBool::new(false),
            session: SessionToken::new(),
        }
    }

    // -- the state is consistent after every statement, a panicking holder cannot corrupt it
    fn lock_state(&self) -> MutexGuard<'_, ContextState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_removed(&self) -> bool {
        self.removal_pending.load(Ordering::Acquire)
    }

    fn check_removed(&self) -> Result<(), DeviceError> {
        if self.is_removed() {
            return Err(DeviceError::Removed)
        }
        Ok(())
    }

    fn lifecycle(&self) -> Bmp280LifecycleState {
        if self.is_removed() {
            return Bmp280LifecycleState::Removed
        }
        self.lock_state().lifecycle
    }

    fn check_ready(&self) -> Result<(), DeviceError> {
        match self.lifecycle() {
            Bmp280LifecycleState::Ready => Ok(()),
            lifecycle => Err(DeviceError::NotReady(lifecycle)),
        }
    }

    fn claim_for_detection(&self) -> Result<(), DeviceError> {
        let mut state = self.lock_state();
        if state.lifecycle != Bmp280LifecycleState::Unattached {
            return Err(DeviceError::AlreadyAttached(state.lifecycle))
        }
        state.lifecycle = Bmp280LifecycleState::Detecting;
        Ok(())
    }

    fn detect(&self, transport: T) -> Result<(), DeviceError> {
        let mut state = self.lock_state();
        state.transport = Some(transport);
        match self.run_detection(&mut state) {
            Ok((chip_id, calibration)) => {
                state.chip_id = Some(chip_id);
                state.calibration = Some(calibration);
                state.lifecycle = Bmp280LifecycleState::Ready;
                info!("BMP280 ready, chip id {chip_id:#04x}");
                Ok(())
            },
            Err(DeviceError::Removed) => {
                state.transport = None;
                state.lifecycle = Bmp280LifecycleState::Removed;
                info!("BMP280 removed during detection");
                Err(DeviceError::Removed)
            },
            Err(err) => {
                state.lifecycle = Bmp280LifecycleState::Faulted;
                warn!("BMP280 detection failed: {err}");
                Err(err)
            },
        }
    }

    fn run_detection(&self, state: &mut ContextState<T>) -> Result<(u8, Calibration), DeviceError> {
        let transport = state.transport.as_mut().ok_or(DeviceError::Removed)?;
        // -- check if device is available by reading chip id
        self.check_removed()?;
        let chip_id = transport.read_byte(BMP280_REG_CHIP_ID)?;
        if chip_id != BMP280_CHIP_ID {
            return Err(DeviceError::ChipIdMismatch { found: chip_id, expected: BMP280_CHIP_ID })
        }
        debug!("Got chip id: {chip_id:#x}");
        // -- get calibration data
        self.check_removed()?;
        let calibration = Calibration::load(transport)?;
        // -- start continuous measurements
        self.check_removed()?;
        debug!("Setting register BMP280_REG_CTRL_MEAS {BMP280_REG_CTRL_MEAS:#x} to value {BMP280_CTRL_MEAS:#010b}");
        transport.write_byte(BMP280_REG_CTRL_MEAS, BMP280_CTRL_MEAS)?;
        Ok((chip_id, calibration))
    }

    // -- a failed transfer is reported to this caller only, the device stays ready
    fn sample(&self) -> Result<i32, DeviceError> {
        let mut state = self.lock_state();
        self.check_removed()?;
        if state.lifecycle != Bmp280LifecycleState::Ready {
            return Err(DeviceError::NotReady(state.lifecycle))
        }
        let calibration = state.calibration.ok_or(DeviceError::NotReady(state.lifecycle))?;
        let transport = state.transport.as_mut().ok_or(DeviceError::Removed)?;
        let msb = transport.read_byte(BMP280_REG_TEMP_MSB).map_err(DeviceError::Read)?;
        self.check_removed()?;
        let lsb = transport.read_byte(BMP280_REG_TEMP_LSB).map_err(DeviceError::Read)?;
        self.check_removed()?;
        let xlsb = transport.read_byte(BMP280_REG_TEMP_XLSB).map_err(DeviceError::Read)?;
        let raw = raw_from_bytes(msb, lsb, xlsb);
        let temperature = compensate(raw, &calibration);
        debug!("Got raw temperature {raw}, compensated {temperature}");
        Ok(temperature)
    }

    fn remove(&self) {
        self.removal_pending.store(true, Ordering::Release);
        let mut state = self.lock_state();
        state.transport = None;
        state.lifecycle = Bmp280LifecycleState::Removed;
    }
}

/// BMP280 temperature driver.
///
/// Owns the device context of the currently attached sensor. Share it between
/// consumers with an `Arc`; sessions are serialized by the context's token.
pub struct BMP280<T: BusTransport> {
    // -- device address
    device_addr: Bmp280DeviceAddress,
    // -- replaced by a fresh context when a removed device is attached again
    context: RwLock<Arc<DeviceContext<T>>>,
}

impl<T: BusTransport> BMP280<T> {

    pub fn new(device_addr: Bmp280DeviceAddress) -> BMP280<T> {
        BMP280 {
            device_addr,
            context: RwLock::new(Arc::new(DeviceContext::new())),
        }
    }

    pub fn get_device_addr(&self) -> Bmp280DeviceAddress {
        self.device_addr
    }

    fn current(&self) -> Arc<DeviceContext<T>> {
        self.context.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Bus attach notification: runs detection on `transport`.
    ///
    /// On failure the context stays `Faulted` until `detach` and a new attach.
    pub fn attach(&self, transport: T) -> Result<(), DeviceError> {
        let context = {
            let mut current = self.context.write().unwrap_or_else(PoisonError::into_inner);
            if current.lifecycle() == Bmp280LifecycleState::Removed {
                *current = Arc::new(DeviceContext::new());
            }
            current.claim_for_detection()?;
            current.clone()
        };
        info!("Detecting {BMP280_DEVICE_NAME} at {}", self.device_addr);
        context.detect(transport)
    }

    /// Detach notification: the context becomes `Removed` and the bus is released.
    pub fn detach(&self) {
        let context = self.current();
        context.remove();
        info!("{BMP280_DEVICE_NAME} at {} removed", self.device_addr);
    }

    pub fn state(&self) -> Bmp280LifecycleState {
        self.current().lifecycle()
    }

    pub fn is_removed(&self) -> bool {
        self.current().is_removed()
    }

    pub fn chip_id(&self) -> Option<u8> {
        self.current().lock_state().chip_id
    }

    pub fn calibration(&self) -> Option<Calibration> {
        self.current().lock_state().calibration
    }

    /// Opens the single session; contention fails with `Busy` without waiting.
    ///
    /// A context that is not `Ready` always answers `NotReady`, never `Busy`.
    pub fn open(&self) -> Result<SessionHandle<T>, DeviceError> {
        let context = self.current();
        context.check_ready()?;
        let Some(id) = context.session.try_acquire() else {
            // -- the holder may be a racing open that is about to give up
            context.check_ready()?;
            return Err(DeviceError::Busy)
        };
        let lifecycle = context.lifecycle();
        if lifecycle != Bmp280LifecycleState::Ready {
            context.session.release(id);
            return Err(DeviceError::NotReady(lifecycle))
        }
        debug!("Session {id} opened");
        Ok(SessionHandle::new(Arc::downgrade(&context), id))
    }

    /// Reads up to `max_bytes` of the current sample, sampling the sensor on
    /// the first read of a cycle. A drained cycle reads as empty.
    pub fn read(&self, handle: &mut SessionHandle<T>, max_bytes: usize) -> Result<String, DeviceError> {
        if handle.closed {
            return Err(DeviceError::SessionClosed)
        }
        let context = handle.context.upgrade().ok_or(DeviceError::Removed)?;
        context.check_removed()?;
        if max_bytes == 0 {
            return Ok(String::new())
        }
        if handle.stream.needs_sample() {
            let temperature = context.sample()?;
            handle.stream.load(format_centi_celsius(temperature));
        }
        Ok(handle.stream.take(max_bytes))
    }

    /// Starts a new read cycle so the next `read` samples the sensor again.
    pub fn rewind(&self, handle: &mut SessionHandle<T>) -> Result<(), DeviceError> {
        if handle.closed {
            return Err(DeviceError::SessionClosed)
        }
        let context = handle.context.upgrade().ok_or(DeviceError::Removed)?;
        context.check_removed()?;
        handle.stream.rewind();
        Ok(())
    }

    pub fn close(&self, handle: &mut SessionHandle<T>) {
        handle.close();
    }
}

impl<T: BusTransport> CharDevice for BMP280<T> {
    type Session = SessionHandle<T>;

    fn open(&self) -> Result<SessionHandle<T>, DeviceError> {
        BMP280::open(self)
    }

    fn read(&self, session: &mut SessionHandle<T>, max_bytes: usize) -> Result<String, DeviceError> {
        BMP280::read(self, session, max_bytes)
    }

    fn release(&self, session: &mut SessionHandle<T>) {
        self.close(session)
    }
}
