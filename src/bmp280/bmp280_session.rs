use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

use crate::i2cio::BusTransport;

use super::bmp280_core::DeviceContext;

// -- owner id 0 means the device is free
const SESSION_FREE: u64 = 0;

/// Exclusion token for the single open session of a device context.
///
/// Acquiring never blocks: contention is reported to the caller right away.
pub(crate) struct SessionToken {
    owner: AtomicU64,
    next_id: AtomicU64,
}

impl SessionToken {

    pub(crate) fn new() -> SessionToken {
        SessionToken {
            owner: AtomicU64::new(SESSION_FREE),
            next_id: AtomicU64::new(SESSION_FREE + 1),
        }
    }

    pub(crate) fn try_acquire(&self) -> Option<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.owner
            .compare_exchange(SESSION_FREE, id, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| id)
    }

    // -- only the holder can give the token back
    pub(crate) fn release(&self, id: u64) -> bool {
        self.owner
            .compare_exchange(id, SESSION_FREE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self) -> bool {
        self.owner.load(Ordering::Acquire) != SESSION_FREE
    }
}

// -- the formatted sample of one read cycle and how much of it was handed out
#[derive(Debug, Default)]
pub(crate) struct SampleStream {
    buffer: Option<String>,
    offset: usize,
}

impl SampleStream {

    pub(crate) fn needs_sample(&self) -> bool {
        self.buffer.is_none()
    }

    pub(crate) fn load(&mut self, sample: String) {
        self.buffer = Some(sample);
        self.offset = 0;
    }

    pub(crate) fn take(&mut self, max_bytes: usize) -> String {
        match &self.buffer {
            Some(buffer) => {
                let end = buffer.len().min(self.offset.saturating_add(max_bytes));
                let chunk = buffer[self.offset..end].to_string();
                self.offset = end;
                chunk
            },
            None => String::new(),
        }
    }

    pub(crate) fn rewind(&mut self) {
        self.buffer = None;
        self.offset = 0;
    }
}

/// One consumer's exclusive open session.
///
/// Holds only a weak reference to the device context, so a removed device
/// is reported instead of kept alive. Dropping the handle closes the session.
pub struct SessionHandle<T: BusTransport> {
    pub(crate) context: Weak<DeviceContext<T>>,
    pub(crate) id: u64,
    pub(crate) closed: bool,
    pub(crate) stream: SampleStream,
}

impl<T: BusTransport> SessionHandle<T> {

    pub(crate) fn new(context: Weak<DeviceContext<T>>, id: u64) -> SessionHandle<T> {
        SessionHandle {
            context,
            id,
            closed: false,
            stream: SampleStream::default(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the session; calling it again is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return
        }
        self.closed = true;
        self.stream.rewind();
        if let Some(context) = self.context.upgrade() {
            if context.session.release(self.id) {
                debug!("Session {} released", self.id);
            }
        }
    }
}

impl<T: BusTransport> Drop for SessionHandle<T> {
    fn drop(&mut self) {
        self.close();
    }
}
