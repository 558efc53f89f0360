//! Shared state
//!
//! State written by the sampling loop and read elsewhere (control task,
//! interrupt handlers) lives behind a critical-section mutex. Every access
//! is a short closure, so preemption is only held off for the copy.
//!
//! # Access Pattern
//! ```rust,ignore
//! if let Some(attitude) = ORIENTATION.get() { /* ... */ }
//! ORIENTATION.set(None);
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

use crate::fusion::complementary::OrientationState;

/// Latest orientation published by the attitude loop
///
/// `None` until the loop produces its first estimate, and again whenever it
/// is stopped or has given up on the sensor.
pub static ORIENTATION: Shared<Option<OrientationState>> = Shared::new(None);

/// External heading reference in degrees (compass, GPS course), `None` when unavailable
pub static HEADING_REFERENCE: Shared<Option<f32>> = Shared::new(None);

/// Value guarded by a critical section
pub struct Shared<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<T>>,
}

impl<T> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access to the value
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<T: Copy> Shared<T> {
    /// Copy of the current value
    pub fn get(&self) -> T {
        self.lock(|value| *value)
    }

    /// Replace the current value
    pub fn set(&self, value: T) {
        self.lock(|current| *current = value);
    }
}
