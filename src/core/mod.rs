// Signal playback and record catalog core

pub mod aggregator;
pub mod catalog;
pub mod constants;
pub mod data_handle;
pub mod error;
pub mod format;
pub mod memory;
pub mod playback;
pub mod repository;
pub mod session;
pub mod source;

use std::sync::{Mutex, MutexGuard, PoisonError};

// A panic while holding one of our locks leaves plain data behind; keep going.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
