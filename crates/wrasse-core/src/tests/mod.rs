mod api;
mod attrs;
mod hooks;
mod mxss;
mod serialize;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// The engine's observable globals (persistent config, hook registry,
/// removed log) are process-wide, so tests exercising the public API
/// serialize on this lock.
pub(crate) fn serial() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}
