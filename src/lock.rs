use std::sync::{Mutex, MutexGuard};

/// Lock `lock`, taking the inner value back if a pump thread panicked while holding it.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        crate::log_debug(&format!("mutex poisoned in {context}; recovering"));
        tracing::warn!(context, "recovered poisoned mutex");
        poisoned.into_inner()
    })
}
