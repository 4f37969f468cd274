//! Binary exclusion lock shared by independent scheduling contexts.
//!
//! Unlike a mutex guard, ownership of the lock is not tied to a scope: one
//! handler invocation may acquire it and a later invocation on the same or
//! another context may release it. Scoped users take an [`ExclusionGuard`].

use crate::sync::{Arc, Condvar, Mutex};

struct LockInner {
    locked: Mutex<bool>,
    released: Condvar,
}

/// Process-wide binary lock.
///
/// Cloning yields another handle to the same lock.
#[derive(Clone)]
pub struct ExclusionLock {
    inner: Arc<LockInner>,
}

impl ExclusionLock {
    /// Creates an unlocked lock.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LockInner {
                locked: Mutex::new(false),
                released: Condvar::new(),
            }),
        }
    }

    /// Blocks until the lock is free, then takes it.
    pub fn acquire(&self) {
        let mut locked = self.inner.locked.lock();
        while *locked {
            self.inner.released.wait(&mut locked);
        }
        *locked = true;
    }

    /// Takes the lock if it is free.
    pub fn try_acquire(&self) -> bool {
        let mut locked = self.inner.locked.lock();
        if *locked {
            false
        } else {
            *locked = true;
            true
        }
    }

    /// Gives the lock back.
    ///
    /// Returns `false` if the lock was not held, leaving it unchanged.
    pub fn release(&self) -> bool {
        let mut locked = self.inner.locked.lock();
        if !*locked {
            return false;
        }
        *locked = false;
        drop(locked);
        self.inner.released.notify_one();
        true
    }

    pub fn is_locked(&self) -> bool {
        *self.inner.locked.lock()
    }

    /// Acquires the lock for the lifetime of the returned guard.
    pub fn guard(&self) -> ExclusionGuard<'_> {
        self.acquire();
        ExclusionGuard { lock: self }
    }
}

impl Default for ExclusionLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped ownership of an [`ExclusionLock`].
pub struct ExclusionGuard<'a> {
    lock: &'a ExclusionLock,
}

impl Drop for ExclusionGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
