use std::ops::{Deref, DerefMut};
use std::panic::Location;

use crate::park::park_at;
use crate::tracker::Current;

const LOCK_REASON: &str = "semacquire";

/// An async mutex whose waiters show up as `semacquire` and whose holders are
/// flagged as locked.
#[derive(Debug, Default)]
pub struct Mutex<T> {
    inner: tokio::sync::Mutex<T>,
}

impl<T> Mutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: tokio::sync::Mutex::new(value),
        }
    }

    #[track_caller]
    pub fn lock(&self) -> impl Future<Output = MutexGuard<'_, T>> {
        let site = Location::caller();
        async move {
            let guard = park_at(
                "unit_trace::sync::Mutex::lock",
                LOCK_REASON.to_string(),
                site,
                self.inner.lock(),
            )
            .await;
            MutexGuard::new(guard)
        }
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.try_lock().ok().map(MutexGuard::new)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

pub struct MutexGuard<'a, T> {
    inner: tokio::sync::MutexGuard<'a, T>,
    holder: Option<Current>,
}

impl<'a, T> MutexGuard<'a, T> {
    fn new(inner: tokio::sync::MutexGuard<'a, T>) -> Self {
        let holder = Current::get();
        if let Some(holder) = &holder {
            holder.registry.lock_acquired(holder.id);
        }
        Self { inner, holder }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(holder) = &self.holder {
            holder.registry.lock_released(holder.id);
        }
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.inner, f)
    }
}
