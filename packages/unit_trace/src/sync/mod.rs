//! Blocking primitives that report why a tracked unit is parked.

pub mod mpsc;
mod mutex;

pub use mutex::{Mutex, MutexGuard};
