//! Unit Trace - tracked tokio tasks that can be dumped
//!
//! Tasks spawned through a [`Tracker`] are registered as units. The
//! primitives in this crate ([`sync::Mutex`], [`sync::mpsc`], [`time::sleep`],
//! [`park`]) record why a unit is blocked while it waits, so a [`Tracker`]
//! can produce a dump of every live unit at any moment through
//! [`unit_dump::Introspect`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unit_trace::{Tracker, spawn_tracked, sync::Mutex};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tracker = Tracker::new();
//!     let shared = Arc::new(Mutex::new(0u32));
//!
//!     let guard = shared.lock().await;
//!     for _ in 0..3 {
//!         let shared = shared.clone();
//!         spawn_tracked!(tracker, async move {
//!             *shared.lock().await += 1;
//!         });
//!     }
//!     tokio::task::yield_now().await;
//!
//!     for unit in tracker.snapshot() {
//!         println!("{} [{}] created by {}", unit.id, unit.reason, unit.creator());
//!     }
//!     drop(guard);
//! }
//! ```

mod park;
mod registry;
pub mod sync;
pub mod time;
mod tracker;

pub use park::{park, select_pending};
#[doc(hidden)]
pub use tracker::{function_path, type_name_of};
pub use tracker::Tracker;
