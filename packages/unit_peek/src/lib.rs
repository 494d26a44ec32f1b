//! # Unit Peek
//!
//! Wait for the tasks of a process to reach an expected blocking state
//! instead of sleeping in tests.
//!
//! Tests that need "three workers parked on the lock" before they go on
//! usually sleep for a while and hope. A [`Condition`] instead takes a dump of
//! every live unit (task), classifies each unit's block reason into a
//! [`State`], keeps the units matching every filter, and can poll until that
//! set is non-empty.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use unit_peek::{Condition, State};
//! use unit_trace::{Tracker, spawn_tracked, sync::Mutex};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> unit_peek::Result<()> {
//! let tracker = Tracker::new();
//! let lock = Arc::new(Mutex::new(()));
//!
//! let guard = lock.lock().await;
//! for _ in 0..3 {
//!     let lock = lock.clone();
//!     spawn_tracked!(tracker, async move {
//!         let _guard = lock.lock().await;
//!     });
//! }
//!
//! let waiting = Condition::new(&tracker)
//!     .state_is(State::WaitingLock)
//!     .count_eq(3)
//!     .wait(Duration::from_secs(1))
//!     .await?;
//! assert_eq!(waiting.len(), 3);
//! drop(guard);
//! # Ok(())
//! # }
//! ```
//!
//! ## Filters
//!
//! Unit filters ([`Condition::state_is`], [`Condition::created_by_matching`],
//! [`Condition::filter_unit`], ...) narrow the candidate units. Set filters
//! ([`Condition::count_eq`], [`Condition::filter_set`], ...) accept or reject
//! whatever is left at that point. Filters run in the order they were added,
//! and evaluation stops as soon as nothing can match.
//!
//! ## Sources
//!
//! Anything implementing [`Introspect`] can be observed: a
//! `unit_trace::Tracker`, a [`StaticDump`] read from disk, or a custom
//! source wrapping another runtime's task dump.

mod capture;
mod condition;
mod config;
mod error;
mod state;

pub use capture::capture;
pub use condition::{Condition, Filter, SetFn, UnitFn};
pub use config::{ConditionConfig, ENV_PREFIX};
pub use error::{PeekError, Result};
pub use state::{State, UnknownState, classify};
pub use unit_dump::{DumpError, Frame, Introspect, StaticDump, UnitId, UnitRecord};
