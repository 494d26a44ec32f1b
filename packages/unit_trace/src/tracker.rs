use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use unit_dump::{Frame, Introspect, UnitId, UnitRecord};

use crate::registry::{RUNNING, Registry};

tokio::task_local! {
    static CURRENT: Current;
}

/// The tracked unit the calling task belongs to.
#[derive(Clone)]
pub(crate) struct Current {
    pub(crate) id: UnitId,
    pub(crate) registry: Arc<Registry>,
}

impl Current {
    /// `None` when called from a task that was not spawned through a [`Tracker`].
    pub(crate) fn get() -> Option<Self> {
        CURRENT.try_with(Clone::clone).ok()
    }
}

/// Removes a unit from the registry when its future is dropped, whether it
/// ran to completion, was aborted, or never got polled.
struct Deregister {
    id: UnitId,
    registry: Arc<Registry>,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
        debug!("{} exited", self.id);
    }
}

/// Spawns tokio tasks as tracked units and renders them as a dump.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct Tracker {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker").field("units", &self.len()).finish()
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `future` on the current tokio runtime as a tracked unit.
    ///
    /// `creator` is the function identity recorded as the creation site,
    /// paired with the caller's source location. See [`spawn_tracked!`]
    /// to fill it in from the enclosing function.
    ///
    /// [`spawn_tracked!`]: crate::spawn_tracked
    #[track_caller]
    pub fn spawn<F>(&self, creator: impl Into<String>, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let site = Location::caller();
        let created_by = Frame::new(creator, site.file(), site.line());
        let entry = Frame::new(
            entry_name(std::any::type_name::<F>()),
            site.file(),
            site.line(),
        );

        let id = self.registry.register(entry, created_by);
        debug!("{} spawned at {}:{}", id, site.file(), site.line());

        let current = Current {
            id,
            registry: self.registry.clone(),
        };
        let guard = Deregister {
            id,
            registry: self.registry.clone(),
        };

        tokio::spawn(CURRENT.scope(current, async move {
            let _guard = guard;
            if let Some(current) = Current::get() {
                current.registry.set_reason(current.id, RUNNING);
            }
            future.await
        }))
    }

    /// Number of live tracked units.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records for every live tracked unit, ordered by id.
    pub fn snapshot(&self) -> Vec<UnitRecord> {
        self.registry.snapshot()
    }
}

impl Introspect for Tracker {
    fn dump(&self, buf: &mut [u8]) -> usize {
        let text = unit_dump::render(&self.snapshot());
        unit_dump::fill(buf, text.as_bytes())
    }
}

/// Turn a future's type name into the function it came from.
///
/// `app::worker::run::{{closure}}` becomes `app::worker::run`.
fn entry_name(type_name: &str) -> String {
    function_path(type_name).to_string()
}

/// Strip closure and helper-item suffixes from a type path.
#[doc(hidden)]
pub fn function_path(type_name: &str) -> &str {
    let mut path = type_name;
    loop {
        if let Some(rest) = path.strip_suffix("::{{closure}}") {
            path = rest;
        } else if let Some(rest) = path.strip_suffix("::__unit_trace_here") {
            path = rest;
        } else {
            return path;
        }
    }
}

#[doc(hidden)]
pub fn type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

/// Spawn a tracked unit whose creation site is the enclosing function.
///
/// ```no_run
/// # async fn demo() {
/// let tracker = unit_trace::Tracker::new();
/// let handle = unit_trace::spawn_tracked!(tracker, async { 1 + 1 });
/// assert_eq!(handle.await.unwrap(), 2);
/// # }
/// ```
#[macro_export]
macro_rules! spawn_tracked {
    ($tracker:expr, $future:expr $(,)?) => {{
        fn __unit_trace_here() {}
        let creator = $crate::function_path($crate::type_name_of(__unit_trace_here));
        $tracker.spawn(creator, $future)
    }};
}
