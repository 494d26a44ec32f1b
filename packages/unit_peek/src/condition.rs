use regex::Regex;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use unit_dump::{Introspect, UnitRecord};

use crate::capture::capture;
use crate::config::ConditionConfig;
use crate::error::{PeekError, Result};
use crate::state::{State, classify};

pub type UnitFn = Box<dyn Fn(&UnitRecord) -> bool + Send + Sync>;
pub type SetFn = Box<dyn Fn(&[UnitRecord]) -> bool + Send + Sync>;

/// One predicate of a [`Condition`].
pub enum Filter {
    /// Keeps the units it returns `true` for.
    Unit(UnitFn),
    /// Accepts or rejects the remaining units as a whole.
    Set(SetFn),
}

impl Filter {
    pub fn unit(f: impl Fn(&UnitRecord) -> bool + Send + Sync + 'static) -> Self {
        Self::Unit(Box::new(f))
    }

    pub fn set(f: impl Fn(&[UnitRecord]) -> bool + Send + Sync + 'static) -> Self {
        Self::Set(Box::new(f))
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(_) => f.write_str("Filter::Unit(..)"),
            Self::Set(_) => f.write_str("Filter::Set(..)"),
        }
    }
}

/// Describes which units should exist and what they should be doing.
///
/// Filters are added with chained calls and checked against a fresh dump on
/// every [`eval`](Self::eval). The result is the set of units satisfying
/// every filter; an empty result means "not yet".
///
/// ```no_run
/// # async fn demo(tracker: unit_trace::Tracker) -> unit_peek::Result<()> {
/// use std::time::Duration;
/// use unit_peek::{Condition, State};
///
/// let parked = Condition::new(&tracker)
///     .created_by_matching(r"^my_crate::pool::")?
///     .state_is(State::WaitingLock)
///     .count_eq(3)
///     .wait(Duration::from_secs(1))
///     .await?;
/// assert_eq!(parked.len(), 3);
/// # Ok(())
/// # }
/// ```
///
/// A condition owns its dump buffer and is meant for one caller at a time;
/// every operation takes `&mut self`.
pub struct Condition<S> {
    source: S,
    filters: Vec<Filter>,
    buf: Vec<u8>,
}

impl<S> fmt::Debug for Condition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("filters", &self.filters)
            .field("buffer_size", &self.buf.len())
            .finish()
    }
}

impl<S: Introspect> Condition<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, &ConditionConfig::default())
    }

    pub fn with_config(source: S, config: &ConditionConfig) -> Self {
        Self {
            source,
            filters: Vec::with_capacity(config.filter_capacity),
            buf: vec![0; config.buffer_size],
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current dump buffer size. Only grows.
    pub fn buffer_size(&self) -> usize {
        self.buf.len()
    }

    /// Number of filters added so far.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Drop every filter, keeping the dump buffer for reuse.
    pub fn clear(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    pub fn filter(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn filter_unit(
        &mut self,
        f: impl Fn(&UnitRecord) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.filter(Filter::unit(f))
    }

    pub fn filter_set(
        &mut self,
        f: impl Fn(&[UnitRecord]) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.filter(Filter::set(f))
    }

    /// More than `v` units remain.
    pub fn count_gt(&mut self, v: usize) -> &mut Self {
        self.filter_set(move |units| units.len() > v)
    }

    /// Fewer than `v` units remain.
    pub fn count_lt(&mut self, v: usize) -> &mut Self {
        self.filter_set(move |units| units.len() < v)
    }

    /// Exactly `v` units remain.
    pub fn count_eq(&mut self, v: usize) -> &mut Self {
        self.filter_set(move |units| units.len() == v)
    }

    pub fn state_is(&mut self, state: State) -> &mut Self {
        self.filter_unit(move |unit| classify(&unit.reason) == state)
    }

    pub fn state_is_not(&mut self, state: State) -> &mut Self {
        self.filter_unit(move |unit| classify(&unit.reason) != state)
    }

    pub fn state_in(&mut self, states: &[State]) -> &mut Self {
        let states = states.to_vec();
        self.filter_unit(move |unit| states.contains(&classify(&unit.reason)))
    }

    /// Keep units whose creation-site function matches `pattern`.
    pub fn created_by(&mut self, pattern: Regex) -> &mut Self {
        self.filter_unit(move |unit| pattern.is_match(unit.creator()))
    }

    /// Like [`created_by`](Self::created_by), compiling `pattern` first.
    ///
    /// An invalid pattern is reported here, before anything is evaluated.
    pub fn created_by_matching(&mut self, pattern: &str) -> Result<&mut Self> {
        let pattern = Regex::new(pattern)?;
        Ok(self.created_by(pattern))
    }

    /// Keep units with any call frame whose function matches `pattern`.
    pub fn in_function(&mut self, pattern: &str) -> Result<&mut Self> {
        let pattern = Regex::new(pattern)?;
        Ok(self.filter_unit(move |unit| {
            unit.frames.iter().any(|frame| pattern.is_match(&frame.func))
        }))
    }

    /// Keep units currently holding a lock.
    pub fn holding_lock(&mut self) -> &mut Self {
        self.filter_unit(|unit| unit.locked)
    }

    /// Apply every filter, in order, to an already captured snapshot.
    ///
    /// Stops at the first unit filter that leaves nothing or the first set
    /// filter that rejects; later filters are not called.
    pub fn matching(&self, mut units: Vec<UnitRecord>) -> Vec<UnitRecord> {
        for filter in &self.filters {
            match filter {
                Filter::Unit(keep) => {
                    units.retain(|unit| keep(unit));
                    if units.is_empty() {
                        return units;
                    }
                }
                Filter::Set(accept) => {
                    if !accept(&units) {
                        units.clear();
                        return units;
                    }
                }
            }
        }
        units
    }

    /// Capture a dump and return the units satisfying every filter.
    ///
    /// An empty vector means the condition does not hold right now. Nothing
    /// keeps the units in the returned state after the dump was taken.
    pub fn eval(&mut self) -> Result<Vec<UnitRecord>> {
        let snapshot = capture(&self.source, &mut self.buf)?;
        let total = snapshot.len();
        let units = self.matching(snapshot);
        trace!(total, matched = units.len(), "evaluated condition");
        Ok(units)
    }

    /// Call [`eval`](Self::eval) until it matches something.
    ///
    /// Yields to the scheduler between attempts rather than sleeping. Returns
    /// [`PeekError::Timeout`] once more than `timeout` has passed, or waits
    /// indefinitely if `timeout` is zero. As with `eval`, the units may have
    /// moved on by the time the caller looks at them.
    pub async fn wait(&mut self, timeout: Duration) -> Result<Vec<UnitRecord>> {
        let start = Instant::now();
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            let units = self.eval()?;
            if !units.is_empty() {
                debug!(attempts, elapsed = ?start.elapsed(), matched = units.len(), "condition satisfied");
                return Ok(units);
            }
            if !timeout.is_zero() && start.elapsed() > timeout {
                debug!(attempts, ?timeout, "condition timed out");
                return Err(PeekError::Timeout(timeout));
            }
            tokio::task::yield_now().await;
        }
    }
}
