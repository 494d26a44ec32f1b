use std::fmt;
use std::str::FromStr;

/// Canonical state a unit's free-form block reason is classified into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    Runnable,
    Running,
    SysCall,
    Waiting,
    Dead,
    Enqueue,
    CopyStack,
    /// Blocked in a timed sleep.
    Sleeping,
    WaitingChannel,
    WaitingSelect,
    /// Blocked on some garbage-collector or allocator activity.
    WaitingGCActivity,
    /// Blocked on network or file readiness.
    WaitingIO,
    /// Blocked acquiring a lock or semaphore.
    WaitingLock,
    /// Anything no rule recognizes. Never an error.
    Other,
}

/// Reasons that map to a state only when matched exactly.
static EXACT: &[(&str, State)] = &[
    ("idle", State::Idle),
    ("runnable", State::Runnable),
    ("running", State::Running),
    ("syscall", State::SysCall),
    ("waiting", State::Waiting),
    ("dead", State::Dead),
    ("enqueue", State::Enqueue),
    ("copystack", State::CopyStack),
    ("sleep", State::Sleeping),
    ("IO wait", State::WaitingIO),
];

/// Checked in order after the exact table.
static PREFIX: &[(&str, State)] = &[
    ("sem", State::WaitingLock),
    ("chan", State::WaitingChannel),
    ("select", State::WaitingSelect),
];

const GC_PREFIX: &str = "garbage";
const GC_INFIX: &str = "gc ";

/// Classify a raw block reason such as `"chan receive"` or `"semacquire"`.
pub fn classify(reason: &str) -> State {
    if let Some((_, state)) = EXACT.iter().find(|(text, _)| *text == reason) {
        return *state;
    }
    if let Some((_, state)) = PREFIX.iter().find(|(prefix, _)| reason.starts_with(prefix)) {
        return *state;
    }
    let lower = reason.to_lowercase();
    if lower.starts_with(GC_PREFIX) || lower.contains(GC_INFIX) {
        return State::WaitingGCActivity;
    }
    State::Other
}

impl State {
    pub const ALL: [State; 15] = [
        State::Idle,
        State::Runnable,
        State::Running,
        State::SysCall,
        State::Waiting,
        State::Dead,
        State::Enqueue,
        State::CopyStack,
        State::Sleeping,
        State::WaitingChannel,
        State::WaitingSelect,
        State::WaitingGCActivity,
        State::WaitingIO,
        State::WaitingLock,
        State::Other,
    ];

    pub fn from_reason(reason: &str) -> Self {
        classify(reason)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Runnable => "runnable",
            State::Running => "running",
            State::SysCall => "sys-call",
            State::Waiting => "waiting",
            State::Dead => "dead",
            State::Enqueue => "enqueue",
            State::CopyStack => "copy-stack",
            State::Sleeping => "sleeping",
            State::WaitingChannel => "waiting-channel",
            State::WaitingSelect => "waiting-select",
            State::WaitingGCActivity => "waiting-gc-activity",
            State::WaitingIO => "waiting-io",
            State::WaitingLock => "waiting-lock",
            State::Other => "other",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for [`State::from_str`], which parses state names, not reasons.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown state {0:?}")]
pub struct UnknownState(pub String);

impl FromStr for State {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        State::ALL
            .iter()
            .find(|state| state.as_str() == wanted || state.as_str().replace('-', "") == wanted)
            .copied()
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}
