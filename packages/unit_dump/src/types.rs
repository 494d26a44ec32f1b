use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a unit within one process.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// A function together with the source location it was observed at.
///
/// Used both for call-stack frames and for the site a unit was spawned from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Fully qualified function path, e.g. `my_crate::worker::run`.
    pub func: String,
    pub file: String,
    pub line: u32,
}

impl Frame {
    pub fn new(func: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            func: func.into(),
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.func, self.file, self.line)
    }
}

/// Snapshot of a single unit as seen in one dump.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: UnitId,
    /// Free-form reason the unit is not running, e.g. `chan receive`.
    pub reason: String,
    /// Innermost frame first.
    pub frames: Vec<Frame>,
    /// `None` for the root unit, which was not spawned by anyone.
    pub created_by: Option<Frame>,
    /// Whether the unit currently holds a lock.
    pub locked: bool,
}

impl UnitRecord {
    pub fn new(id: UnitId, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
            frames: Vec::new(),
            created_by: None,
            locked: false,
        }
    }

    /// Function identity of the creation site, or `""` for the root unit.
    pub fn creator(&self) -> &str {
        self.created_by
            .as_ref()
            .map(|frame| frame.func.as_str())
            .unwrap_or("")
    }

    /// The innermost frame, if the unit reported any.
    pub fn top_frame(&self) -> Option<&Frame> {
        self.frames.first()
    }
}
