//! Unit Dump - record model and text format for snapshots of live tasks
//!
//! A dump is a point-in-time listing of every live unit (task) in a process:
//! its id, why it is not running, its call frames and where it was spawned.
//! This crate only describes and decodes dumps. Producing them is up to an
//! [`Introspect`] implementation such as `unit_trace::Tracker`.
//!
//! # Example
//!
//! ```
//! use unit_dump::{Introspect, StaticDump};
//!
//! let source = StaticDump::new("unit 4 [chan receive]:\ncreated by app::main\n\tsrc/main.rs:9\n");
//!
//! let mut buf = vec![0u8; 4096];
//! let n = source.dump(&mut buf);
//! let units = source.parse(&buf[..n]).unwrap();
//!
//! assert_eq!(units[0].reason, "chan receive");
//! assert_eq!(units[0].creator(), "app::main");
//! ```

mod error;
pub mod format;
mod types;

use std::sync::Arc;

pub use error::{DumpError, Result};
pub use format::{parse, render};
pub use types::{Frame, UnitId, UnitRecord};

/// Something that can describe every live unit of a process.
///
/// `dump` copies as much of the current dump as fits into `buf` and returns
/// the number of bytes written. A return value equal to `buf.len()` means the
/// dump may have been cut short and the caller should retry with more room.
pub trait Introspect {
    fn dump(&self, buf: &mut [u8]) -> usize;

    /// Decode bytes previously produced by [`Introspect::dump`].
    fn parse(&self, raw: &[u8]) -> Result<Vec<UnitRecord>> {
        format::parse(raw)
    }
}

impl<T: Introspect + ?Sized> Introspect for &T {
    fn dump(&self, buf: &mut [u8]) -> usize {
        (**self).dump(buf)
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<UnitRecord>> {
        (**self).parse(raw)
    }
}

impl<T: Introspect + ?Sized> Introspect for Arc<T> {
    fn dump(&self, buf: &mut [u8]) -> usize {
        (**self).dump(buf)
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<UnitRecord>> {
        (**self).parse(raw)
    }
}

/// Copy as much of `dump` as fits into `buf`, returning the bytes written.
pub fn fill(buf: &mut [u8], dump: &[u8]) -> usize {
    let n = dump.len().min(buf.len());
    buf[..n].copy_from_slice(&dump[..n]);
    n
}

/// A dump captured earlier and held in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticDump {
    bytes: Vec<u8>,
}

impl StaticDump {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn from_units(units: &[UnitRecord]) -> Self {
        Self::new(render(units))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Introspect for StaticDump {
    fn dump(&self, buf: &mut [u8]) -> usize {
        fill(buf, &self.bytes)
    }
}
