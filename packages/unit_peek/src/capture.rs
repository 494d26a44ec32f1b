use tracing::trace;
use unit_dump::{Introspect, UnitRecord};

/// Take one snapshot of every live unit, growing `buf` until the dump fits.
///
/// A dump that fills the whole buffer may have been cut short, so the buffer
/// is doubled and the dump retried. The buffer is never shrunk, letting later
/// captures start at the size that worked. Parse failures are returned as-is.
pub fn capture<S>(source: &S, buf: &mut Vec<u8>) -> unit_dump::Result<Vec<UnitRecord>>
where
    S: Introspect + ?Sized,
{
    if buf.is_empty() {
        buf.resize(1, 0);
    }
    loop {
        let written = source.dump(buf);
        if written < buf.len() {
            return source.parse(&buf[..written]);
        }
        let grown = buf.len() * 2;
        trace!(from = buf.len(), to = grown, "dump filled the buffer, growing");
        buf.resize(grown, 0);
    }
}
