//! Text form of a dump.
//!
//! ```text
//! unit 7 [semacquire, locked]:
//! app::store::Store::put(...)
//! 	src/store.rs:88
//! app::worker::run(...)
//! 	src/worker.rs:12
//! created by app::main
//! 	src/main.rs:30
//!
//! ```
//!
//! Each unit is a header line followed by call frames (innermost first) and
//! an optional `created by` entry, every function line paired with a
//! tab-indented `file:line` line. Units are separated by blank lines.
//!
//! Reasons are free text, so the header escapes `\`, `,`, and line breaks
//! (`\\`, `\,`, `\n`, `\r`). An unescaped trailing `, locked` is the lock
//! flag.

use crate::error::{DumpError, Result};
use crate::types::{Frame, UnitId, UnitRecord};

const HEADER_PREFIX: &str = "unit ";
const CREATED_BY: &str = "created by ";
const LOCKED_FLAG: &str = ", locked";
const CALL_SUFFIX: &str = "(...)";

/// Append one unit block, including the trailing blank line.
pub fn write_unit(out: &mut String, unit: &UnitRecord) {
    let flag = if unit.locked { LOCKED_FLAG } else { "" };
    out.push_str(&format!(
        "{}{} [{}{}]:\n",
        HEADER_PREFIX,
        unit.id.0,
        escape_reason(&unit.reason),
        flag
    ));
    for frame in &unit.frames {
        out.push_str(&format!("{}{}\n", frame.func, CALL_SUFFIX));
        out.push_str(&format!("\t{}:{}\n", frame.file, frame.line));
    }
    if let Some(creator) = &unit.created_by {
        out.push_str(&format!("{}{}\n", CREATED_BY, creator.func));
        out.push_str(&format!("\t{}:{}\n", creator.file, creator.line));
    }
    out.push('\n');
}

fn escape_reason(reason: &str) -> String {
    let mut escaped = String::with_capacity(reason.len());
    for c in reason.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Undo [`escape_reason`], splitting off an unescaped trailing lock flag.
///
/// Unknown escapes are kept verbatim so hand-written dumps still load.
fn unescape_reason(body: &str) -> (String, bool) {
    let mut reason = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => reason.push('\n'),
                Some((_, 'r')) => reason.push('\r'),
                Some((_, escaped @ ('\\' | ','))) => reason.push(escaped),
                Some((_, other)) => {
                    reason.push('\\');
                    reason.push(other);
                }
                None => reason.push('\\'),
            },
            ',' if &body[i..] == LOCKED_FLAG => return (reason, true),
            _ => reason.push(c),
        }
    }
    (reason, false)
}

/// Render a full dump.
pub fn render(units: &[UnitRecord]) -> String {
    let mut out = String::with_capacity(units.len() * 128);
    for unit in units {
        write_unit(&mut out, unit);
    }
    out
}

/// Parse a full dump back into records.
pub fn parse(raw: &[u8]) -> Result<Vec<UnitRecord>> {
    let text = std::str::from_utf8(raw)?;
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l)).peekable();
    let mut units = Vec::new();

    while let Some((line_no, line)) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        let mut unit = parse_header(line_no, line)?;

        while let Some(&(line_no, line)) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            lines.next();

            let (func, is_creator) = match line.strip_prefix(CREATED_BY) {
                Some(func) => (func.trim().to_string(), true),
                None => (parse_call(line_no, line)?, false),
            };
            if func.is_empty() {
                return Err(DumpError::malformed(line_no, "empty function name"));
            }

            let (loc_no, loc) = lines
                .next()
                .ok_or_else(|| DumpError::malformed(line_no + 1, "missing source location"))?;
            let (file, line) = parse_location(loc_no, loc)?;
            let frame = Frame { func, file, line };

            if unit.created_by.is_some() {
                return Err(DumpError::malformed(
                    line_no,
                    "entries after `created by` are not allowed",
                ));
            }
            if is_creator {
                unit.created_by = Some(frame);
            } else {
                unit.frames.push(frame);
            }
        }

        units.push(unit);
    }

    Ok(units)
}

fn parse_header(line_no: usize, line: &str) -> Result<UnitRecord> {
    let rest = line
        .strip_prefix(HEADER_PREFIX)
        .ok_or_else(|| DumpError::malformed(line_no, format!("expected unit header, got {line:?}")))?;
    let (id, rest) = rest
        .split_once(" [")
        .ok_or_else(|| DumpError::malformed(line_no, "missing `[` in unit header"))?;
    let id = id
        .parse::<u64>()
        .map_err(|e| DumpError::malformed(line_no, format!("bad unit id {id:?}: {e}")))?;
    let body = rest
        .strip_suffix("]:")
        .ok_or_else(|| DumpError::malformed(line_no, "unit header must end with `]:`"))?;

    let (reason, locked) = unescape_reason(body);
    let mut unit = UnitRecord::new(UnitId(id), reason);
    unit.locked = locked;
    Ok(unit)
}

fn parse_call(line_no: usize, line: &str) -> Result<String> {
    if line.starts_with(char::is_whitespace) || !line.ends_with(')') {
        return Err(DumpError::malformed(line_no, format!("expected call frame, got {line:?}")));
    }
    let open = line
        .rfind('(')
        .ok_or_else(|| DumpError::malformed(line_no, "unbalanced call frame"))?;
    Ok(line[..open].to_string())
}

fn parse_location(line_no: usize, line: &str) -> Result<(String, u32)> {
    let loc = line
        .strip_prefix('\t')
        .ok_or_else(|| DumpError::malformed(line_no, "source location must be tab-indented"))?;
    let (file, num) = loc
        .rsplit_once(':')
        .ok_or_else(|| DumpError::malformed(line_no, "source location must be `file:line`"))?;
    let num = num
        .trim()
        .parse::<u32>()
        .map_err(|e| DumpError::malformed(line_no, format!("bad line number {num:?}: {e}")))?;
    Ok((file.to_string(), num))
}
