//! Trace file parsing.
//!
//! A trace is a text file with one upstream event per line:
//! 1. **Read:** `R <addr> <len>` loads `len` bytes from `addr`.
//! 2. **Write:** `W <addr> <hex bytes>` stores the bytes, lowest address first.
//! 3. **Flush:** `X <addr>` waits for in-flight traffic to the cache line holding `addr`.
//! 4. **Fence:** `F` waits for every earlier request.
//!
//! Numbers are decimal or `0x`-prefixed hex. Blank lines and anything after `#` are ignored.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::bridge::UpstreamEvent;
use crate::common::VirtAddr;

/// Failure to load or parse a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A line is not a valid event.
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },
}

/// Parses trace text into events.
///
/// # Errors
///
/// Returns [`TraceError::Malformed`] for the first line that is not a valid event.
///
/// # Examples
///
/// ```
/// use rtlbridge_core::sim::trace;
///
/// let events = trace::parse("R 0x40 16\nW 64 deadbeef # store\nF\n").unwrap();
/// assert_eq!(events.len(), 3);
/// ```
pub fn parse(text: &str) -> Result<Vec<UpstreamEvent>, TraceError> {
    let mut events = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        events.push(parse_line(content).map_err(|reason| TraceError::Malformed { line, reason })?);
    }
    Ok(events)
}

/// Reads and parses the trace at `path`.
///
/// # Errors
///
/// Returns [`TraceError::Io`] if the file cannot be read, or the parse error.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<UpstreamEvent>, TraceError> {
    parse(&fs::read_to_string(path)?)
}

fn parse_line(content: &str) -> Result<UpstreamEvent, String> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    match fields.as_slice() {
        [op, addr, len] if op.eq_ignore_ascii_case("R") => Ok(UpstreamEvent::Read {
            vaddr: VirtAddr::new(parse_number(addr)?),
            len: parse_number(len)?,
        }),
        [op, addr, hex] if op.eq_ignore_ascii_case("W") => Ok(UpstreamEvent::Write {
            vaddr: VirtAddr::new(parse_number(addr)?),
            data: parse_hex_bytes(hex)?,
        }),
        [op, addr] if op.eq_ignore_ascii_case("X") => Ok(UpstreamEvent::Flush {
            vaddr: VirtAddr::new(parse_number(addr)?),
        }),
        [op] if op.eq_ignore_ascii_case("F") => Ok(UpstreamEvent::Fence),
        [op, ..] => Err(format!("unrecognized event `{content}` (op `{op}`)")),
        [] => Err("empty event".to_string()),
    }
}

fn parse_number(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number `{text}`: {e}"))
}

fn parse_hex_bytes(text: &str) -> Result<Vec<u8>, String> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.is_empty() || digits.len() % 2 != 0 {
        return Err(format!("`{text}` is not a whole number of hex bytes"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex byte in `{text}`"))
        })
        .collect()
}
