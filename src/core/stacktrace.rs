//! Stacktrace capture for annotated entries

use super::log_entry::Caller;
use std::backtrace::Backtrace;

/// Frames from these paths are logging machinery, not the caller's code
const INTERNAL_FRAMES: &[&str] = &[
    "std::backtrace",
    "teelog::core::stacktrace::",
    "teelog::core::logger::Logger",
    "<teelog::core::logger::Logger",
    "teelog::core::tee::",
    "<teelog::core::tee::",
    "teelog::reporting::",
    "<teelog::reporting::",
];

/// Capture the current stack, starting at the first frame outside the logger
///
/// `skip` drops that many further frames, for callers that wrap the logger
/// in helpers of their own.
pub fn capture(skip: usize) -> String {
    trim(&Backtrace::force_capture().to_string(), skip)
}

/// Resolve the source location `skip` frames above the logger's caller
///
/// `None` when the frame is missing or carries no file information, as in
/// builds without debug info.
pub fn caller(skip: usize) -> Option<Caller> {
    resolve_caller(&Backtrace::force_capture().to_string(), skip)
}

pub(crate) fn trim(rendered: &str, skip: usize) -> String {
    let frames = split_frames(rendered);

    let mut out = String::new();
    for (number, frame) in frames.iter().skip(first_external(&frames) + skip).enumerate() {
        out.push_str(&format!("{:>4}: {}\n", number, frame_symbol(frame)));
        for line in frame.iter().skip(1) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

pub(crate) fn resolve_caller(rendered: &str, skip: usize) -> Option<Caller> {
    let frames = split_frames(rendered);
    let frame = frames.get(first_external(&frames) + skip)?;
    frame.iter().skip(1).find_map(|line| frame_location(line))
}

fn first_external(frames: &[Vec<&str>]) -> usize {
    frames
        .iter()
        .rposition(|frame| {
            let symbol = frame_symbol(frame);
            INTERNAL_FRAMES.iter().any(|marker| symbol.starts_with(marker))
        })
        .map_or(0, |i| i + 1)
}

/// Parse an `at path:line:column` line
fn frame_location(line: &str) -> Option<Caller> {
    let location = line.trim_start().strip_prefix("at ")?;
    let mut parts = location.trim_end().rsplitn(3, ':');
    let _column = parts.next()?;
    let line = parts.next()?.parse().ok()?;
    let path = parts.next()?;
    let path = path.strip_prefix("./").unwrap_or(path);
    Some(Caller::new(path.to_string(), line))
}

/// Group rendered lines into frames, each starting with `N: symbol`
fn split_frames(rendered: &str) -> Vec<Vec<&str>> {
    let mut frames: Vec<Vec<&str>> = Vec::new();
    for line in rendered.lines() {
        if frame_number(line).is_some() || frames.is_empty() {
            frames.push(vec![line]);
        } else if let Some(frame) = frames.last_mut() {
            frame.push(line);
        }
    }
    frames
}

fn frame_number(line: &str) -> Option<&str> {
    let (head, _) = line.trim_start().split_once(": ")?;
    (!head.is_empty() && head.bytes().all(|b| b.is_ascii_digit())).then_some(head)
}

fn frame_symbol<'a>(frame: &[&'a str]) -> &'a str {
    frame
        .first()
        .and_then(|line| line.trim_start().split_once(": "))
        .map_or("", |(_, symbol)| symbol.trim())
}
