//! Call-stack capture and trimming for fault reports.
//!
//! A fault's traceback should start where the user's code went wrong, not in
//! the assertion internals, and it should stop before the frames that belong
//! to the runner. Capture walks the resolved backtrace, drops the machinery
//! at the innermost end, and cuts off at the first runner frame it meets on
//! the way out. Entries carry the source line when the file is readable.

use std::fmt;
use std::fs;
use std::panic::Location;

/// One frame of a trimmed traceback, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackEntry {
    pub file: String,
    pub line: u32,
    pub function: String,
    /// The trimmed source line, when the file could be read.
    pub source: Option<String>,
}

impl TracebackEntry {
    pub(crate) fn new(file: String, line: u32, function: String) -> Self {
        let source = read_source_line(&file, line);
        Self {
            file,
            line,
            function,
            source,
        }
    }

    /// The function-and-source portion of the entry, without the location.
    /// Reporters pair this with `file`/`line` when they color the parts
    /// separately.
    pub fn info(&self) -> String {
        match &self.source {
            Some(source) => format!("{}(): {source}", self.function),
            None => format!("{}()", self.function),
        }
    }
}

impl fmt::Display for TracebackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.info())
    }
}

/// Captures the current stack and trims it down to the user's frames.
pub(crate) fn capture_user_frames() -> Vec<TracebackEntry> {
    let backtrace = backtrace::Backtrace::new();
    let mut entries = Vec::new();
    let mut in_user_code = false;
    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            let function = match symbol.name() {
                Some(name) => clean_symbol(&name.to_string()),
                None => continue,
            };
            let (file, line) = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => (file.display().to_string(), line),
                _ => continue,
            };
            // Toolchain sources only ever add noise.
            if file.starts_with("/rustc/") {
                continue;
            }
            if !in_user_code {
                if is_internal_frame(&function) {
                    continue;
                }
                in_user_code = true;
            } else if is_boundary_frame(&function) {
                return entries;
            }
            entries.push(TracebackEntry::new(file, line, function));
        }
    }
    entries
}

/// Captures the current stack and guarantees the first entry names the given
/// call site, prepending one when symbol resolution came up short.
pub(crate) fn capture_at(location: &Location<'_>) -> Vec<TracebackEntry> {
    let mut entries = capture_user_frames();
    let matches_call_site = entries
        .first()
        .is_some_and(|entry| entry.line == location.line() && entry.file.ends_with(location.file()));
    if !matches_call_site {
        let function = entries
            .first()
            .map(|entry| entry.function.clone())
            .unwrap_or_else(|| "<unresolved>".to_string());
        entries.insert(
            0,
            TracebackEntry::new(location.file().to_string(), location.line(), function),
        );
    }
    entries
}

/// Frames skipped at the innermost end: assertion and capture machinery,
/// panic plumbing, and the backtrace crate itself.
fn is_internal_frame(function: &str) -> bool {
    const INTERNAL_PREFIXES: &[&str] = &[
        "attest_core::",
        "attest_cli::",
        "backtrace::",
        "std::panic",
        "core::panic",
        "std::backtrace",
        "std::rt",
        "std::sys",
        "rust_begin_unwind",
        "rust_panic",
        "__rust_",
    ];
    INTERNAL_PREFIXES
        .iter()
        .any(|prefix| function.starts_with(prefix))
}

/// Frames that mark the transition back into the runner; everything from
/// here outward is dropped.
fn is_boundary_frame(function: &str) -> bool {
    const BOUNDARY_PREFIXES: &[&str] = &[
        "attest_core::case",
        "attest_core::suite",
        "attest_core::context",
        "attest_core::registry",
        "std::panic",
        "core::panic",
        "std::rt",
        "std::sys",
        "std::thread",
        "test::",
        "rust_begin_unwind",
        "__rust_",
    ];
    BOUNDARY_PREFIXES
        .iter()
        .any(|prefix| function.starts_with(prefix))
}

/// Strips the trailing `::h0123456789abcdef` hash from a demangled symbol.
fn clean_symbol(raw: &str) -> String {
    if let Some(pos) = raw.rfind("::h") {
        let hash = &raw[pos + 3..];
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return raw[..pos].to_string();
        }
    }
    raw.to_string()
}

fn read_source_line(file: &str, line: u32) -> Option<String> {
    let index = line.checked_sub(1)? as usize;
    let content = fs::read_to_string(file).ok()?;
    let text = content.lines().nth(index)?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_symbol_strips_hash_suffixes() {
        assert_eq!(
            clean_symbol("my_crate::module::run::h0123456789abcdef"),
            "my_crate::module::run"
        );
        assert_eq!(clean_symbol("my_crate::module::run"), "my_crate::module::run");
        // A segment that merely starts with `h` is not a hash.
        assert_eq!(clean_symbol("my_crate::hash"), "my_crate::hash");
    }

    #[test]
    fn internal_frames_cover_capture_machinery() {
        assert!(is_internal_frame("attest_core::assertions::fail"));
        assert!(is_internal_frame("std::panicking::begin_panic"));
        assert!(is_internal_frame("backtrace::capture::Backtrace::new"));
        assert!(!is_internal_frame("my_tests::test_addition"));
        assert!(!is_internal_frame("core::ops::function::FnOnce::call_once"));
    }

    #[test]
    fn boundary_frames_cover_the_runner() {
        assert!(is_boundary_frame("attest_core::case::TestCase::run"));
        assert!(is_boundary_frame("attest_core::suite::TestSuite::run"));
        assert!(is_boundary_frame("std::panicking::try"));
        assert!(!is_boundary_frame("my_tests::helper"));
    }

    #[test]
    fn capture_at_pins_the_call_site_as_first_entry() {
        let location = Location::caller();
        let entries = capture_at(location);
        let first = entries.first().unwrap();
        assert!(first.file.ends_with("traceback.rs"), "file: {}", first.file);
        assert_eq!(first.line, location.line());
    }

    #[test]
    fn display_includes_source_only_when_present() {
        let with_source = TracebackEntry {
            file: "tests/math.rs".to_string(),
            line: 12,
            function: "math::check".to_string(),
            source: Some("ctx.assert_equal(&4, &total)?;".to_string()),
        };
        assert_eq!(
            with_source.to_string(),
            "tests/math.rs:12: math::check(): ctx.assert_equal(&4, &total)?;"
        );
        assert_eq!(
            with_source.info(),
            "math::check(): ctx.assert_equal(&4, &total)?;"
        );

        let without_source = TracebackEntry {
            source: None,
            ..with_source
        };
        assert_eq!(
            without_source.to_string(),
            "tests/math.rs:12: math::check()"
        );
        assert_eq!(without_source.info(), "math::check()");
    }
}
