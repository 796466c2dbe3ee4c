//! Value rendering for assertion messages.
//!
//! Values are shown through their `Debug` form. The expanded (`{:#?}`)
//! rendering feeds the unified diff that failure messages append when both
//! sides span multiple lines.

use std::fmt::Debug;

use imara_diff::intern::InternedInput;
use imara_diff::{diff, Algorithm, UnifiedDiffBuilder};

const FOLD_WIDTH: usize = 78;

/// Renders a value the way assertion messages quote it.
pub fn format<T: Debug + ?Sized>(value: &T) -> String {
    format!("{value:?}")
}

/// Renders a value in expanded form, one field per line for structured types.
pub fn format_expanded<T: Debug + ?Sized>(value: &T) -> String {
    format!("{value:#?}")
}

/// Produces a unified diff between two renderings, without file headers.
pub fn unified_diff(expected: &str, actual: &str) -> String {
    let input = InternedInput::new(expected, actual);
    let unified = diff(
        Algorithm::Histogram,
        &input,
        UnifiedDiffBuilder::new(&input),
    );
    unified.trim_end_matches('\n').to_string()
}

/// Appends a diff section to `message` when both renderings are multi-line.
///
/// A folded variant follows whenever the diff contains a changed line too
/// wide to read unwrapped.
pub(crate) fn append_diff(mut message: String, expected: &str, actual: &str) -> String {
    if !(expected.contains('\n') && actual.contains('\n')) {
        return message;
    }
    let diff = unified_diff(expected, actual);
    if diff.is_empty() {
        return message;
    }
    message.push_str("\n\ndiff:\n");
    message.push_str(&diff);
    if need_fold(&diff) {
        message.push_str("\n\nfolded diff:\n");
        message.push_str(&fold(&diff));
    }
    message
}

/// A changed line wider than the fold width (plus its marker) is unreadable;
/// that is the cue to add the folded rendition.
pub fn need_fold(diff: &str) -> bool {
    diff.lines()
        .filter(|line| line.starts_with('+') || line.starts_with('-'))
        .any(|line| line.chars().count() > FOLD_WIDTH + 1)
}

/// Rewraps every diff line at the fold width.
pub fn fold(diff: &str) -> String {
    let mut folded = Vec::new();
    for line in diff.lines() {
        if line.is_empty() {
            folded.push(String::new());
            continue;
        }
        let mut chunk = String::new();
        let mut width = 0;
        for c in line.chars() {
            if width == FOLD_WIDTH {
                folded.push(std::mem::take(&mut chunk));
                width = 0;
            }
            chunk.push(c);
            width += 1;
        }
        if !chunk.is_empty() {
            folded.push(chunk);
        }
    }
    folded.join("\n")
}
