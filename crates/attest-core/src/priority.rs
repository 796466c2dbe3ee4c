//! Priority-based test selection.
//!
//! In priority mode each test runs with a probability derived from its
//! priority. A test that did not pass on the previous run always runs again,
//! whatever its priority says. Outcomes are remembered as marker files under
//! a per-suite result directory so the next run can consult them.

use std::fs;
use std::path::{Path, PathBuf};

use rand::RngExt;

use crate::case::TestMeta;

/// How eagerly a test is picked up in priority mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Always runs.
    Must,
    /// Runs with 90% probability.
    Important,
    /// Runs with 70% probability.
    High,
    /// Runs with 50% probability.
    #[default]
    Normal,
    /// Runs with 25% probability.
    Low,
    /// Never runs on its own; only a previous failure brings it back.
    Never,
}

impl Priority {
    /// Draws one sample: should a test of this priority run this time?
    pub fn sample(self) -> bool {
        let threshold = match self {
            Priority::Must => return true,
            Priority::Never => return false,
            Priority::Important => 0.1,
            Priority::High => 0.3,
            Priority::Normal => 0.5,
            Priority::Low => 0.75,
        };
        let mut rng = rand::rng();
        rng.random::<f64>() >= threshold
    }
}

/// Decides whether `test` should run, given the markers from previous runs.
pub(crate) fn need_to_run(result_dir: &Path, test: &TestMeta) -> bool {
    !previously_passed(result_dir, test) || test.priority.sample()
}

/// Remembers a pass by touching the test's marker file. Best effort: an
/// unwritable result directory silently disables the memory.
pub(crate) fn record_pass(result_dir: &Path, test: &TestMeta) {
    let marker = marker_path(result_dir, test);
    if let Some(parent) = marker.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = fs::write(&marker, b"");
}

/// Forgets a previous pass. Called when a test starts, so only a fresh
/// success leaves a marker behind.
pub(crate) fn clear_pass(result_dir: &Path, test: &TestMeta) {
    let _ = fs::remove_file(marker_path(result_dir, test));
}

fn previously_passed(result_dir: &Path, test: &TestMeta) -> bool {
    marker_path(result_dir, test).exists()
}

fn marker_path(result_dir: &Path, test: &TestMeta) -> PathBuf {
    result_dir
        .join(escape_component(&test.case.name))
        .join(escape_component(&test.name))
        .join("passed")
}

/// Maps a test or case name onto a safe directory name.
fn escape_component(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Picks the directory where pass markers live when no explicit one is
/// configured: a local `.test-result` directory if present, otherwise a
/// per-user cache location.
pub fn default_result_dir() -> PathBuf {
    let local = PathBuf::from(".test-result");
    if local.is_dir() {
        return local;
    }
    if let Some(cache) = dirs::cache_dir() {
        return cache.join("attest").join("test-result");
    }
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    std::env::temp_dir().join(format!("attest-test-result-{user}"))
}
