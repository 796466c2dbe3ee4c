//! Shared state for one run of a suite.
//!
//! The [`RunContext`] owns the counters, the recorded results, and the
//! registered listeners. Execution code reports everything that happens
//! through it; listeners observe the run synchronously, on the thread that
//! runs the tests, in event order.

use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::case::{CaseMeta, TestMeta};
use crate::result::{ResultKind, TestResult};
use crate::traceback::TracebackEntry;

/// Observer of run progress. Every method has a no-op default, so an
/// implementation only overrides the events it cares about.
pub trait Listener {
    fn on_start_test_suite(&mut self, _ctx: &RunContext) {}
    fn on_finish_test_suite(&mut self, _ctx: &RunContext) {}
    fn on_start_test_case(&mut self, _ctx: &RunContext, _case: &CaseMeta) {}
    fn on_finish_test_case(&mut self, _ctx: &RunContext, _case: &CaseMeta) {}
    fn on_start_test(&mut self, _ctx: &RunContext, _test: &TestMeta) {}
    fn on_finish_test(&mut self, _ctx: &RunContext, _test: &TestMeta) {}
    fn on_pass_assertion(&mut self, _ctx: &RunContext, _test: &TestMeta) {}
    fn on_success(&mut self, _ctx: &RunContext, _result: &TestResult) {}
    fn on_notification(&mut self, _ctx: &RunContext, _result: &TestResult) {}
    fn on_omission(&mut self, _ctx: &RunContext, _result: &TestResult) {}
    fn on_pending(&mut self, _ctx: &RunContext, _result: &TestResult) {}
    fn on_failure(&mut self, _ctx: &RunContext, _result: &TestResult) {}
    fn on_error(&mut self, _ctx: &RunContext, _result: &TestResult) {}
}

/// State carried across a whole run: counters, results, listeners, and the
/// priority-mode setting.
#[derive(Default)]
pub struct RunContext {
    listeners: Vec<Box<dyn Listener>>,
    results: Vec<TestResult>,
    n_tests: usize,
    n_assertions: usize,
    interrupted: bool,
    priority_dir: Option<PathBuf>,
    elapsed: Duration,
    test_started: Option<Instant>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<L: Listener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    /// Turns priority mode on, remembering pass markers under `result_dir`.
    pub fn enable_priority(&mut self, result_dir: PathBuf) {
        self.priority_dir = Some(result_dir);
    }

    pub fn priority_dir(&self) -> Option<&Path> {
        self.priority_dir.as_deref()
    }

    /// Number of tests started so far.
    pub fn n_tests(&self) -> usize {
        self.n_tests
    }

    /// Number of assertions that passed so far.
    pub fn n_assertions(&self) -> usize {
        self.n_assertions
    }

    pub fn n_failures(&self) -> usize {
        self.count(|kind| matches!(kind, ResultKind::Failure { .. }))
    }

    pub fn n_errors(&self) -> usize {
        self.count(|kind| matches!(kind, ResultKind::Error { .. }))
    }

    pub fn n_pendings(&self) -> usize {
        self.count(|kind| matches!(kind, ResultKind::Pending { .. }))
    }

    pub fn n_omissions(&self) -> usize {
        self.count(|kind| matches!(kind, ResultKind::Omission { .. }))
    }

    pub fn n_notifications(&self) -> usize {
        self.count(|kind| matches!(kind, ResultKind::Notification { .. }))
    }

    /// Every recorded result, successes and notifications included, in the
    /// order events happened.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Results worth listing after the run: everything but plain successes.
    pub fn faults(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|result| result.kind.is_fault())
    }

    /// The most severe fault recorded, ties going to the earliest.
    pub fn worst_fault(&self) -> Option<&TestResult> {
        let mut worst: Option<&TestResult> = None;
        for result in &self.results {
            let Some(severity) = result.kind.severity() else {
                continue;
            };
            match worst {
                Some(current) if current.kind.severity() >= Some(severity) => {}
                _ => worst = Some(result),
            }
        }
        worst
    }

    /// A run succeeds when nothing critical was recorded. Notifications,
    /// omissions, and pendings do not count against it.
    pub fn succeeded(&self) -> bool {
        !self.results.iter().any(|result| result.kind.is_critical())
    }

    /// Stops the run: no further test starts after the current one finishes.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Total time spent inside tests.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// One-line tally of the whole run.
    pub fn summary(&self) -> String {
        format!(
            "{} test(s), {} assertion(s), {} failure(s), {} error(s), {} pending(s), {} omission(s), {} notification(s)",
            self.n_tests,
            self.n_assertions,
            self.n_failures(),
            self.n_errors(),
            self.n_pendings(),
            self.n_omissions(),
            self.n_notifications(),
        )
    }

    fn count(&self, pred: impl Fn(&ResultKind) -> bool) -> usize {
        self.results.iter().filter(|result| pred(&result.kind)).count()
    }

    pub(crate) fn start_suite(&mut self) {
        self.emit(|listener, ctx| listener.on_start_test_suite(ctx));
    }

    pub(crate) fn finish_suite(&mut self) {
        self.emit(|listener, ctx| listener.on_finish_test_suite(ctx));
    }

    pub(crate) fn start_case(&mut self, case: &CaseMeta) {
        self.emit(|listener, ctx| listener.on_start_test_case(ctx, case));
    }

    pub(crate) fn finish_case(&mut self, case: &CaseMeta) {
        self.emit(|listener, ctx| listener.on_finish_test_case(ctx, case));
    }

    pub(crate) fn start_test(&mut self, test: &TestMeta) {
        self.n_tests += 1;
        self.test_started = Some(Instant::now());
        self.emit(|listener, ctx| listener.on_start_test(ctx, test));
    }

    pub(crate) fn finish_test(&mut self, test: &TestMeta) {
        let elapsed = self.test_elapsed();
        self.elapsed += elapsed;
        self.test_started = None;
        self.emit(|listener, ctx| listener.on_finish_test(ctx, test));
    }

    pub(crate) fn pass_assertion(&mut self, test: &TestMeta) {
        self.n_assertions += 1;
        self.emit(|listener, ctx| listener.on_pass_assertion(ctx, test));
    }

    /// Records a result and notifies the matching listener event.
    pub(crate) fn record(
        &mut self,
        test: Arc<TestMeta>,
        kind: ResultKind,
        traceback: Vec<TracebackEntry>,
    ) {
        self.results.push(TestResult {
            test,
            kind,
            traceback,
            elapsed: self.test_elapsed(),
        });
        let mut listeners = mem::take(&mut self.listeners);
        if let Some(result) = self.results.last() {
            for listener in &mut listeners {
                match &result.kind {
                    ResultKind::Success => listener.on_success(self, result),
                    ResultKind::Notification { .. } => listener.on_notification(self, result),
                    ResultKind::Omission { .. } => listener.on_omission(self, result),
                    ResultKind::Pending { .. } => listener.on_pending(self, result),
                    ResultKind::Failure { .. } => listener.on_failure(self, result),
                    ResultKind::Error { .. } => listener.on_error(self, result),
                }
            }
        }
        self.listeners = listeners;
    }

    fn test_elapsed(&self) -> Duration {
        self.test_started
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    fn emit(&mut self, mut f: impl FnMut(&mut dyn Listener, &RunContext)) {
        let mut listeners = mem::take(&mut self.listeners);
        for listener in &mut listeners {
            f(listener.as_mut(), self);
        }
        self.listeners = listeners;
    }
}
