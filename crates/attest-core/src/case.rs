//! Test cases and single-test execution.
//!
//! A [`TestCase`] groups tests that share setup and teardown hooks. Running a
//! test walks a fixed sequence: setup, body, teardown, then exactly one
//! terminal result. Teardown runs no matter how setup and body fared, and a
//! fault raised there never displaces one already produced earlier.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::context::RunContext;
use crate::metadata::Metadata;
use crate::priority::{self, Priority};
use crate::result::ResultKind;
use crate::signal::{signal_from_panic, Check, PanicGuard, Signal};
use crate::traceback::TracebackEntry;

/// Identity of a test case, shared by all of its tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseMeta {
    pub name: String,
    pub description: Option<String>,
}

/// Identity and annotations of a single test.
#[derive(Debug, Clone)]
pub struct TestMeta {
    pub case: Arc<CaseMeta>,
    pub name: String,
    pub description: Option<String>,
    pub metadata: Metadata,
    pub priority: Priority,
}

impl TestMeta {
    /// The case-qualified name, `Case.test`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.case.name, self.name)
    }
}

/// Hooks and test bodies all share one shape: a fallible function over the
/// test's context.
pub(crate) type TestFn = Arc<dyn Fn(&mut TestContext<'_>) -> Check + Send + Sync>;

pub(crate) struct Test {
    pub(crate) meta: Arc<TestMeta>,
    pub(crate) body: TestFn,
}

/// A test's window onto the run: assertions, explicit signals, and read-only
/// access to its own identity all go through here.
pub struct TestContext<'a> {
    pub(crate) run: &'a mut RunContext,
    pub(crate) meta: &'a Arc<TestMeta>,
}

impl TestContext<'_> {
    /// The test currently running.
    pub fn test(&self) -> &TestMeta {
        self.meta
    }

    /// The run this test belongs to.
    pub fn run(&self) -> &RunContext {
        self.run
    }

    pub(crate) fn passed(&mut self) {
        self.run.pass_assertion(self.meta);
    }

    pub(crate) fn record_notification(&mut self, message: String, traceback: Vec<TracebackEntry>) {
        self.run.record(
            Arc::clone(self.meta),
            ResultKind::Notification { message },
            traceback,
        );
    }
}

/// Result kind recorded when a hook raises an assertion failure: the hook is
/// infrastructure, so its failed assertion counts as an error.
const HOOK_ASSERTION_ERROR: &str = "assertion failure";

/// A named group of tests with shared hooks.
pub struct TestCase {
    meta: Arc<CaseMeta>,
    set_up: Option<TestFn>,
    tear_down: Option<TestFn>,
    tests: Vec<Test>,
}

impl TestCase {
    pub(crate) fn new(
        meta: Arc<CaseMeta>,
        set_up: Option<TestFn>,
        tear_down: Option<TestFn>,
        tests: Vec<Test>,
    ) -> Self {
        Self {
            meta,
            set_up,
            tear_down,
            tests,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn n_tests(&self) -> usize {
        self.tests.len()
    }

    pub(crate) fn run(&self, ctx: &mut RunContext) {
        // Priority selection happens before the case starts; a case whose
        // tests are all skipped announces nothing.
        let tests: Vec<&Test> = match ctx.priority_dir() {
            Some(dir) => self
                .tests
                .iter()
                .filter(|test| priority::need_to_run(dir, &test.meta))
                .collect(),
            None => self.tests.iter().collect(),
        };
        if tests.is_empty() {
            return;
        }
        ctx.start_case(&self.meta);
        for test in tests {
            self.run_test(test, ctx);
            if ctx.interrupted() {
                break;
            }
        }
        ctx.finish_case(&self.meta);
    }

    fn run_test(&self, test: &Test, ctx: &mut RunContext) {
        ctx.start_test(&test.meta);
        if let Some(dir) = ctx.priority_dir() {
            priority::clear_pass(dir, &test.meta);
        }

        let mut terminal: Option<(ResultKind, Vec<TracebackEntry>)> = None;
        let mut interrupted = false;

        if let Some(set_up) = &self.set_up {
            if let Err(signal) = invoke(set_up, ctx, &test.meta) {
                match signal {
                    Signal::Interrupted => interrupted = true,
                    other => terminal = Some(hook_outcome(other)),
                }
            }
        }

        // The body only runs when setup went through cleanly.
        if terminal.is_none() && !interrupted {
            if let Err(signal) = invoke(&test.body, ctx, &test.meta) {
                match signal {
                    Signal::Interrupted => interrupted = true,
                    other => terminal = Some(body_outcome(other)),
                }
            }
        }

        // Teardown always runs, but only an unblemished test takes a result
        // from it.
        if let Some(tear_down) = &self.tear_down {
            if let Err(signal) = invoke(tear_down, ctx, &test.meta) {
                match signal {
                    Signal::Interrupted => interrupted = true,
                    other if terminal.is_none() && !interrupted => {
                        terminal = Some(hook_outcome(other))
                    }
                    _ => {}
                }
            }
        }

        match terminal {
            Some((kind, traceback)) => {
                ctx.record(Arc::clone(&test.meta), kind, traceback);
            }
            None if !interrupted => {
                if let Some(dir) = ctx.priority_dir() {
                    priority::record_pass(dir, &test.meta);
                }
                ctx.record(Arc::clone(&test.meta), ResultKind::Success, Vec::new());
            }
            // An interrupted test records nothing.
            None => {}
        }
        if interrupted {
            ctx.interrupt();
        }
        ctx.finish_test(&test.meta);
    }
}

/// Maps a body signal onto its result kind: the direct correspondence.
fn body_outcome(signal: Signal) -> (ResultKind, Vec<TracebackEntry>) {
    match signal {
        Signal::Failure(failure) => (
            ResultKind::Failure {
                message: failure.message,
                expected: failure.expected,
                actual: failure.actual,
            },
            failure.traceback,
        ),
        Signal::Pending(detail) => (
            ResultKind::Pending {
                message: detail.message,
            },
            detail.traceback,
        ),
        Signal::Omission(detail) => (
            ResultKind::Omission {
                message: detail.message,
            },
            detail.traceback,
        ),
        Signal::Error(error) => (
            ResultKind::Error {
                type_name: error.type_name,
                message: error.message,
            },
            error.traceback,
        ),
        Signal::Interrupted => unreachable!("interrupts are handled before mapping"),
    }
}

/// Maps a hook signal onto its result kind. Pending and omission keep their
/// meaning; a failed assertion in a hook is an error, not a test failure.
fn hook_outcome(signal: Signal) -> (ResultKind, Vec<TracebackEntry>) {
    match signal {
        Signal::Failure(failure) => (
            ResultKind::Error {
                type_name: HOOK_ASSERTION_ERROR.to_string(),
                message: failure.message,
            },
            failure.traceback,
        ),
        other => body_outcome(other),
    }
}

/// Runs one hook or body with panic capture in place.
fn invoke(f: &TestFn, ctx: &mut RunContext, meta: &Arc<TestMeta>) -> Check {
    let guard = PanicGuard::install();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut test_ctx = TestContext { run: ctx, meta };
        f(&mut test_ctx)
    }));
    drop(guard);
    match outcome {
        Ok(check) => check,
        Err(payload) => Err(signal_from_panic(payload)),
    }
}
