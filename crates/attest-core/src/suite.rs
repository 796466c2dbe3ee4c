//! A suite is an ordered collection of test cases run against one context.

use crate::case::TestCase;
use crate::context::RunContext;

pub struct TestSuite {
    cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Total number of tests across all cases.
    pub fn n_tests(&self) -> usize {
        self.cases.iter().map(TestCase::n_tests).sum()
    }

    /// Runs every case in order. An interrupt raised inside a test stops the
    /// run after that test; the suite still announces its finish.
    pub fn run(&self, ctx: &mut RunContext) {
        ctx.start_suite();
        for case in &self.cases {
            case.run(ctx);
            if ctx.interrupted() {
                break;
            }
        }
        ctx.finish_suite();
    }
}
