//! Registering tests and assembling them into a runnable suite.
//!
//! Tests are declared explicitly through [`SuiteBuilder`]: name a case, add
//! hooks and tests, then build. Name filters narrow the build down to a
//! subset; a case whose tests are all filtered away disappears entirely.

use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::case::{CaseMeta, Test, TestCase, TestContext, TestFn, TestMeta};
use crate::metadata::Metadata;
use crate::priority::Priority;
use crate::signal::Check;
use crate::suite::TestSuite;

/// A `/regex/` name filter that does not compile.
#[derive(Debug, Error)]
#[error("invalid name pattern /{pattern}/: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Collects test cases before they become a [`TestSuite`].
#[derive(Default)]
pub struct SuiteBuilder {
    cases: Vec<CaseBuilder>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new case; calls on the returned builder fill it in.
    pub fn case(&mut self, name: impl Into<String>) -> &mut CaseBuilder {
        self.cases.push(CaseBuilder::new(name.into()));
        let index = self.cases.len() - 1;
        &mut self.cases[index]
    }

    pub fn build(self) -> TestSuite {
        self.build_filtered(&SuiteFilter::default())
    }

    /// Builds only what the filter accepts.
    pub fn build_filtered(self, filter: &SuiteFilter) -> TestSuite {
        let cases = self
            .cases
            .into_iter()
            .filter_map(|case| case.build(filter))
            .collect();
        TestSuite::new(cases)
    }
}

/// One case under construction: an optional description, shared hooks, and
/// the tests themselves.
pub struct CaseBuilder {
    name: String,
    description: Option<String>,
    set_up: Option<TestFn>,
    tear_down: Option<TestFn>,
    tests: Vec<TestDef>,
}

impl CaseBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            description: None,
            set_up: None,
            tear_down: None,
            tests: Vec::new(),
        }
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = first_line(&description.into());
        self
    }

    /// Hook run before each test of the case.
    pub fn set_up(
        &mut self,
        hook: impl Fn(&mut TestContext<'_>) -> Check + Send + Sync + 'static,
    ) -> &mut Self {
        self.set_up = Some(Arc::new(hook));
        self
    }

    /// Hook run after each test of the case, whatever its outcome.
    pub fn tear_down(
        &mut self,
        hook: impl Fn(&mut TestContext<'_>) -> Check + Send + Sync + 'static,
    ) -> &mut Self {
        self.tear_down = Some(Arc::new(hook));
        self
    }

    /// Registers a test; the returned definition takes annotations.
    pub fn test(
        &mut self,
        name: impl Into<String>,
        body: impl Fn(&mut TestContext<'_>) -> Check + Send + Sync + 'static,
    ) -> &mut TestDef {
        self.tests.push(TestDef::new(name.into(), Arc::new(body)));
        let index = self.tests.len() - 1;
        &mut self.tests[index]
    }

    /// Registers one test per datum, sharing a single body. Each expansion
    /// is named `name (label)` and carries its label as `data` metadata.
    pub fn data_test<T, L, F>(
        &mut self,
        name: impl Into<String>,
        data: Vec<(L, T)>,
        body: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        L: Into<String>,
        F: Fn(&mut TestContext<'_>, &T) -> Check + Send + Sync + 'static,
    {
        let name = name.into();
        let body = Arc::new(body);
        for (label, datum) in data {
            let label = label.into();
            let body = Arc::clone(&body);
            self.test(format!("{name} ({label})"), move |ctx| body(ctx, &datum))
                .metadata("data", label);
        }
        self
    }

    fn build(self, filter: &SuiteFilter) -> Option<TestCase> {
        if !filter.accepts_case(&self.name) {
            return None;
        }
        let meta = Arc::new(CaseMeta {
            name: self.name,
            description: self.description,
        });
        let tests: Vec<Test> = self
            .tests
            .into_iter()
            .filter(|test| filter.accepts_test(&test.name))
            .map(|test| test.build(&meta))
            .collect();
        if tests.is_empty() {
            return None;
        }
        Some(TestCase::new(meta, self.set_up, self.tear_down, tests))
    }
}

/// A registered test waiting to be built, with its annotations.
pub struct TestDef {
    name: String,
    description: Option<String>,
    priority: Priority,
    metadata: Metadata,
    body: TestFn,
}

impl TestDef {
    fn new(name: String, body: TestFn) -> Self {
        Self {
            name,
            description: None,
            priority: Priority::default(),
            metadata: Metadata::new(),
            body,
        }
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = first_line(&description.into());
        self
    }

    pub fn priority(&mut self, priority: Priority) -> &mut Self {
        self.priority = priority;
        self
    }

    /// Links the test to a bug tracker entry. Repeated calls accumulate.
    pub fn bug(&mut self, id: impl Into<String>) -> &mut Self {
        self.metadata.append("bug", id);
        self
    }

    /// Sets one metadata entry, replacing a previous value for the key.
    pub fn metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.set(key, value);
        self
    }

    fn build(self, case: &Arc<CaseMeta>) -> Test {
        Test {
            meta: Arc::new(TestMeta {
                case: Arc::clone(case),
                name: self.name,
                description: self.description,
                metadata: self.metadata,
                priority: self.priority,
            }),
            body: self.body,
        }
    }
}

/// Descriptions show up as single lines in reports, so only the first
/// non-empty line of what was registered is kept.
fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Matches names either exactly or, written `/like this/`, by regex search.
#[derive(Debug)]
enum NameMatcher {
    Exact(String),
    Pattern(Regex),
}

impl NameMatcher {
    fn parse(selector: &str) -> Result<Self, PatternError> {
        if let Some(inner) = selector
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            match Regex::new(inner) {
                Ok(re) => Ok(NameMatcher::Pattern(re)),
                Err(source) => Err(PatternError {
                    pattern: inner.to_string(),
                    source,
                }),
            }
        } else {
            Ok(NameMatcher::Exact(selector.to_string()))
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Exact(expected) => name == expected,
            NameMatcher::Pattern(re) => re.is_match(name),
        }
    }
}

/// Selection of tests by name and cases by name. Empty lists accept
/// everything.
#[derive(Debug, Default)]
pub struct SuiteFilter {
    test_names: Vec<NameMatcher>,
    case_names: Vec<NameMatcher>,
}

impl SuiteFilter {
    pub fn new(test_names: &[String], case_names: &[String]) -> Result<Self, PatternError> {
        Ok(Self {
            test_names: parse_matchers(test_names)?,
            case_names: parse_matchers(case_names)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.test_names.is_empty() && self.case_names.is_empty()
    }

    pub(crate) fn accepts_case(&self, name: &str) -> bool {
        self.case_names.is_empty() || self.case_names.iter().any(|m| m.matches(name))
    }

    pub(crate) fn accepts_test(&self, name: &str) -> bool {
        self.test_names.is_empty() || self.test_names.iter().any(|m| m.matches(name))
    }
}

fn parse_matchers(selectors: &[String]) -> Result<Vec<NameMatcher>, PatternError> {
    selectors.iter().map(|s| NameMatcher::parse(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use crate::result::ResultKind;
    use pretty_assertions::assert_eq;

    fn filter(test_names: &[&str], case_names: &[&str]) -> SuiteFilter {
        let test_names: Vec<String> = test_names.iter().map(|s| s.to_string()).collect();
        let case_names: Vec<String> = case_names.iter().map(|s| s.to_string()).collect();
        SuiteFilter::new(&test_names, &case_names).unwrap()
    }

    #[test]
    fn builder_produces_a_runnable_suite() {
        let mut builder = SuiteBuilder::new();
        {
            let case = builder.case("MathCase");
            case.description("basic arithmetic");
            case.test("addition", |ctx| ctx.assert_equal(&4, &(2 + 2)));
            case.test("subtraction", |ctx| ctx.assert_equal(&0, &(2 - 2)));
        }

        let suite = builder.build();
        assert_eq!(suite.n_tests(), 2);

        let mut ctx = RunContext::new();
        suite.run(&mut ctx);
        assert_eq!(ctx.n_tests(), 2);
        assert_eq!(ctx.n_assertions(), 2);
        assert!(ctx.succeeded());
    }

    #[test]
    fn annotations_land_on_the_test_meta() {
        let mut builder = SuiteBuilder::new();
        builder
            .case("AnnotatedCase")
            .test("documented", |ctx| ctx.fail("always"))
            .description("shows annotations")
            .priority(Priority::Low)
            .bug("123")
            .bug("456")
            .metadata("owner", "core-team");

        let suite = builder.build();
        let mut ctx = RunContext::new();
        suite.run(&mut ctx);

        let result = &ctx.results()[0];
        assert_eq!(result.test.full_name(), "AnnotatedCase.documented");
        assert_eq!(result.test.description.as_deref(), Some("shows annotations"));
        assert_eq!(result.test.priority, Priority::Low);
        assert_eq!(
            result.test.metadata.get("bug").map(|v| v.values()),
            Some(vec!["123", "456"])
        );
        assert_eq!(
            result.test.metadata.get("owner").map(|v| v.to_string()),
            Some("core-team".to_string())
        );
    }

    #[test]
    fn descriptions_keep_only_their_first_non_empty_line() {
        let mut builder = SuiteBuilder::new();
        builder
            .case("DocumentedCase")
            .test("wrapped", |ctx| ctx.assert_true(true))
            .description("\n  checks the rounding mode\nand nothing else");

        let suite = builder.build();
        let mut ctx = RunContext::new();
        suite.run(&mut ctx);

        assert_eq!(
            ctx.results()[0].test.description.as_deref(),
            Some("checks the rounding mode")
        );
    }

    #[test]
    fn data_tests_expand_one_test_per_datum() {
        let mut builder = SuiteBuilder::new();
        builder.case("SquareCase").data_test(
            "squares",
            vec![("two", (2, 4)), ("three", (3, 9))],
            |ctx, (input, expected)| {
                let squared = input * input;
                ctx.assert_equal(expected, &squared)
            },
        );

        let suite = builder.build();
        assert_eq!(suite.n_tests(), 2);

        let mut ctx = RunContext::new();
        suite.run(&mut ctx);
        assert!(ctx.succeeded());

        let names: Vec<String> = ctx
            .results()
            .iter()
            .map(|result| result.test.name.clone())
            .collect();
        assert_eq!(names, vec!["squares (two)", "squares (three)"]);
        assert_eq!(
            ctx.results()[0].test.metadata.get("data").map(|v| v.to_string()),
            Some("two".to_string())
        );
    }

    #[test]
    fn exact_test_filter_selects_by_name() {
        let mut builder = SuiteBuilder::new();
        {
            let case = builder.case("FilterCase");
            case.test("wanted", |_ctx| Ok(()));
            case.test("unwanted", |_ctx| Ok(()));
        }
        let suite = builder.build_filtered(&filter(&["wanted"], &[]));
        assert_eq!(suite.n_tests(), 1);
    }

    #[test]
    fn pattern_filters_use_regex_search() {
        let mut builder = SuiteBuilder::new();
        {
            let case = builder.case("FilterCase");
            case.test("parses integers", |_ctx| Ok(()));
            case.test("parses floats", |_ctx| Ok(()));
            case.test("renders output", |_ctx| Ok(()));
        }
        let suite = builder.build_filtered(&filter(&["/parses/"], &[]));
        assert_eq!(suite.n_tests(), 2);
    }

    #[test]
    fn case_filter_drops_whole_cases() {
        let mut builder = SuiteBuilder::new();
        builder.case("KeptCase").test("one", |_ctx| Ok(()));
        builder.case("DroppedCase").test("two", |_ctx| Ok(()));

        let suite = builder.build_filtered(&filter(&[], &["KeptCase"]));
        assert_eq!(suite.cases().len(), 1);
        assert_eq!(suite.cases()[0].name(), "KeptCase");
    }

    #[test]
    fn cases_left_without_tests_disappear() {
        let mut builder = SuiteBuilder::new();
        builder.case("OnlyUnwanted").test("skipped", |_ctx| Ok(()));
        builder.case("HasMatch").test("wanted", |_ctx| Ok(()));

        let suite = builder.build_filtered(&filter(&["wanted"], &[]));
        assert_eq!(suite.cases().len(), 1);
        assert_eq!(suite.cases()[0].name(), "HasMatch");
    }

    #[test]
    fn invalid_patterns_are_rejected_up_front() {
        let error = SuiteFilter::new(&["/(/".to_string()], &[]).unwrap_err();
        assert_eq!(error.pattern, "(");
        assert!(error.to_string().starts_with("invalid name pattern /(/"));
    }

    #[test]
    fn failing_data_test_records_its_label() {
        let mut builder = SuiteBuilder::new();
        builder.case("SquareCase").data_test(
            "squares",
            vec![("broken", (2, 5))],
            |ctx, (input, expected)| {
                let squared = input * input;
                ctx.assert_equal(expected, &squared)
            },
        );

        let suite = builder.build();
        let mut ctx = RunContext::new();
        suite.run(&mut ctx);

        assert_eq!(ctx.n_failures(), 1);
        let result = &ctx.results()[0];
        assert!(matches!(result.kind, ResultKind::Failure { .. }));
        assert_eq!(result.test.name, "squares (broken)");
        assert_eq!(
            result.test.metadata.get("data").map(|v| v.to_string()),
            Some("broken".to_string())
        );
    }
}
