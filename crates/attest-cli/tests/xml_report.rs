//! The XML report: rendering and the file the driver writes after a run.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use attest_cli::{xml, Tester};
use attest_config::{ColorMode, RunnerConfig, Verbosity};
use attest_core::{
    CaseMeta, Metadata, Priority, ResultKind, RunContext, SuiteBuilder, SuiteFilter, TestMeta,
    TestResult, TracebackEntry,
};
use pretty_assertions::assert_eq;

fn meta(test_name: &str, metadata: Metadata) -> Arc<TestMeta> {
    Arc::new(TestMeta {
        case: Arc::new(CaseMeta {
            name: "MathCase".to_string(),
            description: Some("basic arithmetic".to_string()),
        }),
        name: test_name.to_string(),
        description: None,
        metadata,
        priority: Priority::Normal,
    })
}

fn quiet_config() -> RunnerConfig {
    RunnerConfig {
        verbosity: Some(Verbosity::Silent),
        color: Some(ColorMode::Never),
        ..RunnerConfig::new()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn a_rendered_run_follows_the_report_layout() {
    let mut annotations = Metadata::new();
    annotations.set("bug", "123");

    let success = TestResult {
        test: meta("addition", annotations),
        kind: ResultKind::Success,
        traceback: Vec::new(),
        elapsed: Duration::from_micros(1500),
    };
    let error = TestResult {
        test: meta("exploding io", Metadata::new()),
        kind: ResultKind::Error {
            type_name: "std::io::Error".to_string(),
            message: "permission denied".to_string(),
        },
        traceback: vec![TracebackEntry {
            file: "tests/math.rs".to_string(),
            line: 12,
            function: "math::check".to_string(),
            source: Some("ctx.assert_equal(&4, &total)?;".to_string()),
        }],
        elapsed: Duration::from_micros(250),
    };

    insta::assert_snapshot!(xml::render(&[success, error]), @r#"
    <report>
      <result>
        <test_case>
          <name>MathCase</name>
          <description>basic arithmetic</description>
        </test_case>
        <test>
          <name>addition</name>
          <description/>
          <option>
            <name>bug</name>
            <value>123</value>
          </option>
        </test>
        <status>success</status>
        <detail/>
        <elapsed>0.001500</elapsed>
      </result>
      <result>
        <test_case>
          <name>MathCase</name>
          <description>basic arithmetic</description>
        </test_case>
        <test>
          <name>exploding io</name>
          <description/>
        </test>
        <status>error</status>
        <detail>std::io::Error: permission denied</detail>
        <elapsed>0.000250</elapsed>
        <backtrace>
          <entry>
            <file>tests/math.rs</file>
            <line>12</line>
            <info>math::check(): ctx.assert_equal(&amp;4, &amp;total)?;</info>
          </entry>
        </backtrace>
      </result>
    </report>
    "#);
}

#[test]
fn notifications_appear_as_results_of_their_own() {
    let mut builder = SuiteBuilder::new();
    builder.case("NoisyCase").test("warns twice", |ctx| {
        ctx.notify("first");
        ctx.notify("second");
        ctx.assert_true(true)
    });
    let mut ctx = RunContext::new();
    builder.build().run(&mut ctx);

    let report = xml::render(ctx.results());
    assert_eq!(report.matches("<result>").count(), 3);
    assert_eq!(report.matches("<status>notification</status>").count(), 2);
    assert_eq!(report.matches("<status>success</status>").count(), 1);
}

// ---------------------------------------------------------------------------
// The driver's report file
// ---------------------------------------------------------------------------

#[test]
fn the_driver_mirrors_results_into_the_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("attest-report.xml");
    let mut builder = SuiteBuilder::new();
    {
        let case = builder.case("MathCase");
        case.test("addition", |ctx| ctx.assert_equal(&4, &(2 + 2)));
        case.test("broken sum", |ctx| ctx.assert_equal(&4, &5));
    }

    let config = RunnerConfig {
        xml_report: Some(report_path.clone()),
        ..quiet_config()
    };
    let tester = Tester::new(config, SuiteFilter::default());
    let succeeded = tester.run_with_output(builder, Vec::new()).unwrap();
    assert!(!succeeded);

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.starts_with("<report>\n"), "report: {report}");
    let success_at = report.find("<status>success</status>").unwrap();
    let failure_at = report.find("<status>failure</status>").unwrap();
    assert!(success_at < failure_at, "results are out of order: {report}");
    assert!(
        report.contains("<detail>expected: &lt;4&gt;\n but was: &lt;5&gt;</detail>"),
        "report: {report}"
    );
    assert!(report.ends_with("</report>\n"), "report: {report}");
}

#[test]
fn a_filtered_run_reports_only_what_ran() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("attest-report.xml");
    let mut builder = SuiteBuilder::new();
    {
        let case = builder.case("MathCase");
        case.test("wanted", |ctx| ctx.assert_true(true));
        case.test("unwanted", |ctx| ctx.fail("must not appear"));
    }

    let config = RunnerConfig {
        xml_report: Some(report_path.clone()),
        ..quiet_config()
    };
    let filter = SuiteFilter::new(&["wanted".to_string()], &[]).unwrap();
    let tester = Tester::new(config, filter);
    assert!(tester.run_with_output(builder, Vec::new()).unwrap());

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("<name>wanted</name>"), "report: {report}");
    assert!(!report.contains("unwanted"), "report: {report}");
}
