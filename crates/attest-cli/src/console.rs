//! Live console reporting.
//!
//! The reporter listens to a run and writes progress as it happens: one mark
//! per test in normal mode, one line per test in verbose mode, and nothing at
//! all in silent mode. After the run it lists every fault with its traceback
//! and closes with the timing line and the summary, tinted by the worst fault
//! recorded.

use std::io::Write;

use attest_core::{
    pretty, CaseMeta, Listener, ResultKind, RunContext, TestMeta, TestResult, TracebackEntry,
};
use attest_config::Verbosity;

use crate::color::Tone;

// Verbose mode pads test names out to this column with tabs.
const NAME_COLUMN: usize = 76;
const TAB_WIDTH: usize = 8;

/// A [`Listener`] that narrates the run to `out`.
///
/// Writes are fire-and-forget: a broken pipe silences the reporter rather
/// than failing the run.
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbosity: Verbosity,
    use_color: bool,
    pooled_notifications: usize,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbosity: Verbosity, use_color: bool) -> Self {
        Self {
            out,
            verbosity,
            use_color,
            pooled_notifications: 0,
        }
    }

    fn write(&mut self, text: &str, tone: Option<Tone>, level: Verbosity) {
        if self.verbosity < level {
            return;
        }
        match tone {
            Some(tone) if self.use_color => {
                let _ = write!(self.out, "{}", tone.paint(text));
            }
            _ => {
                let _ = write!(self.out, "{text}");
            }
        }
        let _ = self.out.flush();
    }

    fn write_line(&mut self, text: &str, tone: Option<Tone>, level: Verbosity) {
        self.write(text, tone, level);
        self.write("\n", None, level);
    }

    /// Writes the marks for notifications pooled since the test started.
    ///
    /// In verbose mode the first notification was shown as it happened; the
    /// rest flood out here, collapsed to a count once there are many.
    fn flood_notifications(&mut self) {
        if self.pooled_notifications > 1 {
            let n = self.pooled_notifications;
            let marks = if n > 3 {
                format!("{n}N")
            } else {
                "N".repeat(n - 1)
            };
            self.write(&marks, Some(Tone::Notification), Verbosity::Verbose);
        }
        self.pooled_notifications = 0;
    }

    fn on_fault(&mut self, result: &TestResult) {
        self.flood_notifications();
        self.write(
            result.kind.symbol(),
            Some(Tone::for_kind(&result.kind)),
            Verbosity::Normal,
        );
    }

    fn result_tone(&self, ctx: &RunContext) -> Tone {
        ctx.worst_fault()
            .map(|fault| Tone::for_kind(&fault.kind))
            .unwrap_or(Tone::Success)
    }

    fn print_faults(&mut self, ctx: &RunContext) {
        let faults: Vec<&TestResult> = ctx.faults().collect();
        if faults.is_empty() {
            return;
        }
        self.write_line("", None, Verbosity::Normal);
        let width = faults.len().to_string().len();
        for (index, fault) in faults.into_iter().enumerate() {
            let tone = Tone::for_kind(&fault.kind);
            self.write(&format!("{:>width$}) ", index + 1), None, Verbosity::Normal);
            self.write_line(&fault.title(), Some(tone), Verbosity::Normal);
            self.print_annotations(fault, tone);
            self.print_traceback(&fault.traceback);
            self.print_fault_message(fault);
            self.write_line("", None, Verbosity::Normal);
        }
    }

    fn print_annotations(&mut self, fault: &TestResult, tone: Tone) {
        if let Some(data) = fault.test.metadata.get("data") {
            self.write_line(&format!("  data: {data}"), None, Verbosity::Normal);
        }
        for (key, value) in fault.test.metadata.iter() {
            if key == "data" {
                continue;
            }
            self.write_line(&format!("  {key}: {value}"), Some(tone), Verbosity::Normal);
        }
    }

    fn print_traceback(&mut self, traceback: &[TracebackEntry]) {
        for entry in traceback {
            self.write(&entry.file, Some(Tone::FileName), Verbosity::Normal);
            self.write(":", None, Verbosity::Normal);
            self.write(&entry.line.to_string(), Some(Tone::LineNumber), Verbosity::Normal);
            self.write(": ", None, Verbosity::Normal);
            self.write(&entry.info(), None, Verbosity::Normal);
            self.write_line("", None, Verbosity::Normal);
        }
    }

    /// A failure that kept its expected/actual renderings gets them shown in
    /// contrasting tones, with the diff recomputed so it can follow suit one
    /// day. Everything else prints its detail as recorded.
    fn print_fault_message(&mut self, fault: &TestResult) {
        if let ResultKind::Failure {
            expected: Some(expected),
            actual: Some(actual),
            ..
        } = &fault.kind
        {
            let tone = Tone::for_kind(&fault.kind);
            self.write("expected: <", None, Verbosity::Normal);
            self.write(expected, Some(Tone::Success), Verbosity::Normal);
            self.write_line(">", None, Verbosity::Normal);
            self.write(" but was: <", None, Verbosity::Normal);
            self.write(actual, Some(tone), Verbosity::Normal);
            self.write_line(">", None, Verbosity::Normal);
            self.print_diff(expected, actual);
        } else {
            let detail = fault.detail();
            if !detail.is_empty() {
                self.write_line(&detail, None, Verbosity::Normal);
            }
        }
    }

    fn print_diff(&mut self, expected: &str, actual: &str) {
        if !(expected.contains('\n') && actual.contains('\n')) {
            return;
        }
        let diff = pretty::unified_diff(expected, actual);
        if diff.is_empty() {
            return;
        }
        self.write_line("", None, Verbosity::Normal);
        self.write_line("diff:", None, Verbosity::Normal);
        self.write_line(&diff, None, Verbosity::Normal);
        if pretty::need_fold(&diff) {
            self.write_line("", None, Verbosity::Normal);
            self.write_line("folded diff:", None, Verbosity::Normal);
            self.write_line(&pretty::fold(&diff), None, Verbosity::Normal);
        }
    }
}

impl<W: Write> Listener for ConsoleReporter<W> {
    fn on_start_test_case(&mut self, _ctx: &RunContext, case: &CaseMeta) {
        let title = match &case.description {
            Some(description) => format!("{}: {description}", case.name),
            None => format!("{}:", case.name),
        };
        self.write_line(&title, Some(Tone::CaseName), Verbosity::Verbose);
    }

    fn on_finish_test_case(&mut self, _ctx: &RunContext, _case: &CaseMeta) {
        self.write_line("", None, Verbosity::Verbose);
    }

    fn on_start_test(&mut self, _ctx: &RunContext, test: &TestMeta) {
        self.pooled_notifications = 0;
        if let Some(description) = &test.description {
            self.write_line(&format!(" {description}"), None, Verbosity::Verbose);
        }
        let tabs = NAME_COLUMN.saturating_sub(test.name.chars().count()) / TAB_WIDTH;
        let name_line = format!("  {}:{}", test.name, "\t".repeat(tabs));
        self.write(&name_line, None, Verbosity::Verbose);
    }

    fn on_finish_test(&mut self, _ctx: &RunContext, _test: &TestMeta) {
        self.flood_notifications();
        self.write_line("", None, Verbosity::Verbose);
    }

    fn on_success(&mut self, _ctx: &RunContext, result: &TestResult) {
        self.flood_notifications();
        self.write(result.kind.symbol(), Some(Tone::Success), Verbosity::Normal);
    }

    fn on_notification(&mut self, _ctx: &RunContext, result: &TestResult) {
        self.pooled_notifications += 1;
        // Verbose mode shows the first mark live and floods the rest at the
        // end of the test; the other modes show every mark as it happens.
        if self.verbosity != Verbosity::Verbose || self.pooled_notifications == 1 {
            self.write(
                result.kind.symbol(),
                Some(Tone::Notification),
                Verbosity::Normal,
            );
        }
    }

    fn on_omission(&mut self, _ctx: &RunContext, result: &TestResult) {
        self.on_fault(result);
    }

    fn on_pending(&mut self, _ctx: &RunContext, result: &TestResult) {
        self.on_fault(result);
    }

    fn on_failure(&mut self, _ctx: &RunContext, result: &TestResult) {
        self.on_fault(result);
    }

    fn on_error(&mut self, _ctx: &RunContext, result: &TestResult) {
        self.on_fault(result);
    }

    fn on_finish_test_suite(&mut self, ctx: &RunContext) {
        if self.verbosity == Verbosity::Normal {
            self.write_line("", None, Verbosity::Normal);
        }
        self.print_faults(ctx);
        self.write_line(
            &format!("Finished in {:.3} seconds", ctx.elapsed().as_secs_f64()),
            None,
            Verbosity::Normal,
        );
        self.write_line("", None, Verbosity::Normal);
        let tone = self.result_tone(ctx);
        self.write_line(&ctx.summary(), Some(tone), Verbosity::Normal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::{Metadata, Priority};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn reporter(verbosity: Verbosity) -> ConsoleReporter<Vec<u8>> {
        ConsoleReporter::new(Vec::new(), verbosity, false)
    }

    fn output(reporter: &ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.out.clone()).unwrap()
    }

    fn meta(case_description: Option<&str>, test_description: Option<&str>) -> Arc<TestMeta> {
        Arc::new(TestMeta {
            case: Arc::new(CaseMeta {
                name: "MathCase".to_string(),
                description: case_description.map(String::from),
            }),
            name: "addition".to_string(),
            description: test_description.map(String::from),
            metadata: Metadata::new(),
            priority: Priority::Normal,
        })
    }

    fn result(kind: ResultKind) -> TestResult {
        TestResult {
            test: meta(None, None),
            kind,
            traceback: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn normal_mode_prints_one_mark_per_event() {
        let mut console = reporter(Verbosity::Normal);
        let ctx = RunContext::new();

        console.on_start_test(&ctx, &meta(None, None));
        console.on_success(&ctx, &result(ResultKind::Success));
        console.on_finish_test(&ctx, &meta(None, None));
        console.on_start_test(&ctx, &meta(None, None));
        console.on_failure(
            &ctx,
            &result(ResultKind::Failure {
                message: "expected: <1>\n but was: <2>".to_string(),
                expected: Some("1".to_string()),
                actual: Some("2".to_string()),
            }),
        );
        console.on_finish_test(&ctx, &meta(None, None));

        assert_eq!(output(&console), ".F");
    }

    #[test]
    fn silent_mode_prints_nothing() {
        let mut console = reporter(Verbosity::Silent);
        let ctx = RunContext::new();

        console.on_start_test_case(&ctx, &meta(Some("sums"), None).case);
        console.on_start_test(&ctx, &meta(None, None));
        console.on_success(&ctx, &result(ResultKind::Success));
        console.on_finish_test(&ctx, &meta(None, None));
        console.on_finish_test_suite(&ctx);

        assert_eq!(output(&console), "");
    }

    #[test]
    fn verbose_mode_writes_case_and_test_lines() {
        let mut console = reporter(Verbosity::Verbose);
        let ctx = RunContext::new();
        let meta = meta(Some("basic arithmetic"), Some("adds small numbers"));

        console.on_start_test_case(&ctx, &meta.case);
        console.on_start_test(&ctx, &meta);
        console.on_success(&ctx, &result(ResultKind::Success));
        console.on_finish_test(&ctx, &meta);
        console.on_finish_test_case(&ctx, &meta.case);

        // "addition" is 8 characters, leaving (76 - 8) / 8 = 8 tab stops.
        let expected = format!(
            "MathCase: basic arithmetic\n adds small numbers\n  addition:{}.\n\n",
            "\t".repeat(8)
        );
        assert_eq!(output(&console), expected);
    }

    #[test]
    fn verbose_mode_floods_pooled_notifications() {
        let notification = result(ResultKind::Notification {
            message: "heads up".to_string(),
        });

        // Three pooled: first shown live, the other two flood on finish.
        let mut console = reporter(Verbosity::Verbose);
        let ctx = RunContext::new();
        console.on_start_test(&ctx, &meta(None, None));
        for _ in 0..3 {
            console.on_notification(&ctx, &notification);
        }
        console.on_success(&ctx, &result(ResultKind::Success));
        console.on_finish_test(&ctx, &meta(None, None));
        assert!(output(&console).ends_with("NNN.\n"), "got: {}", output(&console));

        // More than three collapse to a count.
        let mut console = reporter(Verbosity::Verbose);
        console.on_start_test(&ctx, &meta(None, None));
        for _ in 0..5 {
            console.on_notification(&ctx, &notification);
        }
        console.on_success(&ctx, &result(ResultKind::Success));
        console.on_finish_test(&ctx, &meta(None, None));
        assert!(output(&console).ends_with("N5N.\n"), "got: {}", output(&console));
    }

    #[test]
    fn normal_mode_shows_every_notification_live() {
        let mut console = reporter(Verbosity::Normal);
        let ctx = RunContext::new();
        let notification = result(ResultKind::Notification {
            message: "heads up".to_string(),
        });

        console.on_start_test(&ctx, &meta(None, None));
        for _ in 0..3 {
            console.on_notification(&ctx, &notification);
        }
        console.on_success(&ctx, &result(ResultKind::Success));
        console.on_finish_test(&ctx, &meta(None, None));

        assert_eq!(output(&console), "NNN.");
    }

    #[test]
    fn traceback_entries_print_location_and_info() {
        let mut console = reporter(Verbosity::Normal);
        console.print_traceback(&[TracebackEntry {
            file: "tests/math.rs".to_string(),
            line: 12,
            function: "math::check".to_string(),
            source: Some("ctx.assert_equal(&4, &total)?;".to_string()),
        }]);

        assert_eq!(
            output(&console),
            "tests/math.rs:12: math::check(): ctx.assert_equal(&4, &total)?;\n"
        );
    }

    #[test]
    fn failure_message_prints_expected_and_actual() {
        let mut console = reporter(Verbosity::Normal);
        console.print_fault_message(&result(ResultKind::Failure {
            message: "expected: <4>\n but was: <5>".to_string(),
            expected: Some("4".to_string()),
            actual: Some("5".to_string()),
        }));

        assert_eq!(output(&console), "expected: <4>\n but was: <5>\n");
    }

    #[test]
    fn failure_message_appends_diff_for_multi_line_values() {
        let mut console = reporter(Verbosity::Normal);
        console.print_fault_message(&result(ResultKind::Failure {
            message: String::new(),
            expected: Some("[\n    \"alpha\",\n    \"beta\",\n]".to_string()),
            actual: Some("[\n    \"alpha\",\n    \"BETA\",\n]".to_string()),
        }));

        let text = output(&console);
        assert!(text.contains("\ndiff:\n"), "got: {text}");
        assert!(text.contains("-    \"beta\","), "got: {text}");
        assert!(text.contains("+    \"BETA\","), "got: {text}");
    }

    #[test]
    fn error_message_prints_the_detail() {
        let mut console = reporter(Verbosity::Normal);
        console.print_fault_message(&result(ResultKind::Error {
            type_name: "std::io::Error".to_string(),
            message: "permission denied".to_string(),
        }));

        assert_eq!(output(&console), "std::io::Error: permission denied\n");
    }

    #[test]
    fn summary_of_an_empty_run_is_all_zeroes() {
        let mut console = reporter(Verbosity::Normal);
        let ctx = RunContext::new();
        console.on_finish_test_suite(&ctx);

        assert_eq!(
            output(&console),
            "\nFinished in 0.000 seconds\n\n\
             0 test(s), 0 assertion(s), 0 failure(s), 0 error(s), \
             0 pending(s), 0 omission(s), 0 notification(s)\n"
        );
    }
}
