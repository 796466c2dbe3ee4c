//! XML report rendering.
//!
//! The report is rendered after the run, from the recorded results, in event
//! order. Every result appears, successes and notifications included, so the
//! report is a full transcript rather than a fault list.

use attest_core::{CaseMeta, TestMeta, TestResult, TracebackEntry};

/// Renders a whole run as an XML document.
pub fn render(results: &[TestResult]) -> String {
    if results.is_empty() {
        return "<report/>\n".to_string();
    }
    let mut out = String::from("<report>\n");
    for result in results {
        write_result(&mut out, result);
    }
    out.push_str("</report>\n");
    out
}

fn write_result(out: &mut String, result: &TestResult) {
    out.push_str("  <result>\n");
    write_test_case(out, &result.test.case);
    write_test(out, &result.test);
    write_tag(out, 4, "status", result.kind.name());
    write_tag(out, 4, "detail", &result.detail());
    write_tag(out, 4, "elapsed", &format!("{:.6}", result.elapsed.as_secs_f64()));
    write_backtrace(out, &result.traceback);
    out.push_str("  </result>\n");
}

fn write_test_case(out: &mut String, case: &CaseMeta) {
    out.push_str("    <test_case>\n");
    write_tag(out, 6, "name", &case.name);
    write_tag(out, 6, "description", case.description.as_deref().unwrap_or(""));
    out.push_str("    </test_case>\n");
}

fn write_test(out: &mut String, test: &TestMeta) {
    out.push_str("    <test>\n");
    write_tag(out, 6, "name", &test.name);
    write_tag(out, 6, "description", test.description.as_deref().unwrap_or(""));
    for (key, value) in test.metadata.iter() {
        out.push_str("      <option>\n");
        write_tag(out, 8, "name", key);
        write_tag(out, 8, "value", &value.to_string());
        out.push_str("      </option>\n");
    }
    out.push_str("    </test>\n");
}

fn write_backtrace(out: &mut String, traceback: &[TracebackEntry]) {
    if traceback.is_empty() {
        return;
    }
    out.push_str("    <backtrace>\n");
    for entry in traceback {
        out.push_str("      <entry>\n");
        write_tag(out, 8, "file", &entry.file);
        write_tag(out, 8, "line", &entry.line.to_string());
        write_tag(out, 8, "info", &entry.info());
        out.push_str("      </entry>\n");
    }
    out.push_str("    </backtrace>\n");
}

/// Writes one element on its own line; empty content collapses to a
/// self-closing tag.
fn write_tag(out: &mut String, indent: usize, name: &str, content: &str) {
    for _ in 0..indent {
        out.push(' ');
    }
    if content.is_empty() {
        out.push_str(&format!("<{name}/>\n"));
    } else {
        out.push_str(&format!("<{name}>{}</{name}>\n", escape(content)));
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
