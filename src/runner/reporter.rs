//! Test reporters.
//!
//! Write errors are ignored: a reporter that cannot write has nowhere to report that either.

use std::io::{self, Write};

use serde_json::json;

use super::{CollectionError, TestItem, TestResult, TestSummary};

/// Trait for reporting test execution results.
///
/// Implement this trait to customize the output format.
pub trait TestReporter {
    /// Called once collection is complete, with the number of selected items.
    fn on_collection_complete(&mut self, item_count: usize, errors: &[CollectionError]);

    /// Called per selected item in collect-only mode
    fn on_item_collected(&mut self, _item: &TestItem) {}

    /// Called when an item starts running
    fn on_test_start(&mut self, _item: &TestItem) {}

    /// Called when an item completes
    fn on_test_complete(&mut self, item: &TestItem, result: &TestResult);

    /// Called when all items have completed
    fn on_run_complete(&mut self, summary: &TestSummary);
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// Default console reporter (pytest-style)
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    verbose: bool,
    color: bool,
    /// Progress characters printed on the current line (non-verbose mode).
    progress: usize,
    /// Failing items, reported after the run.
    failures: Vec<(String, String)>,
    collection_errors: Vec<CollectionError>,
}

impl ConsoleReporter {
    /// Colored reporter on stdout.
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(io::stdout(), verbose, true)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, verbose: bool, color: bool) -> Self {
        Self {
            out,
            verbose,
            color,
            progress: 0,
            failures: Vec::new(),
            collection_errors: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn status(&self, result: &TestResult) -> String {
        let with_reason = |label: &str, reason: &str| {
            if reason.is_empty() {
                label.to_string()
            } else {
                format!("{label} ({reason})")
            }
        };
        match result {
            TestResult::Passed(d) if self.verbose => {
                format!("{} ({}ms)", self.paint(GREEN, "PASSED"), d.as_millis())
            }
            TestResult::Passed(_) => self.paint(GREEN, "."),
            TestResult::Failed(d, _) if self.verbose => {
                format!("{} ({}ms)", self.paint(RED, "FAILED"), d.as_millis())
            }
            TestResult::Failed(..) => self.paint(RED, "F"),
            TestResult::Skipped(reason) if self.verbose => self.paint(YELLOW, &with_reason("SKIPPED", reason)),
            TestResult::Skipped(_) => self.paint(YELLOW, "s"),
            TestResult::XFailed(_, reason) if self.verbose => self.paint(YELLOW, &with_reason("XFAIL", reason)),
            TestResult::XFailed(..) => self.paint(YELLOW, "x"),
            TestResult::XPassed(_) if self.verbose => self.paint(RED, "XPASS"),
            TestResult::XPassed(_) => self.paint(RED, "X"),
            TestResult::Error(_) if self.verbose => self.paint(RED, "ERROR"),
            TestResult::Error(_) => self.paint(RED, "E"),
        }
    }

    fn section(&mut self, color: &str, title: &str) {
        let line = self.paint(color, &format!("=================== {title} ==================="));
        let _ = writeln!(self.out, "{line}");
    }

    fn finish_progress_line(&mut self) {
        if self.progress > 0 {
            let _ = writeln!(self.out);
            self.progress = 0;
        }
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_collection_complete(&mut self, item_count: usize, errors: &[CollectionError]) {
        self.section(BOLD, "test session starts");
        let noun = if item_count == 1 { "item" } else { "items" };
        if errors.is_empty() {
            let _ = writeln!(self.out, "collected {item_count} {noun}");
        } else {
            let _ = writeln!(self.out, "collected {item_count} {noun} / {} errors", errors.len());
        }
        let _ = writeln!(self.out);
        self.collection_errors = errors.to_vec();
    }

    fn on_item_collected(&mut self, item: &TestItem) {
        let _ = writeln!(self.out, "{}", item.name);
    }

    fn on_test_start(&mut self, item: &TestItem) {
        if self.verbose {
            let _ = write!(self.out, "{} ", item.name);
        }
    }

    fn on_test_complete(&mut self, item: &TestItem, result: &TestResult) {
        let status = self.status(result);
        if self.verbose {
            let _ = writeln!(self.out, "{status}");
        } else {
            let _ = write!(self.out, "{status}");
            self.progress += 1;
        }
        let _ = self.out.flush();

        match result {
            TestResult::Failed(_, msg) | TestResult::Error(msg) => {
                self.failures.push((item.name.clone(), msg.clone()));
            }
            TestResult::XPassed(_) => {
                self.failures
                    .push((item.name.clone(), "Test passed but was expected to fail (xfail)".to_string()));
            }
            _ => {}
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        self.finish_progress_line();

        let errors = std::mem::take(&mut self.collection_errors);
        if !errors.is_empty() {
            let _ = writeln!(self.out);
            self.section(BOLD_RED, "ERRORS");
            for error in errors {
                let _ = writeln!(self.out);
                let header = self.paint(BOLD, &format!("___________ ERROR collecting {} ___________", error.test));
                let _ = writeln!(self.out, "{header}");
                for line in error.message.lines() {
                    let _ = writeln!(self.out, "    {line}");
                }
            }
        }

        let failures = std::mem::take(&mut self.failures);
        if !failures.is_empty() {
            let _ = writeln!(self.out);
            self.section(BOLD_RED, "FAILURES");
            for (name, message) in failures {
                let _ = writeln!(self.out);
                let header = self.paint(BOLD, &format!("___________ {name} ___________"));
                let _ = writeln!(self.out, "{header}");
                for line in message.lines() {
                    let _ = writeln!(self.out, "    {line}");
                }
            }
        }

        let _ = writeln!(self.out);
        let color = if summary.is_success() { BOLD_GREEN } else { BOLD_RED };
        let title = format!("{} in {:.2}s", summary.counts_line(), summary.duration.as_secs_f64());
        self.section(color, &title);
        let _ = self.out.flush();
    }
}

/// Machine-readable reporter: one JSON object per line.
///
/// Every object carries an `event` field: `collection`, `collected`, `result` or `summary`.
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: serde_json::Value) {
        let _ = writeln!(self.out, "{value}");
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_collection_complete(&mut self, item_count: usize, errors: &[CollectionError]) {
        let errors: Vec<_> = errors
            .iter()
            .map(|error| json!({ "test": error.test, "message": error.message }))
            .collect();
        self.emit(json!({ "event": "collection", "items": item_count, "errors": errors }));
    }

    fn on_item_collected(&mut self, item: &TestItem) {
        let marks: Vec<String> = item.marks.iter().map(ToString::to_string).collect();
        self.emit(json!({ "event": "collected", "name": item.name, "marks": marks }));
    }

    fn on_test_complete(&mut self, item: &TestItem, result: &TestResult) {
        self.emit(json!({
            "event": "result",
            "name": item.name,
            "outcome": result.outcome(),
            "duration_ms": result.duration().map(|d| d.as_secs_f64() * 1000.0),
            "message": result.message(),
        }));
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        self.emit(json!({
            "event": "summary",
            "total": summary.total,
            "passed": summary.passed,
            "failed": summary.failed,
            "skipped": summary.skipped,
            "xfailed": summary.xfailed,
            "xpassed": summary.xpassed,
            "errors": summary.errors,
            "duration_ms": summary.duration.as_secs_f64() * 1000.0,
        }));
        let _ = self.out.flush();
    }
}

/// `cargo test -- --list` output: one `name: test` line per item, then a count unless `terse`.
pub struct ListReporter<W: Write = io::Stdout> {
    out: W,
    terse: bool,
    listed: usize,
}

impl ListReporter {
    pub fn new(terse: bool) -> Self {
        Self::with_writer(io::stdout(), terse)
    }
}

impl<W: Write> ListReporter<W> {
    pub fn with_writer(out: W, terse: bool) -> Self {
        Self { out, terse, listed: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TestReporter for ListReporter<W> {
    fn on_collection_complete(&mut self, _item_count: usize, _errors: &[CollectionError]) {}

    fn on_item_collected(&mut self, item: &TestItem) {
        let _ = writeln!(self.out, "{}: test", item.name);
        self.listed += 1;
    }

    fn on_test_complete(&mut self, _item: &TestItem, _result: &TestResult) {}

    fn on_run_complete(&mut self, _summary: &TestSummary) {
        if !self.terse {
            let noun = if self.listed == 1 { "test" } else { "tests" };
            let _ = writeln!(self.out, "\n{} {noun}, 0 benchmarks", self.listed);
        }
        let _ = self.out.flush();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn item(name: &str) -> TestItem {
        TestItem {
            name: name.into(),
            test_index: 0,
            case: None,
            marks: Vec::new(),
        }
    }

    #[test]
    fn console_reports_progress_failures_and_summary() {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), false, false);
        reporter.on_collection_complete(2, &[]);
        reporter.on_test_complete(&item("test_sum[0]"), &TestResult::Passed(Duration::ZERO));
        reporter.on_test_complete(
            &item("test_sum[1]"),
            &TestResult::Failed(Duration::ZERO, "assertion failed: 2 + 2 == 3".into()),
        );
        reporter.on_run_complete(&TestSummary {
            total: 2,
            passed: 1,
            failed: 1,
            ..TestSummary::default()
        });

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        insta::assert_snapshot!(output, @r"
        =================== test session starts ===================
        collected 2 items

        .F

        =================== FAILURES ===================

        ___________ test_sum[1] ___________
            assertion failed: 2 + 2 == 3

        =================== 1 passed, 1 failed in 0.00s ===================
        ");
    }

    #[test]
    fn console_verbose_lists_items() {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), true, false);
        let skipped = item("test_sum[2]");
        reporter.on_test_start(&skipped);
        reporter.on_test_complete(&skipped, &TestResult::Skipped("not yet".into()));

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(output, "test_sum[2] SKIPPED (not yet)\n");
    }

    #[test]
    fn json_lines_are_parseable() {
        let mut reporter = JsonReporter::with_writer(Vec::new());
        reporter.on_collection_complete(
            1,
            &[CollectionError {
                test: "test_broken".into(),
                message: "cannot build".into(),
            }],
        );
        reporter.on_test_complete(&item("test_sum[0]"), &TestResult::XFailed(Duration::ZERO, "known".into()));

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0]["event"], "collection");
        assert_eq!(lines[0]["errors"][0]["test"], "test_broken");
        assert_eq!(lines[1]["outcome"], "xfailed");
        assert_eq!(lines[1]["message"], "known");
    }

    #[test]
    fn list_reporter_matches_libtest_listing() {
        let mut reporter = ListReporter::with_writer(Vec::new(), false);
        reporter.on_collection_complete(2, &[]);
        reporter.on_item_collected(&item("test_sum[0]"));
        reporter.on_item_collected(&item("test_sum[1]"));
        reporter.on_run_complete(&TestSummary::default());
        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(output, "test_sum[0]: test\ntest_sum[1]: test\n\n2 tests, 0 benchmarks\n");

        let mut reporter = ListReporter::with_writer(Vec::new(), true);
        reporter.on_item_collected(&item("test_plain"));
        reporter.on_run_complete(&TestSummary::default());
        assert_eq!(String::from_utf8(reporter.into_inner()).unwrap(), "test_plain: test\n");
    }
}
