//! Test runner (pytest-style)
//!
//! The runner is the host side of the engine: it owns the suite, asks the enumeration driver for cases, builds
//! a fresh fixture graph for every collected item and reports outcomes.
//!
//! ## TestReporter Trait
//!
//! Reporting goes through [`TestReporter`], so the output format (console, JSON lines, ...) is independent of
//! execution.
//!
//! ## I/O Boundaries
//!
//! Collection and execution are abstracted via the traits in [`interfaces`] to allow for:
//! - Dry-run modes (`--collect-only`)
//! - Custom execution strategies
//! - Mocking/testing of runner logic
//!
//! Default implementations run everything in-process.

pub mod interfaces;
pub mod reporter;

pub use interfaces::{DefaultTestCollector, DefaultTestExecutor, TestCollector, TestExecutor};
pub use reporter::{ConsoleReporter, JsonReporter, ListReporter, TestReporter};

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, Instant};

use funparam_core::errors::empty_parameter_set_reason;

use crate::driver;
use crate::errors::{FunparamResult, panic_message};
use crate::fixtures::{FixtureDef, FixtureRegistry, Request};
use crate::instrument::CaseParam;
use crate::marks::{Mark, MarkFilter};

/// A test body.
pub type TestFn = dyn Fn(&Request) -> FunparamResult<()>;

/// A test function: its name, the fixtures it declares and its body.
#[derive(Clone)]
pub struct TestDef {
    name: String,
    argnames: Vec<String>,
    body: Rc<TestFn>,
    marks: Vec<Mark>,
}

impl TestDef {
    pub fn new<F>(name: impl Into<String>, argnames: &[&str], body: F) -> Self
    where
        F: Fn(&Request) -> FunparamResult<()> + 'static,
    {
        Self {
            name: name.into(),
            argnames: argnames.iter().map(|s| s.to_string()).collect(),
            body: Rc::new(body),
            marks: Vec::new(),
        }
    }

    /// Mark every item collected from this test.
    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argnames(&self) -> &[String] {
        &self.argnames
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn call(&self, request: &Request) -> FunparamResult<()> {
        (self.body)(request)
    }
}

impl fmt::Debug for TestDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDef")
            .field("name", &self.name)
            .field("argnames", &self.argnames)
            .field("marks", &self.marks)
            .finish()
    }
}

/// Fixtures and tests, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    fixtures: FixtureRegistry,
    tests: Vec<TestDef>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Suite::add_fixture`].
    pub fn fixture(mut self, def: FixtureDef) -> FunparamResult<Self> {
        self.add_fixture(def)?;
        Ok(self)
    }

    pub fn test(mut self, test: TestDef) -> Self {
        self.add_test(test);
        self
    }

    pub fn add_fixture(&mut self, def: FixtureDef) -> FunparamResult<()> {
        self.fixtures.register(def)
    }

    pub fn add_test(&mut self, test: TestDef) {
        self.tests.push(test);
    }

    pub fn fixtures(&self) -> &FixtureRegistry {
        &self.fixtures
    }

    pub fn tests(&self) -> &[TestDef] {
        &self.tests
    }
}

/// One runnable item: a plain test, or one generated case of a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestItem {
    /// `test_name` or `test_name[display_id]`.
    pub name: String,
    /// Index of the owning test in [`Suite::tests`].
    pub test_index: usize,
    pub case: Option<CaseParam>,
    /// Case marks first, then the test's own marks.
    pub marks: Vec<Mark>,
}

impl TestItem {
    pub fn skip_reason(&self) -> Option<&str> {
        self.marks.iter().find_map(|mark| match mark {
            Mark::Skip(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    pub fn xfail_reason(&self) -> Option<&str> {
        self.marks.iter().find_map(|mark| match mark {
            Mark::XFail(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    pub fn is_slow(&self) -> bool {
        self.marks.contains(&Mark::Slow)
    }
}

/// A test whose dry run failed; none of its items are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionError {
    pub test: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub items: Vec<TestItem>,
    pub errors: Vec<CollectionError>,
}

/// Collect every item of `suite`, running the enumeration driver once per test.
#[tracing::instrument(skip_all, fields(tests = suite.tests().len()))]
pub fn collect(suite: &Suite) -> Collection {
    let mut collection = Collection::default();

    for (test_index, test) in suite.tests().iter().enumerate() {
        let generated = panic::catch_unwind(AssertUnwindSafe(|| driver::generate_tests(suite.fixtures(), test)));
        let parametrization = match generated {
            Ok(Ok(parametrization)) => parametrization,
            Ok(Err(err)) => {
                collection.errors.push(CollectionError {
                    test: test.name().to_string(),
                    message: err.render(),
                });
                continue;
            }
            Err(payload) => {
                collection.errors.push(CollectionError {
                    test: test.name().to_string(),
                    message: panic_message(payload.as_ref()),
                });
                continue;
            }
        };

        match parametrization {
            None => collection.items.push(TestItem {
                name: test.name().to_string(),
                test_index,
                case: None,
                marks: test.marks().to_vec(),
            }),
            Some(parametrization) if parametrization.is_empty() => {
                let mut marks = vec![Mark::skip(empty_parameter_set_reason(test.name()))];
                marks.extend_from_slice(test.marks());
                collection.items.push(TestItem {
                    name: test.name().to_string(),
                    test_index,
                    case: None,
                    marks,
                });
            }
            Some(parametrization) => {
                for case in parametrization.cases {
                    let mut marks = case.marks.clone();
                    marks.extend_from_slice(test.marks());
                    collection.items.push(TestItem {
                        name: format!("{}[{}]", test.name(), case.display_id()),
                        test_index,
                        case: Some(case),
                        marks,
                    });
                }
            }
        }
    }

    tracing::debug!(
        items = collection.items.len(),
        errors = collection.errors.len(),
        "collection complete"
    );
    collection
}

/// Options for a run; `RunOptions::default()` runs everything except slow items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub verbose: bool,
    pub stop_on_fail: bool,
    pub include_slow: bool,
    /// Keep only items whose name contains this keyword.
    pub filter: Option<String>,
    /// Match `filter` against the whole item name instead of a substring.
    pub exact: bool,
    /// Keep only items carrying (or lacking) a mark.
    pub mark: Option<MarkFilter>,
    /// Collect and report items without running them.
    pub collect_only: bool,
}

impl RunOptions {
    pub fn selects(&self, item: &TestItem) -> bool {
        if let Some(keyword) = &self.filter {
            let hit = if self.exact {
                item.name == *keyword
            } else {
                item.name.contains(keyword.as_str())
            };
            if !hit {
                return false;
            }
        }
        if let Some(mark) = &self.mark {
            if !mark.matches(&item.marks) {
                return false;
            }
        }
        self.include_slow || !item.is_slow()
    }
}

/// Result of running a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed(Duration),
    Failed(Duration, String),
    Skipped(String),
    XFailed(Duration, String),
    XPassed(Duration),
    /// Fixture setup failed; the body never ran.
    Error(String),
}

impl TestResult {
    /// Outcomes that make the run fail.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Failed(..) | TestResult::XPassed(_) | TestResult::Error(_))
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            TestResult::Passed(_) => "passed",
            TestResult::Failed(..) => "failed",
            TestResult::Skipped(_) => "skipped",
            TestResult::XFailed(..) => "xfailed",
            TestResult::XPassed(_) => "xpassed",
            TestResult::Error(_) => "error",
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            TestResult::Passed(d) | TestResult::Failed(d, _) | TestResult::XFailed(d, _) | TestResult::XPassed(d) => {
                Some(*d)
            }
            TestResult::Skipped(_) | TestResult::Error(_) => None,
        }
    }

    /// Failure message, skip reason or xfail reason.
    pub fn message(&self) -> Option<&str> {
        match self {
            TestResult::Failed(_, msg) | TestResult::XFailed(_, msg) | TestResult::Error(msg) => Some(msg),
            TestResult::Skipped(reason) => Some(reason),
            TestResult::Passed(_) | TestResult::XPassed(_) => None,
        }
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSummary {
    /// Items run plus collection errors.
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub xfailed: usize,
    pub xpassed: usize,
    /// Setup errors plus collection errors.
    pub errors: usize,
    pub duration: Duration,
}

impl TestSummary {
    pub fn record(&mut self, result: &TestResult) {
        self.total += 1;
        match result {
            TestResult::Passed(_) => self.passed += 1,
            TestResult::Failed(..) => self.failed += 1,
            TestResult::Skipped(_) => self.skipped += 1,
            TestResult::XFailed(..) => self.xfailed += 1,
            TestResult::XPassed(_) => self.xpassed += 1,
            TestResult::Error(_) => self.errors += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.xpassed == 0 && self.errors == 0
    }

    /// `2 passed, 1 failed`; counts of zero are left out.
    pub fn counts_line(&self) -> String {
        let parts: Vec<String> = [
            (self.passed, "passed"),
            (self.failed, "failed"),
            (self.skipped, "skipped"),
            (self.xfailed, "xfailed"),
            (self.xpassed, "xpassed"),
            (self.errors, if self.errors == 1 { "error" } else { "errors" }),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect();

        if parts.is_empty() {
            "no tests ran".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Collect and run `suite` in-process.
pub fn run_suite(suite: &Suite, options: &RunOptions, reporter: &mut dyn TestReporter) -> TestSummary {
    run_suite_with(&DefaultTestCollector, &DefaultTestExecutor, suite, options, reporter)
}

/// Collect and run `suite` with custom collection and execution.
#[tracing::instrument(skip_all, fields(filter = ?options.filter, collect_only = options.collect_only))]
pub fn run_suite_with(
    collector: &dyn TestCollector,
    executor: &dyn TestExecutor,
    suite: &Suite,
    options: &RunOptions,
    reporter: &mut dyn TestReporter,
) -> TestSummary {
    let start_time = Instant::now();
    let collection = collector.collect(suite);
    let items: Vec<&TestItem> = collection.items.iter().filter(|item| options.selects(item)).collect();

    reporter.on_collection_complete(items.len(), &collection.errors);

    let mut summary = TestSummary {
        total: collection.errors.len(),
        errors: collection.errors.len(),
        ..TestSummary::default()
    };

    if options.collect_only {
        for item in items {
            reporter.on_item_collected(item);
        }
    } else {
        for item in items {
            reporter.on_test_start(item);
            let result = run_item(executor, suite, item);
            summary.record(&result);
            reporter.on_test_complete(item, &result);

            if options.stop_on_fail && result.is_failure() {
                tracing::debug!(item = %item.name, "stopping after first failure");
                break;
            }
        }
    }

    summary.duration = start_time.elapsed();
    reporter.on_run_complete(&summary);
    summary
}

fn run_item(executor: &dyn TestExecutor, suite: &Suite, item: &TestItem) -> TestResult {
    if let Some(reason) = item.skip_reason() {
        return TestResult::Skipped(reason.to_string());
    }
    let Some(test) = suite.tests().get(item.test_index) else {
        return TestResult::Error(format!("no test at index {} for item '{}'", item.test_index, item.name));
    };

    let result = executor.execute(suite, test, item);

    match item.xfail_reason() {
        Some(reason) => match result {
            TestResult::Passed(d) => TestResult::XPassed(d),
            TestResult::Failed(d, _) => TestResult::XFailed(d, reason.to_string()),
            other => other,
        },
        None => result,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::errors::FunparamError;
    use crate::instrument::{CallOptions, Verifier};
    use std::cell::RefCell;

    /// Records every event instead of printing it.
    #[derive(Default)]
    struct RecordingReporter {
        collected: usize,
        results: Vec<(String, TestResult)>,
        summary: Option<TestSummary>,
    }

    impl TestReporter for RecordingReporter {
        fn on_collection_complete(&mut self, item_count: usize, _errors: &[CollectionError]) {
            self.collected = item_count;
        }

        fn on_test_complete(&mut self, item: &TestItem, result: &TestResult) {
            self.results.push((item.name.clone(), result.clone()));
        }

        fn on_run_complete(&mut self, summary: &TestSummary) {
            self.summary = Some(summary.clone());
        }
    }

    fn addition_suite() -> Suite {
        Suite::new()
            .fixture(FixtureDef::new("verify_sum", &["funparam"], |req: &Request| {
                Ok(req.funparam()?.wrap(|(a, b, c): (i32, i32, i32)| assert_eq!(a + b, c)))
            }))
            .unwrap()
            .test(TestDef::new("test_addition", &["verify_sum"], |req: &Request| {
                let verify_sum: Verifier<(i32, i32, i32)> = req.require("verify_sum")?;
                verify_sum.call((1, 2, 3));
                verify_sum.call((2, 2, 3));
                verify_sum.call((2, 2, 4));
                Ok(())
            }))
    }

    fn outcomes(reporter: &RecordingReporter) -> Vec<(&str, &'static str)> {
        reporter
            .results
            .iter()
            .map(|(name, result)| (name.as_str(), result.outcome()))
            .collect()
    }

    #[test]
    fn three_calls_two_pass_one_fails() {
        let mut reporter = RecordingReporter::default();
        let summary = run_suite(&addition_suite(), &RunOptions::default(), &mut reporter);

        assert_eq!(
            outcomes(&reporter),
            vec![
                ("test_addition[0]", "passed"),
                ("test_addition[1]", "failed"),
                ("test_addition[2]", "passed"),
            ]
        );
        assert_eq!(summary.counts_line(), "2 passed, 1 failed");
        assert!(!summary.is_success());
    }

    #[test]
    fn plain_tests_run_once() {
        let runs = Rc::new(RefCell::new(0));
        let counter = runs.clone();
        let suite = Suite::new().test(TestDef::new("test_plain", &[], move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        }));

        let mut reporter = RecordingReporter::default();
        run_suite(&suite, &RunOptions::default(), &mut reporter);
        assert_eq!(outcomes(&reporter), vec![("test_plain", "passed")]);
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn empty_parameter_set_is_skipped() {
        let suite = Suite::new().test(TestDef::new("test_nothing", &["funparam"], |_| Ok(())));
        let collection = collect(&suite);

        assert_eq!(collection.items.len(), 1);
        assert_eq!(
            collection.items[0].skip_reason(),
            Some(empty_parameter_set_reason("test_nothing").as_str())
        );

        let mut reporter = RecordingReporter::default();
        let summary = run_suite(&suite, &RunOptions::default(), &mut reporter);
        assert_eq!(summary.skipped, 1);
        assert!(summary.is_success());
    }

    #[test]
    fn xfail_inverts_outcomes() {
        let suite = Suite::new().test(TestDef::new("test_marked", &["funparam"], |req: &Request| {
            let verify = req.funparam()?.wrap(|ok: bool| assert!(ok));
            verify.call_with(false, CallOptions::new().mark(Mark::xfail("known")));
            verify.call_with(true, CallOptions::new().mark(Mark::xfail("")));
            Ok(())
        }));

        let mut reporter = RecordingReporter::default();
        let summary = run_suite(&suite, &RunOptions::default(), &mut reporter);
        assert_eq!(reporter.results[0].1.message(), Some("known"));
        assert_eq!(summary.xfailed, 1);
        assert_eq!(summary.xpassed, 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn filter_and_slow_select_items() {
        let suite = Suite::new()
            .test(TestDef::new("test_fast", &[], |_| Ok(())))
            .test(TestDef::new("test_heavy", &[], |_| Ok(())).mark(Mark::Slow));

        let mut reporter = RecordingReporter::default();
        run_suite(&suite, &RunOptions::default(), &mut reporter);
        assert_eq!(reporter.collected, 1);

        let options = RunOptions {
            include_slow: true,
            filter: Some("heavy".into()),
            ..RunOptions::default()
        };
        let mut reporter = RecordingReporter::default();
        run_suite(&suite, &options, &mut reporter);
        assert_eq!(outcomes(&reporter), vec![("test_heavy", "passed")]);
    }

    #[test]
    fn exact_and_mark_filters_select_items() {
        let suite = Suite::new().test(TestDef::new("test_marked", &["funparam"], |req: &Request| {
            let verify = req.funparam()?.wrap(|ok: bool| assert!(ok));
            verify.call(true);
            verify.call_with(false, CallOptions::new().mark(Mark::xfail("known")));
            verify.call_with(true, CallOptions::new().id("test_marked[1]x"));
            Ok(())
        }));

        let options = RunOptions {
            filter: Some("test_marked[1]".into()),
            exact: true,
            ..RunOptions::default()
        };
        let mut reporter = RecordingReporter::default();
        run_suite(&suite, &options, &mut reporter);
        assert_eq!(outcomes(&reporter), vec![("test_marked[1]", "xfailed")]);

        let options = RunOptions {
            mark: Some("not xfail".parse().unwrap()),
            ..RunOptions::default()
        };
        let mut reporter = RecordingReporter::default();
        run_suite(&suite, &options, &mut reporter);
        assert_eq!(
            outcomes(&reporter),
            vec![("test_marked[0]", "passed"), ("test_marked[test_marked[1]x]", "passed")]
        );
    }

    #[test]
    fn stop_on_fail_stops_after_first_failure() {
        let options = RunOptions {
            stop_on_fail: true,
            ..RunOptions::default()
        };
        let mut reporter = RecordingReporter::default();
        let summary = run_suite(&addition_suite(), &options, &mut reporter);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.counts_line(), "1 passed, 1 failed");
    }

    #[test]
    fn collect_only_runs_nothing() {
        let options = RunOptions {
            collect_only: true,
            ..RunOptions::default()
        };
        let mut reporter = RecordingReporter::default();
        let summary = run_suite(&addition_suite(), &options, &mut reporter);
        assert_eq!(reporter.collected, 3);
        assert!(reporter.results.is_empty());
        assert_eq!(summary.counts_line(), "no tests ran");
    }

    #[test]
    fn dry_run_failure_is_a_collection_error() {
        let suite = Suite::new()
            .fixture(FixtureDef::new("broken", &["funparam"], |_| -> FunparamResult<()> {
                Err(FunparamError::failed("cannot build"))
            }))
            .unwrap()
            .test(TestDef::new("test_broken", &["broken"], |_| Ok(())))
            .test(TestDef::new("test_fine", &[], |_| Ok(())));

        let collection = collect(&suite);
        assert_eq!(
            collection.errors,
            vec![CollectionError {
                test: "test_broken".into(),
                message: "cannot build".into(),
            }]
        );
        assert_eq!(collection.items.len(), 1);

        let mut reporter = RecordingReporter::default();
        let summary = run_suite(&suite, &RunOptions::default(), &mut reporter);
        assert_eq!(summary.counts_line(), "1 passed, 1 error");
        assert_eq!(summary.total, summary.passed + summary.errors);
    }

    #[test]
    fn counts_line_lists_non_zero_counts() {
        let summary = TestSummary {
            passed: 3,
            skipped: 1,
            errors: 2,
            ..TestSummary::default()
        };
        assert_eq!(summary.counts_line(), "3 passed, 1 skipped, 2 errors");
    }
}
