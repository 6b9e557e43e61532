//! Runner I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the two runner operations that touch user code:
//! - Collection (one dry run per test)
//! - Execution (fixture setup + body for one item)
//!
//! Both user-code boundaries catch panics, so one misbehaving test never takes down the run.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use funparam_core::lang::fixtures::CALL_NUMBER_PARAM;

use super::{Collection, Suite, TestDef, TestItem, TestResult};
use crate::errors::panic_message;
use crate::fixtures::{FixtureValue, build_request};

// ============================================================================
// Test Collector Interface
// ============================================================================

/// Turn a suite into runnable items.
pub trait TestCollector {
    fn collect(&self, suite: &Suite) -> Collection;
}

// ============================================================================
// Test Executor Interface
// ============================================================================

/// Run one item. Marks have already been applied by the runner: a skipped item never reaches the executor and
/// xfail inversion happens on the returned result.
pub trait TestExecutor {
    fn execute(&self, suite: &Suite, test: &TestDef, item: &TestItem) -> TestResult;
}

// ============================================================================
// Default Implementations
// ============================================================================

/// Collection through the enumeration driver.
pub struct DefaultTestCollector;

impl TestCollector for DefaultTestCollector {
    fn collect(&self, suite: &Suite) -> Collection {
        super::collect(suite)
    }
}

/// In-process execution with a freshly built fixture graph per item.
///
/// Setup failures (builder errors or panics) are reported as [`TestResult::Error`]; errors returned by the body
/// and panics raised while it runs, including verification failures, are [`TestResult::Failed`].
pub struct DefaultTestExecutor;

impl TestExecutor for DefaultTestExecutor {
    fn execute(&self, suite: &Suite, test: &TestDef, item: &TestItem) -> TestResult {
        let start = Instant::now();

        let mut params = HashMap::new();
        if let Some(case) = &item.case {
            params.insert(CALL_NUMBER_PARAM.to_string(), FixtureValue::new(case.index));
        }

        let setup = panic::catch_unwind(AssertUnwindSafe(|| {
            build_request(suite.fixtures(), test.name(), test.argnames(), &params)
        }));
        let request = match setup {
            Ok(Ok(request)) => request,
            Ok(Err(err)) => return TestResult::Error(err.render()),
            Err(payload) => return TestResult::Error(panic_message(payload.as_ref())),
        };

        tracing::trace!(item = %item.name, "running test body");
        match panic::catch_unwind(AssertUnwindSafe(|| test.call(&request))) {
            Ok(Ok(())) => TestResult::Passed(start.elapsed()),
            Ok(Err(err)) => TestResult::Failed(start.elapsed(), err.render()),
            Err(payload) => TestResult::Failed(start.elapsed(), panic_message(payload.as_ref())),
        }
    }
}
