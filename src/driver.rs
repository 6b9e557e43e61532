//! Enumeration driver: one dry run per test, one case per recorded call.

use funparam_core::lang::fixtures::{CALL_NUMBER_PARAM, FUNPARAM_FIXTURE};

use crate::errors::FunparamResult;
use crate::fixtures::FixtureRegistry;
use crate::instrument::{CaseParam, Funparam, RecordingFunparam};
use crate::resolver::generate_kwargs;
use crate::runner::TestDef;

/// The cases generated for one test, all on the `_funparam_call_number` axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parametrization {
    pub argname: &'static str,
    pub cases: Vec<CaseParam>,
}

impl Parametrization {
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Dry-run `test` and derive its cases.
///
/// Returns `Ok(None)` when the test does not use `funparam`; such a test must be collected unchanged. A test
/// that uses `funparam` but makes no verification call yields an empty parametrization.
///
/// ## Errors
/// Builder errors on the path to `funparam` and errors returned by the test body during the dry run.
#[tracing::instrument(skip_all, fields(test = %test.name()))]
pub fn generate_tests(registry: &FixtureRegistry, test: &TestDef) -> FunparamResult<Option<Parametrization>> {
    if !registry.closure(test.argnames()).iter().any(|name| name == FUNPARAM_FIXTURE) {
        tracing::debug!("'funparam' is not reachable; test left untouched");
        return Ok(None);
    }

    let funparam = Funparam::recording();
    let Some(kwargs) = generate_kwargs(registry, test.name(), test.argnames(), &funparam)? else {
        tracing::debug!("no input leads to the canonical 'funparam'; test left untouched");
        return Ok(None);
    };

    test.call(&kwargs)?;

    let cases = funparam
        .as_recording()
        .map(RecordingFunparam::generate_params)
        .unwrap_or_default();
    tracing::debug!(calls = cases.len(), "dry run recorded verification calls");
    Ok(Some(Parametrization {
        argname: CALL_NUMBER_PARAM,
        cases,
    }))
}
