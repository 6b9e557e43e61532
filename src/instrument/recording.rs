//! The dry-run instrument.

use std::cell::RefCell;
use std::fmt;

use super::{CallKey, CallOptions, VerifyFunctions};
use crate::marks::Mark;

/// One verification call observed during the dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Which wrapped function was called.
    pub key: CallKey,
    /// `Debug` rendering of the arguments.
    pub args: String,
    pub marks: Vec<Mark>,
    pub id: Option<String>,
}

/// The parametrization unit emitted for one recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseParam {
    /// Ordinal of the call in the dry run; the replay target of this case.
    pub index: usize,
    pub id: Option<String>,
    pub marks: Vec<Mark>,
}

impl CaseParam {
    /// The explicit id if one was given, the ordinal otherwise.
    pub fn display_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.index.to_string())
    }
}

/// Logs every verification call instead of executing it.
#[derive(Default)]
pub struct RecordingFunparam {
    pub(crate) verify_functions: RefCell<VerifyFunctions>,
    calls: RefCell<Vec<CallRecord>>,
}

impl RecordingFunparam {
    pub(crate) fn call_verify_function<A: fmt::Debug>(&self, key: CallKey, args: &A, options: CallOptions) {
        let CallOptions { marks, id } = options;
        let record = CallRecord {
            key,
            args: format!("{args:?}"),
            marks,
            id,
        };
        tracing::trace!(call = self.calls.borrow().len(), key = ?record.key, args = %record.args, "recorded verification call");
        self.calls.borrow_mut().push(record);
    }

    /// The call log, in invocation order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// One case per recorded call, in log order.
    pub fn generate_params(&self) -> Vec<CaseParam> {
        self.calls
            .borrow()
            .iter()
            .enumerate()
            .map(|(index, call)| CaseParam {
                index,
                id: call.id.clone(),
                marks: call.marks.clone(),
            })
            .collect()
    }
}
