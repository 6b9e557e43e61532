//! Error taxonomy for the funparam engine.
//!
//! Resolution and setup failures are returned as `Result<_, FunparamError>`. Usage errors detected at a
//! verification call site (nesting, unregistered wrappers) are *raised*: they unwind from the call site with a
//! `FunparamError` payload so they fail exactly the case that reached them, the same way an assertion does.

use std::any::Any;

use funparam_core::errors::{NESTED_FUNPARAM_HELP, NESTED_FUNPARAM_MSG, UNREGISTERED_VERIFIER_MSG};
use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while resolving fixtures, building them, or dispatching verification calls.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum FunparamError {
    #[error("fixture '{name}' not found")]
    #[diagnostic(code(funparam::unknown_fixture), help("available: {available}"))]
    UnknownFixture { name: String, available: String },

    #[error("'{owner}' has no input named '{name}'")]
    #[diagnostic(code(funparam::undeclared_input), help("declared inputs: {declared}"))]
    UndeclaredInput {
        owner: String,
        name: String,
        declared: String,
    },

    #[error("fixture '{name}' is a stand-in during the dry run and has no real value")]
    #[diagnostic(
        code(funparam::stand_in),
        help("only read real values of unrelated fixtures inside verification functions")
    )]
    StandIn { name: String },

    #[error("fixture '{name}' does not hold a value of type `{expected}`")]
    #[diagnostic(code(funparam::type_mismatch))]
    TypeMismatch { name: String, expected: &'static str },

    #[error("recursive dependency involving fixture '{name}' detected")]
    #[diagnostic(code(funparam::fixture_cycle))]
    FixtureCycle { name: String },

    #[error("'{name}' is reserved by funparam and cannot be defined as a fixture")]
    #[diagnostic(code(funparam::reserved_name))]
    ReservedName { name: String },

    #[error("unknown mark '{name}'")]
    #[diagnostic(code(funparam::unknown_mark), help("known marks: {known}"))]
    UnknownMark { name: String, known: String },

    #[error("'funparam' was requested without a call number")]
    #[diagnostic(code(funparam::missing_call_number))]
    MissingCallNumber {
        #[help]
        hint: String,
    },

    #[error("{}", NESTED_FUNPARAM_MSG)]
    #[diagnostic(code(funparam::nested))]
    NestedFunparam {
        #[help]
        help: String,
    },

    #[error("{}", UNREGISTERED_VERIFIER_MSG)]
    #[diagnostic(code(funparam::unregistered_verifier))]
    UnregisteredVerifier,

    /// A fixture builder or test body gave up with its own message.
    #[error("{message}")]
    #[diagnostic(code(funparam::failed))]
    Failed { message: String },
}

impl FunparamError {
    /// Create the nesting-violation error.
    pub fn nested() -> Self {
        FunparamError::NestedFunparam {
            help: NESTED_FUNPARAM_HELP.to_string(),
        }
    }

    /// Create a free-form failure, for fixture builders and test bodies.
    pub fn failed(message: impl Into<String>) -> Self {
        FunparamError::Failed {
            message: message.into(),
        }
    }

    /// Render the error with its help text, if any.
    pub fn render(&self) -> String {
        match self.help() {
            Some(help) => format!("{self}\nhelp: {help}"),
            None => self.to_string(),
        }
    }
}

/// Result alias used across the engine.
pub type FunparamResult<T> = Result<T, FunparamError>;

/// Raise a usage error at a verification call site.
#[cold]
#[track_caller]
pub(crate) fn raise(err: FunparamError) -> ! {
    std::panic::panic_any(err)
}

/// Describe a caught panic payload for reports.
///
/// `FunparamError` payloads are rendered with their help text; string payloads (from `panic!`/`assert!`)
/// are passed through unchanged.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(err) = payload.downcast_ref::<FunparamError>() {
        err.render()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked with a non-string payload".to_string()
    }
}
