//! Shared user-facing messages.
//!
//! The engine raises these at verification call sites and the harness prints them in
//! failure reports, so both sides read the text from here.

use crate::lang::fixtures::{CALL_NUMBER_PARAM, FUNPARAM_FIXTURE};

/// Raised when a verification call is made from inside another verification call.
pub const NESTED_FUNPARAM_MSG: &str = "Cannot nest functions decorated with 'funparam'.";

/// Explains why nesting cannot be supported.
pub const NESTED_FUNPARAM_HELP: &str = "'funparam' does a dry run of the test function to discover how many times \
     'funparam' functions are called, then generates that many test cases. Functions decorated with 'funparam' \
     are not executed during the dry run, so calls made from inside them are never seen and the generated case \
     count would be wrong.";

/// Raised when a wrapper outlives (or never belonged to) the instrument that minted its key.
pub const UNREGISTERED_VERIFIER_MSG: &str = "verification function is not registered with the active 'funparam' instrument";

/// Skip reason for a test whose dry run recorded zero verification calls.
///
/// ## Examples
/// ```rust
/// use funparam_core::errors::empty_parameter_set_reason;
///
/// assert_eq!(
///     empty_parameter_set_reason("test_nothing"),
///     "got empty parameter set for _funparam_call_number (test_nothing)"
/// );
/// ```
pub fn empty_parameter_set_reason(test_name: &str) -> String {
    format!("got empty parameter set for {CALL_NUMBER_PARAM} ({test_name})")
}

/// Hint appended when the call-number parameter is missing while building `funparam` for real.
pub fn missing_call_number_hint() -> String {
    format!(
        "'{FUNPARAM_FIXTURE}' requires the '{CALL_NUMBER_PARAM}' parameter; \
         it is only available on cases generated from a dry run"
    )
}
