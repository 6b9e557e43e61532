//! Reserved fixture and parameter names.

/// The distinguished fixture name every verification call is routed through.
pub const FUNPARAM_FIXTURE: &str = "funparam";

/// The synthetic parametrization axis carrying a generated case's call ordinal.
pub const CALL_NUMBER_PARAM: &str = "_funparam_call_number";

/// Return true when `name` is reserved by the engine and must not be defined by users.
pub fn is_reserved(name: &str) -> bool {
    name == CALL_NUMBER_PARAM
}
