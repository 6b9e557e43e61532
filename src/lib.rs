#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
//! funparam: one test body, many independently reported cases.
//!
//! A test receives the `funparam` fixture and uses it to wrap verification functions. Every call of a wrapped
//! function becomes its own generated case:
//!
//! 1. A single *dry run* executes the test body with a recording instrument. Only fixtures on the path to
//!    `funparam` are really built; every other input is a stand-in. Verification calls are logged, never run.
//! 2. The log becomes one case per call, on the `_funparam_call_number` axis.
//! 3. Each case re-runs the body against a freshly built fixture graph and a replay instrument that executes
//!    only the call whose ordinal matches the case.
//!
//! ```rust
//! use funparam::{FixtureDef, Request, RunOptions, Suite, TestDef, Verifier};
//!
//! let suite = Suite::new()
//!     .fixture(FixtureDef::new("verify_sum", &["funparam"], |req: &Request| {
//!         Ok(req.funparam()?.wrap(|(a, b, c): (i32, i32, i32)| assert_eq!(a + b, c)))
//!     }))
//!     .unwrap()
//!     .test(TestDef::new("test_addition", &["verify_sum"], |req: &Request| {
//!         let verify_sum: Verifier<(i32, i32, i32)> = req.require("verify_sum")?;
//!         verify_sum.call((1, 2, 3));
//!         verify_sum.call((2, 2, 4));
//!         Ok(())
//!     }));
//!
//! let names: Vec<String> = funparam::runner::collect(&suite).items.into_iter().map(|i| i.name).collect();
//! assert_eq!(names, ["test_addition[0]", "test_addition[1]"]);
//! ```
//!
//! ## Panic Policy
//!
//! This crate follows explicit error handling:
//!
//! - **Library code**: Use `Result` with `?` / `ok_or` / `map_err`. `unwrap` and `expect` are denied.
//!
//! - **Verification call sites**: failures *are* panics. Assertions inside verification functions, and the
//!   usage errors detected at a call site (nesting, a verifier outliving its instrument), unwind to the runner,
//!   which catches them per item.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod driver;
pub mod errors;
pub mod fixtures;
pub mod instrument;
pub mod marks;
pub mod resolver;
pub mod runner;

pub use driver::{Parametrization, generate_tests};
pub use errors::{FunparamError, FunparamResult};
pub use fixtures::{Dep, FixtureDef, FixtureRegistry, Request};
pub use instrument::{CallOptions, CaseParam, Funparam, Verifier};
pub use marks::{Mark, MarkFilter};
pub use resolver::generate_kwargs;
pub use runner::{RunOptions, Suite, TestDef, TestResult, TestSummary};

pub use funparam_core::{CALL_NUMBER_PARAM, FUNPARAM_FIXTURE};
