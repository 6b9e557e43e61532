//! Command-line harness for funparam suites
//!
//! A test target with `harness = false` hands its suite to [`main`]:
//!
//! ```rust,no_run
//! use funparam::{Request, Suite, TestDef, Verifier};
//!
//! fn main() {
//!     let suite = Suite::new().test(TestDef::new("test_addition", &["funparam"], |req: &Request| {
//!         let verify_sum: Verifier<(i32, i32, i32)> =
//!             req.funparam()?.wrap(|(a, b, c): (i32, i32, i32)| assert_eq!(a + b, c));
//!         verify_sum.call((1, 2, 3));
//!         verify_sum.call((2, 2, 4));
//!         Ok(())
//!     }));
//!     funparam::cli::main(suite);
//! }
//! ```
//!
//! ## Arguments
//!
//! - `[FILTER]` / `-k EXPR` - Only run items whose name contains the keyword
//! - `-v, --verbose` - One line per item
//! - `--exact` - Match the filter against whole item names
//! - `-m MARK` / `-m "not MARK"` - Only run items carrying (or lacking) a mark
//! - `-x, --exitfirst` - Stop on first failure
//! - `--slow` - Include items marked `slow`
//! - `--collect-only` - List items without running them
//! - `--list` - List items in `cargo test -- --list` format
//! - `--format console|json` - Output format
//!
//! `--nocapture`, `--test-threads`, `-q/--quiet` and `--format pretty|terse` are accepted so that
//! `cargo test -- <libtest flags>` keeps working; output is never captured and items run sequentially.
//!
//! ## Design
//!
//! Arguments are parsed with clap derive and turned into [`RunOptions`]. [`execute`] returns `CliResult<T>`
//! instead of calling `process::exit`; only [`main`] exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::panic;
use std::process;

use clap::{Parser, ValueEnum};

use crate::errors::FunparamError;
use crate::marks::MarkFilter;
use crate::runner::{self, ConsoleReporter, JsonReporter, ListReporter, RunOptions, Suite, TestReporter};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// Something failed, errored or passed unexpectedly.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Arguments parsed but could not be used (same code clap uses for parse errors).
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. [`main`] prints the message and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Usage error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::USAGE)
    }
}

impl From<FunparamError> for CliError {
    fn from(err: FunparamError) -> Self {
        CliError::usage(format!("error: {}", err.render()))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// pytest-style progress and summary
    #[default]
    Console,
    /// One JSON object per line
    Json,
    /// libtest spelling of the default
    #[value(hide = true)]
    Pretty,
    /// libtest terse output; with `--list`, names only
    #[value(hide = true)]
    Terse,
}

/// Run a funparam suite (pytest-style)
#[derive(Parser, Debug)]
#[command(name = "funparam")]
#[command(version, about = "Run a funparam test suite", long_about = None)]
pub struct HarnessArgs {
    /// Only run items whose name contains this keyword
    #[arg(value_name = "FILTER", conflicts_with = "keyword")]
    pub filter: Option<String>,

    /// Filter items by keyword expression
    #[arg(short = 'k', value_name = "EXPR")]
    pub keyword: Option<String>,

    /// Match the filter against whole item names
    #[arg(long)]
    pub exact: bool,

    /// Only run items carrying a mark (`-m xfail`), or lacking one (`-m "not slow"`)
    #[arg(short = 'm', value_name = "MARK")]
    pub mark: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Include slow tests
    #[arg(long)]
    pub slow: bool,

    /// Only collect items, don't run them
    #[arg(long)]
    pub collect_only: bool,

    /// List items as `<name>: test`, like `cargo test -- --list`
    #[arg(long)]
    pub list: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    // Accepted for `cargo test -- ...` compatibility.
    #[arg(long, hide = true)]
    pub nocapture: bool,

    #[arg(long, hide = true, value_name = "N")]
    pub test_threads: Option<usize>,

    #[arg(short, long, hide = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl HarnessArgs {
    /// Turn the parsed flags into runner options.
    ///
    /// # Errors
    ///
    /// Returns a usage error when `-m` names an unknown mark.
    pub fn run_options(&self) -> CliResult<RunOptions> {
        let mark = self.mark.as_deref().map(str::parse::<MarkFilter>).transpose()?;
        Ok(RunOptions {
            verbose: self.verbose,
            stop_on_fail: self.stop_on_fail,
            include_slow: self.slow,
            filter: self.keyword.clone().or_else(|| self.filter.clone()),
            exact: self.exact,
            mark,
            collect_only: self.collect_only || self.list,
        })
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Harness entry point for `harness = false` test targets.
///
/// This is the only place where `process::exit` is called.
pub fn main(suite: Suite) {
    // Initialize structured logging with env-based filter, defaulting to warn
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    // Panics are caught per item and shown in the report
    panic::set_hook(Box::new(|_| {}));

    let args = HarnessArgs::parse();

    match execute(&args, &suite) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(e.exit_code.0);
        }
    }
}

/// Run `suite` as described by `args` and return the exit code.
///
/// Failing items are not an `Err`: the reporter has already shown them and the code is
/// [`ExitCode::FAILURE`]. `Err` is reserved for arguments that cannot be applied.
pub fn execute(args: &HarnessArgs, suite: &Suite) -> CliResult<ExitCode> {
    let options = args.run_options()?;
    let mut reporter: Box<dyn TestReporter> = match (args.list, args.format) {
        (true, format) => Box::new(ListReporter::new(format == OutputFormat::Terse)),
        (false, OutputFormat::Json) => Box::new(JsonReporter::new()),
        (false, OutputFormat::Console | OutputFormat::Pretty | OutputFormat::Terse) => {
            Box::new(ConsoleReporter::new(options.verbose))
        }
    };

    let summary = runner::run_suite(suite, &options, reporter.as_mut());

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// Tests
// ============================================================================
