//! Command-line driver and reporters for the attest test framework.
//!
//! A test binary registers its suite and hands it to [`run`]:
//!
//! ```no_run
//! use std::process::ExitCode;
//!
//! use attest_core::SuiteBuilder;
//!
//! fn main() -> ExitCode {
//!     let mut builder = SuiteBuilder::new();
//!     {
//!         let case = builder.case("MathCase");
//!         case.test("addition", |ctx| ctx.assert_equal(&4, &(2 + 2)));
//!     }
//!     attest_cli::run(builder)
//! }
//! ```
//!
//! [`run`] parses the command line, layers it over `attest.toml` and the
//! `ATTEST_*` environment variables, executes the suite, and reports to the
//! terminal. With `--xml-report` the results are mirrored into a file
//! afterwards. Finer control, such as a custom output sink or a prebuilt
//! configuration, goes through [`Tester`].

pub mod args;
pub mod color;
pub mod console;
pub mod tester;
pub mod xml;

pub use args::Args;
pub use color::Tone;
pub use console::ConsoleReporter;
pub use tester::{run, Tester};
