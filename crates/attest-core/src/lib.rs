//! Test execution engine for the attest framework.
//!
//! Tests are registered explicitly, grouped into cases with shared setup and
//! teardown, and run against a [`RunContext`] that counts, records, and
//! notifies listeners as the run unfolds. Each test ends in exactly one
//! result: success, or one of the fault kinds ordered by severity from
//! notification up to error.
//!
//! # Example
//!
//! ```
//! use attest_core::{RunContext, SuiteBuilder};
//!
//! let mut builder = SuiteBuilder::new();
//! {
//!     let case = builder.case("MathCase");
//!     case.test("addition", |ctx| ctx.assert_equal(&4, &(2 + 2)));
//!     case.test("subtraction", |ctx| ctx.assert_equal(&0, &(2 - 2)));
//! }
//!
//! let suite = builder.build();
//! let mut ctx = RunContext::new();
//! suite.run(&mut ctx);
//!
//! assert!(ctx.succeeded());
//! assert_eq!(ctx.n_tests(), 2);
//! assert_eq!(ctx.n_assertions(), 2);
//! ```

mod assertions;
pub mod case;
pub mod context;
pub mod metadata;
pub mod pretty;
pub mod priority;
pub mod registry;
pub mod result;
pub mod signal;
pub mod suite;
pub mod traceback;

pub use case::{CaseMeta, TestCase, TestContext, TestMeta};
pub use context::{Listener, RunContext};
pub use metadata::{Metadata, MetadataValue};
pub use priority::{default_result_dir, Priority};
pub use registry::{CaseBuilder, PatternError, SuiteBuilder, SuiteFilter, TestDef};
pub use result::{ResultKind, TestResult};
pub use signal::{Check, ErrorSignal, FailureSignal, Signal, SignalDetail};
pub use suite::TestSuite;
pub use traceback::TracebackEntry;

/// Version of the attest-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
