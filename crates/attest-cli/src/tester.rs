//! The driver: assembles configuration, attaches reporters, runs the suite,
//! and turns the outcome into an exit status.

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use attest_config::RunnerConfig;
use attest_core::{default_result_dir, RunContext, SuiteBuilder, SuiteFilter};

use crate::args::Args;
use crate::color;
use crate::console::ConsoleReporter;
use crate::xml;

/// One configured run of a test binary.
pub struct Tester {
    config: RunnerConfig,
    filter: SuiteFilter,
}

impl Tester {
    pub fn new(config: RunnerConfig, filter: SuiteFilter) -> Self {
        Self { config, filter }
    }

    /// Reads the command line and layers it over `attest.toml` and the
    /// ATTEST_* environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self> {
        let filter = args.filter()?;
        let mut config = attest_config::load().context("loading attest.toml")?;
        config.merge(args.overrides());
        Ok(Self::new(config, filter))
    }

    /// Runs the suite, reporting to standard output.
    pub fn run(self, builder: SuiteBuilder) -> Result<bool> {
        self.run_with_output(builder, io::stdout())
    }

    /// Runs the suite, reporting to `out`, and says whether it succeeded.
    pub fn run_with_output<W: Write + 'static>(
        self,
        builder: SuiteBuilder,
        out: W,
    ) -> Result<bool> {
        let verbosity = self.config.verbosity.unwrap_or_default();
        let use_color = color::resolve(self.config.color.unwrap_or_default());
        colored::control::set_override(use_color);

        let suite = builder.build_filtered(&self.filter);
        let mut ctx = RunContext::new();
        if self.config.priority.unwrap_or(false) {
            let result_dir = self
                .config
                .result_dir
                .clone()
                .unwrap_or_else(default_result_dir);
            ctx.enable_priority(result_dir);
        }
        ctx.add_listener(ConsoleReporter::new(out, verbosity, use_color));
        suite.run(&mut ctx);

        if let Some(path) = &self.config.xml_report {
            fs::write(path, xml::render(ctx.results()))
                .with_context(|| format!("writing XML report to {}", path.display()))?;
        }
        Ok(ctx.succeeded())
    }
}

/// Parses the command line, runs the registered suite, and maps the outcome
/// to an exit code. The conventional body of a test binary's `main`.
pub fn run(builder: SuiteBuilder) -> ExitCode {
    match Tester::from_env().and_then(|tester| tester.run(builder)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("attest: {error:#}");
            ExitCode::FAILURE
        }
    }
}
