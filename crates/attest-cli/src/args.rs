//! Command-line options of an attest test binary.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use attest_config::{ColorMode, RunnerConfig, Verbosity};
use attest_core::{PatternError, SuiteFilter};

/// Runs the tests registered by this binary.
///
/// Options layer over the `[runner]` table of `attest.toml` and the
/// ATTEST_* environment variables; a flag given here wins.
///
/// EXAMPLES:
///     tests -n addition                Run one test by exact name
///     tests -n /parse/ -v verbose      Regex filter, one line per test
///     tests -t MathCase                Run one test case
///     tests --xml-report report.xml    Also write an XML report
///     tests --priority                 Skip tests that passed last run
///
/// ENVIRONMENT VARIABLES:
///     ATTEST_PRIORITY    Set to '1' to enable priority mode
///     ATTEST_RESULT_DIR  Where priority pass markers are kept
///     NO_COLOR           Set to disable colored output
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Run only tests with this name (exact, or /regex/); repeatable
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub names: Vec<String>,

    /// Run only test cases with this name (exact, or /regex/); repeatable
    #[arg(short = 't', long = "test-case", value_name = "CASE")]
    pub test_cases: Vec<String>,

    /// Write an XML report of every result to FILE
    #[arg(long, value_name = "FILE")]
    pub xml_report: Option<PathBuf>,

    /// Skip tests that passed last run, sampled by declared priority
    #[arg(long)]
    pub priority: bool,

    /// Run every test regardless of previous passes
    #[arg(long, conflicts_with = "priority")]
    pub no_priority: bool,

    /// Where priority mode keeps its pass markers
    #[arg(long, value_name = "DIR")]
    pub result_dir: Option<PathBuf>,

    /// When to color the output: always, never, or auto
    #[arg(short = 'c', long, value_name = "WHEN", value_parser = ColorMode::from_str)]
    pub color: Option<ColorMode>,

    /// How much to print: silent, normal, or verbose
    #[arg(
        short = 'v',
        long = "verbose",
        value_name = "LEVEL",
        value_parser = Verbosity::from_str
    )]
    pub verbosity: Option<Verbosity>,
}

impl Args {
    /// The name filter these options describe.
    pub fn filter(&self) -> Result<SuiteFilter, PatternError> {
        SuiteFilter::new(&self.names, &self.test_cases)
    }

    /// The settings given on the command line, ready to merge over the
    /// loaded configuration.
    pub fn overrides(&self) -> RunnerConfig {
        RunnerConfig {
            verbosity: self.verbosity,
            color: self.color,
            priority: self.priority_override(),
            result_dir: self.result_dir.clone(),
            xml_report: self.xml_report.clone(),
        }
    }

    fn priority_override(&self) -> Option<bool> {
        if self.priority {
            Some(true)
        } else if self.no_priority {
            Some(false)
        } else {
            None
        }
    }
}
