//! Assertions available inside a test body.
//!
//! Every assertion returns [`Check`], so `?` either continues the test or
//! carries the fault out to the runner. Passing assertions count toward the
//! run's assertion tally; failing ones capture the call site in their
//! traceback. The explicit signals live here too: [`fail`], [`pend`],
//! [`omit`], and [`notify`].
//!
//! [`fail`]: TestContext::fail
//! [`pend`]: TestContext::pend
//! [`omit`]: TestContext::omit
//! [`notify`]: TestContext::notify

use std::fmt::Debug;
use std::fs::File;
use std::panic::Location;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::case::TestContext;
use crate::pretty;
use crate::signal::{Check, FailureSignal, Signal, SignalDetail};
use crate::traceback;

impl TestContext<'_> {
    /// Fails unconditionally with the given message.
    #[track_caller]
    pub fn fail(&self, message: impl Into<String>) -> Check {
        Err(failure(Location::caller(), message.into()))
    }

    /// Marks the test pending: the behavior under test is not finished yet.
    #[track_caller]
    pub fn pend(&self, message: impl Into<String>) -> Check {
        Err(Signal::Pending(SignalDetail {
            message: message.into(),
            traceback: traceback::capture_at(Location::caller()),
        }))
    }

    /// Omits the test, e.g. when a precondition of the environment is not
    /// met. Not counted as a problem.
    #[track_caller]
    pub fn omit(&self, message: impl Into<String>) -> Check {
        Err(Signal::Omission(SignalDetail {
            message: message.into(),
            traceback: traceback::capture_at(Location::caller()),
        }))
    }

    /// Records a notification and carries on with the test.
    #[track_caller]
    pub fn notify(&mut self, message: impl Into<String>) {
        let traceback = traceback::capture_at(Location::caller());
        self.record_notification(message.into(), traceback);
    }

    #[track_caller]
    pub fn assert_true(&mut self, actual: bool) -> Check {
        if actual {
            self.passed();
            Ok(())
        } else {
            Err(failure(
                Location::caller(),
                format!("expected: <{}> is a true value", pretty::format(&actual)),
            ))
        }
    }

    #[track_caller]
    pub fn assert_false(&mut self, actual: bool) -> Check {
        if actual {
            Err(failure(
                Location::caller(),
                format!("expected: <{}> is a false value", pretty::format(&actual)),
            ))
        } else {
            self.passed();
            Ok(())
        }
    }

    #[track_caller]
    pub fn assert_none<T: Debug>(&mut self, actual: &Option<T>) -> Check {
        if actual.is_none() {
            self.passed();
            Ok(())
        } else {
            Err(failure(
                Location::caller(),
                format!("expected: <{}> is None", pretty::format(actual)),
            ))
        }
    }

    /// Asserts that `actual` holds a value, and hands that value back.
    #[track_caller]
    pub fn assert_some<'v, T: Debug>(&mut self, actual: &'v Option<T>) -> Check<&'v T> {
        match actual {
            Some(value) => {
                self.passed();
                Ok(value)
            }
            None => Err(failure(Location::caller(), "expected: not None".to_string())),
        }
    }

    /// Asserts that two values compare equal.
    ///
    /// The failure message quotes both renderings and, when both span
    /// multiple lines, appends a unified diff between them.
    #[track_caller]
    pub fn assert_equal<E, A>(&mut self, expected: &E, actual: &A) -> Check
    where
        E: Debug + PartialEq<A> + ?Sized,
        A: Debug + ?Sized,
    {
        if expected == actual {
            self.passed();
            return Ok(());
        }
        let expected_expanded = pretty::format_expanded(expected);
        let actual_expanded = pretty::format_expanded(actual);
        let message = format!(
            "expected: <{}>\n but was: <{}>",
            pretty::format(expected),
            pretty::format(actual)
        );
        let message = pretty::append_diff(message, &expected_expanded, &actual_expanded);
        Err(failure_with_values(
            Location::caller(),
            message,
            expected_expanded,
            actual_expanded,
        ))
    }

    /// Asserts that two values compare unequal.
    #[track_caller]
    pub fn assert_not_equal<E, A>(&mut self, not_expected: &E, actual: &A) -> Check
    where
        E: Debug + PartialEq<A> + ?Sized,
        A: Debug + ?Sized,
    {
        if not_expected != actual {
            self.passed();
            return Ok(());
        }
        let message = format!(
            "not expected: <{}>\n     but was: <{}>",
            pretty::format(not_expected),
            pretty::format(actual)
        );
        // Equal values can still render differently; the diff surfaces that.
        let message = pretty::append_diff(
            message,
            &pretty::format_expanded(not_expected),
            &pretty::format_expanded(actual),
        );
        Err(failure(Location::caller(), message))
    }

    /// Asserts that `actual` lies within `expected ± delta`, bounds included.
    #[track_caller]
    pub fn assert_in_delta(&mut self, expected: f64, actual: f64, delta: f64) -> Check {
        let lower = expected - delta;
        let upper = expected + delta;
        if (lower..=upper).contains(&actual) {
            self.passed();
            Ok(())
        } else {
            Err(failure(
                Location::caller(),
                format!(
                    "expected: <{}+-{} [{}, {}]>\n but was: <{}>",
                    pretty::format(&expected),
                    pretty::format(&delta),
                    pretty::format(&lower),
                    pretty::format(&upper),
                    pretty::format(&actual)
                ),
            ))
        }
    }

    /// Asserts that `pattern` matches at the beginning of `target`.
    ///
    /// An invalid pattern is reported as an error fault, not a failure.
    #[track_caller]
    pub fn assert_match(&mut self, pattern: &str, target: &str) -> Check {
        let re = anchored(pattern)?;
        if re.is_match(target) {
            self.passed();
            Ok(())
        } else {
            let target = pretty::format(target);
            Err(failure(
                Location::caller(),
                pattern_message(
                    format!("expected: /{pattern}/ matches the beginning of <{target}>"),
                    pattern,
                    &target,
                ),
            ))
        }
    }

    /// Asserts that `pattern` does not match at the beginning of `target`.
    #[track_caller]
    pub fn assert_not_match(&mut self, pattern: &str, target: &str) -> Check {
        let re = anchored(pattern)?;
        if re.is_match(target) {
            let target = pretty::format(target);
            Err(failure(
                Location::caller(),
                pattern_message(
                    format!("expected: /{pattern}/ doesn't match the beginning of <{target}>"),
                    pattern,
                    &target,
                ),
            ))
        } else {
            self.passed();
            Ok(())
        }
    }

    /// Asserts that `pattern` is found somewhere in `target`.
    #[track_caller]
    pub fn assert_search(&mut self, pattern: &str, target: &str) -> Check {
        let re = Regex::new(pattern)?;
        if re.is_match(target) {
            self.passed();
            Ok(())
        } else {
            let target = pretty::format(target);
            Err(failure(
                Location::caller(),
                pattern_message(
                    format!("expected: /{pattern}/ is found in <{target}>"),
                    pattern,
                    &target,
                ),
            ))
        }
    }

    /// Asserts that `pattern` is found nowhere in `target`.
    #[track_caller]
    pub fn assert_not_found(&mut self, pattern: &str, target: &str) -> Check {
        let re = Regex::new(pattern)?;
        if re.is_match(target) {
            let target = pretty::format(target);
            Err(failure(
                Location::caller(),
                pattern_message(
                    format!("expected: /{pattern}/ isn't found in <{target}>"),
                    pattern,
                    &target,
                ),
            ))
        } else {
            self.passed();
            Ok(())
        }
    }

    /// Asserts that `f` returns the expected error, and hands that error
    /// back for further inspection.
    #[track_caller]
    pub fn assert_raise<T, E>(&mut self, expected: &E, f: impl FnOnce() -> Result<T, E>) -> Check<E>
    where
        E: Debug + PartialEq,
    {
        match f() {
            Ok(_) => Err(failure(
                Location::caller(),
                format!(
                    "expected: <{}> is raised\n but was: nothing raised",
                    pretty::format(expected)
                ),
            )),
            Err(actual) => {
                self.assert_equal(expected, &actual)?;
                Ok(actual)
            }
        }
    }

    /// Asserts that `f` succeeds, and hands back its value.
    #[track_caller]
    pub fn assert_nothing_raised<T, E: Debug>(
        &mut self,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Check<T> {
        match f() {
            Ok(value) => {
                self.passed();
                Ok(value)
            }
            Err(error) => Err(failure(
                Location::caller(),
                format!(
                    "expected: nothing raised\n but was: <{}> is raised",
                    pretty::format(&error)
                ),
            )),
        }
    }

    /// Runs `command` to completion and asserts a zero exit status, handing
    /// back the captured output.
    #[track_caller]
    pub fn assert_run_command(&mut self, command: &mut Command) -> Check<Output> {
        let location = Location::caller();
        match command.output() {
            Err(error) => Err(failure(
                location,
                format!("expected: <{command:?}> runs successfully\n but was: <{error}> is raised"),
            )),
            Ok(output) if output.status.success() => {
                self.passed();
                Ok(output)
            }
            Ok(output) => {
                let outcome = match output.status.code() {
                    Some(code) => format!("<{code}> is returned as exit code"),
                    None => "the command is terminated by a signal".to_string(),
                };
                Err(failure(
                    location,
                    format!("expected: <{command:?}> finishes successfully\n but was: {outcome}"),
                ))
            }
        }
    }

    #[track_caller]
    pub fn assert_exists(&mut self, path: impl AsRef<Path>) -> Check {
        let path = path.as_ref();
        if path.exists() {
            self.passed();
            Ok(())
        } else {
            Err(failure(
                Location::caller(),
                format!("expected: <{}> exists", path.display()),
            ))
        }
    }

    #[track_caller]
    pub fn assert_not_exists(&mut self, path: impl AsRef<Path>) -> Check {
        let path = path.as_ref();
        if path.exists() {
            Err(failure(
                Location::caller(),
                format!("expected: <{}> doesn't exist", path.display()),
            ))
        } else {
            self.passed();
            Ok(())
        }
    }

    /// Asserts that `path` can be opened for reading, handing back the file.
    #[track_caller]
    pub fn assert_open_file(&mut self, path: impl AsRef<Path>) -> Check<File> {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => {
                self.passed();
                Ok(file)
            }
            Err(error) => Err(failure(
                Location::caller(),
                format!(
                    "expected: open(<{}>) succeeds\n but was: <{error}> is raised",
                    path.display()
                ),
            )),
        }
    }

    /// Retries `f` until it stops failing or `timeout` is used up, waiting
    /// `interval` between attempts.
    ///
    /// Only assertion failures are retried; any other signal propagates at
    /// once. The terminal failure message carries the last attempt's.
    #[track_caller]
    pub fn assert_try<T>(
        &mut self,
        timeout: Duration,
        interval: Duration,
        mut f: impl FnMut(&mut Self) -> Check<T>,
    ) -> Check<T> {
        let location = Location::caller();
        let mut rest = timeout;
        loop {
            let before = Instant::now();
            match f(self) {
                Ok(value) => {
                    self.passed();
                    return Ok(value);
                }
                Err(Signal::Failure(last)) => {
                    if rest.is_zero() {
                        return Err(failure(
                            location,
                            format!(
                                "expected: the retried block succeeds\n timeout: <{timeout:?}>\ninterval: <{interval:?}>\n but was:\n{}",
                                last.message
                            ),
                        ));
                    }
                    let runtime = before.elapsed();
                    rest = rest.saturating_sub(runtime.max(interval));
                    if let Some(pause) = interval.checked_sub(runtime) {
                        thread::sleep(pause);
                    }
                }
                Err(other) => return Err(other),
            }
        }
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

/// Failure messages for the pattern assertions repeat the pattern and the
/// formatted target on labelled lines, colons aligned.
fn pattern_message(expectation: String, pattern: &str, target: &str) -> String {
    format!("{expectation}\n pattern: </{pattern}/>\n  target: <{target}>")
}

fn failure(location: &Location<'_>, message: String) -> Signal {
    Signal::Failure(FailureSignal {
        message,
        expected: None,
        actual: None,
        traceback: traceback::capture_at(location),
    })
}

fn failure_with_values(
    location: &Location<'_>,
    message: String,
    expected: String,
    actual: String,
) -> Signal {
    Signal::Failure(FailureSignal {
        message,
        expected: Some(expected),
        actual: Some(actual),
        traceback: traceback::capture_at(location),
    })
}
