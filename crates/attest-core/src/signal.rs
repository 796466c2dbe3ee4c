//! Fault signals raised inside tests.
//!
//! A test body returns [`Check`], and every way it can go wrong is one
//! variant of [`Signal`]: a failed assertion, an explicit pending or omission,
//! a runtime error, or a request to interrupt the whole run. The runner maps
//! each variant onto the matching result; nothing else escapes a test.
//!
//! [`Signal`] deliberately does not implement [`std::error::Error`]. That
//! keeps the blanket conversion below coherent, so test bodies can apply `?`
//! to any ordinary error and have it recorded as an error fault.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, PanicHookInfo};

use crate::traceback::{self, TracebackEntry};

/// Outcome of a test body, hook, or assertion.
pub type Check<T = ()> = Result<T, Signal>;

/// Everything a test can signal besides plain success.
#[derive(Debug)]
pub enum Signal {
    /// An assertion did not hold.
    Failure(FailureSignal),
    /// The tested behavior is known to be unfinished.
    Pending(SignalDetail),
    /// The test chose not to run to completion.
    Omission(SignalDetail),
    /// Something broke outside the assertions: an error or a panic.
    Error(ErrorSignal),
    /// Stop the run after this test.
    Interrupted,
}

/// Payload of a failed assertion.
#[derive(Debug)]
pub struct FailureSignal {
    pub message: String,
    /// Rendering of the expected value, for assertions that have one.
    pub expected: Option<String>,
    /// Rendering of the actual value, for assertions that have one.
    pub actual: Option<String>,
    pub traceback: Vec<TracebackEntry>,
}

/// Payload of a pending or omission signal.
#[derive(Debug)]
pub struct SignalDetail {
    pub message: String,
    pub traceback: Vec<TracebackEntry>,
}

/// Payload of an error fault.
#[derive(Debug)]
pub struct ErrorSignal {
    /// The error's type, or `"panic"` for unwinds.
    pub type_name: String,
    pub message: String,
    pub traceback: Vec<TracebackEntry>,
}

impl<E: std::error::Error> From<E> for Signal {
    fn from(error: E) -> Self {
        Signal::Error(ErrorSignal {
            type_name: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            traceback: traceback::capture_user_frames(),
        })
    }
}

thread_local! {
    /// Traceback captured by the panic hook, picked up at the unwind catch.
    static LAST_PANIC: RefCell<Option<Vec<TracebackEntry>>> = const { RefCell::new(None) };
}

type Hook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Temporarily replaces the panic hook with one that records a trimmed
/// traceback instead of printing to stderr. Dropping the guard restores the
/// previous hook.
pub(crate) struct PanicGuard {
    previous: Option<Hook>,
}

impl PanicGuard {
    pub(crate) fn install() -> Self {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(|info| {
            let entries = match info.location() {
                Some(location) => traceback::capture_at(location),
                None => traceback::capture_user_frames(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(entries));
        }));
        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            panic::set_hook(previous);
        }
    }
}

/// Turns a caught unwind payload into an error signal, consuming the
/// traceback the hook stashed away.
pub(crate) fn signal_from_panic(payload: Box<dyn Any + Send>) -> Signal {
    let message = if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "Box<dyn Any>".to_string()
    };
    let traceback = LAST_PANIC.with(|slot| slot.borrow_mut().take()).unwrap_or_default();
    Signal::Error(ErrorSignal {
        type_name: "panic".to_string(),
        message,
        traceback,
    })
}
