//! Recorded outcomes: one terminal result per test, plus notifications.

use std::sync::Arc;
use std::time::Duration;

use crate::case::TestMeta;
use crate::traceback::TracebackEntry;

/// Classification of a recorded result, with its message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultKind {
    Success,
    Notification {
        message: String,
    },
    Omission {
        message: String,
    },
    Pending {
        message: String,
    },
    Failure {
        message: String,
        expected: Option<String>,
        actual: Option<String>,
    },
    Error {
        type_name: String,
        message: String,
    },
}

impl ResultKind {
    /// Single-character progress mark.
    pub fn symbol(&self) -> &'static str {
        match self {
            ResultKind::Success => ".",
            ResultKind::Notification { .. } => "N",
            ResultKind::Omission { .. } => "O",
            ResultKind::Pending { .. } => "P",
            ResultKind::Failure { .. } => "F",
            ResultKind::Error { .. } => "E",
        }
    }

    /// Lowercase kind name, as written into reports.
    pub fn name(&self) -> &'static str {
        match self {
            ResultKind::Success => "success",
            ResultKind::Notification { .. } => "notification",
            ResultKind::Omission { .. } => "omission",
            ResultKind::Pending { .. } => "pending",
            ResultKind::Failure { .. } => "failure",
            ResultKind::Error { .. } => "error",
        }
    }

    /// Capitalized kind name, as used in fault titles.
    pub fn label(&self) -> &'static str {
        match self {
            ResultKind::Success => "Success",
            ResultKind::Notification { .. } => "Notification",
            ResultKind::Omission { .. } => "Omission",
            ResultKind::Pending { .. } => "Pending",
            ResultKind::Failure { .. } => "Failure",
            ResultKind::Error { .. } => "Error",
        }
    }

    /// Position in the severity order, lowest first. Success has none.
    pub fn severity(&self) -> Option<u8> {
        match self {
            ResultKind::Success => None,
            ResultKind::Notification { .. } => Some(0),
            ResultKind::Omission { .. } => Some(1),
            ResultKind::Pending { .. } => Some(2),
            ResultKind::Failure { .. } => Some(3),
            ResultKind::Error { .. } => Some(4),
        }
    }

    /// Whether this kind makes the run as a whole unsuccessful. Pending and
    /// omission are deliberate non-answers, so they do not fail the build.
    pub fn is_critical(&self) -> bool {
        matches!(self, ResultKind::Failure { .. } | ResultKind::Error { .. })
    }

    /// Anything recorded with a message, i.e. everything but plain success.
    pub fn is_fault(&self) -> bool {
        !matches!(self, ResultKind::Success)
    }
}

/// One recorded result, in the order events happened during the run.
///
/// A test contributes exactly one terminal result; notifications raised along
/// the way are recorded as additional entries.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub test: Arc<TestMeta>,
    pub kind: ResultKind,
    pub traceback: Vec<TracebackEntry>,
    pub elapsed: Duration,
}

impl TestResult {
    /// One-line heading for the fault listing.
    pub fn title(&self) -> String {
        let full_name = self.test.full_name();
        match &self.kind {
            ResultKind::Success => format!("Success: {full_name}"),
            ResultKind::Notification { message }
            | ResultKind::Omission { message }
            | ResultKind::Pending { message } => {
                format!("{}: {full_name}: {message}", self.kind.label())
            }
            ResultKind::Failure { .. } => {
                match self.traceback.first().and_then(|entry| entry.source.as_deref()) {
                    Some(source) => format!("Failure: {full_name}: {source}"),
                    None => format!("Failure: {full_name}"),
                }
            }
            ResultKind::Error { .. } => format!("Error: {full_name}"),
        }
    }

    /// Body of the fault listing. Kinds whose message already sits in the
    /// title have nothing further to say here.
    pub fn detail(&self) -> String {
        match &self.kind {
            ResultKind::Failure { message, .. } => message.clone(),
            ResultKind::Error { type_name, message } => format!("{type_name}: {message}"),
            _ => String::new(),
        }
    }
}
