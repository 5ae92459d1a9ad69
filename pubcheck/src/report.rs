//! The report sink shared by every checker and validator of one run.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::messages::{Message, MessageId, MessageLocation, Severity};

/// Counters of one run. Each counted message increments exactly one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub fatal: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl ReportCounts {
    /// No fatal errors, errors or warnings.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.fatal == 0 && self.errors == 0 && self.warnings == 0
    }

    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Fatal => self.fatal += 1,
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info | Severity::Usage => {}
        }
    }
}

/// Sink for validation findings.
///
/// Implementations are shared across concurrently running checks, so they
/// must be `Send + Sync` and their counters must never decrease during a run.
pub trait Report: Send + Sync {
    /// Record a message; `args` fill the message template.
    fn message(&self, id: MessageId, location: MessageLocation, args: &[&str]);

    fn fatal_error_count(&self) -> usize;

    fn error_count(&self) -> usize;

    fn warning_count(&self) -> usize;

    /// Read all three counters.
    ///
    /// The default reads them one at a time; implementations that can take a
    /// consistent snapshot should override it.
    fn counts(&self) -> ReportCounts {
        ReportCounts {
            fatal: self.fatal_error_count(),
            errors: self.error_count(),
            warnings: self.warning_count(),
        }
    }
}

#[derive(Debug, Default)]
struct ReportState {
    counts: ReportCounts,
    messages: Vec<Message>,
}

/// In-memory report. Counters and the message log sit behind one mutex, so
/// increments and [`Report::counts`] snapshots never interleave.
#[derive(Debug, Default)]
pub struct MemoryReport {
    state: Mutex<ReportState>,
}

impl MemoryReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ReportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of every message recorded so far, in arrival order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// Number of messages recorded with `id`.
    #[must_use]
    pub fn count_of(&self, id: MessageId) -> usize {
        self.state().messages.iter().filter(|m| m.id == id).count()
    }

    /// A serializable snapshot of the whole report.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let state = self.state();
        ReportSummary {
            ok: state.counts.is_clean(),
            counts: state.counts,
            messages: state.messages.clone(),
        }
    }
}

impl Report for MemoryReport {
    fn message(&self, id: MessageId, location: MessageLocation, args: &[&str]) {
        let severity = id.default_severity();
        let text = id.format(args);
        let code = id.code();
        let level = severity.as_str();
        match severity {
            Severity::Fatal | Severity::Error => {
                tracing::error!(code, severity = level, location = %location, "{text}");
            }
            Severity::Warning => {
                tracing::warn!(code, severity = level, location = %location, "{text}");
            }
            Severity::Info | Severity::Usage => {
                tracing::info!(code, severity = level, location = %location, "{text}");
            }
        }

        let mut state = self.state();
        state.counts.record(severity);
        state.messages.push(Message {
            id,
            severity,
            location,
            text,
        });
    }

    fn fatal_error_count(&self) -> usize {
        self.state().counts.fatal
    }

    fn error_count(&self) -> usize {
        self.state().counts.errors
    }

    fn warning_count(&self) -> usize {
        self.state().counts.warnings
    }

    fn counts(&self) -> ReportCounts {
        self.state().counts
    }
}

/// Result of a validation run, ready for output.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct ReportSummary {
    /// No fatal errors, errors or warnings were reported.
    pub ok: bool,
    pub counts: ReportCounts,
    pub messages: Vec<Message>,
}
