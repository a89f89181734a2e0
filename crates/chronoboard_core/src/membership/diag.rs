//! Injected diagnostic capability for the membership tracker.
//!
//! # Responsibility
//! - Keep tracker observability side-effect-isolated: the core records
//!   structured diagnostics, sinks decide where they go.
//!
//! # Invariants
//! - Diagnostics are non-authoritative; dropping them never changes
//!   tracker behavior.

use crate::model::event::EventId;
use crate::model::timeline::TimelineId;
use log::info;
use std::cell::RefCell;

/// One structured tracker diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Stable event name, e.g. `membership_plan`.
    pub event: &'static str,
    pub timeline_id: Option<TimelineId>,
    pub event_id: Option<EventId>,
    /// Free-form key=value detail.
    pub detail: String,
}

/// Capability receiving tracker diagnostics.
pub trait DiagnosticSink {
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade as key=value lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, diagnostic: Diagnostic) {
        info!(
            "event={} module=membership timeline_id={} event_id={} {}",
            diagnostic.event,
            diagnostic
                .timeline_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            diagnostic
                .event_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            diagnostic.detail
        );
    }
}

/// Drops all diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _diagnostic: Diagnostic) {}
}

/// Buffers diagnostics in memory for assertions and embedders.
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: RefCell<Vec<Diagnostic>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    /// Counts records with the given event name.
    pub fn count(&self, event: &str) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.event == event)
            .count()
    }
}

impl DiagnosticSink for CaptureSink {
    fn record(&self, diagnostic: Diagnostic) {
        self.records.borrow_mut().push(diagnostic);
    }
}
