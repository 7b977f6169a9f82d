//! Spans for the `tracing` feature.
//!
//! Each collection runs inside a `gc_collect` span and teardown inside a
//! `gc_teardown` span. Phase events are emitted where the phases run.

pub mod internal {
    use tracing::{span, Level};

    use crate::metrics::CollectionTrigger;

    /// Identifier of one collection, unique within its collector.
    ///
    /// Starts at 1 and increases with every collection, so all events of a
    /// single run can be correlated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GcId(pub u64);

    /// Create a span for an entire collection.
    pub fn trace_gc_collection(trigger: CollectionTrigger, gc_id: GcId) -> span::EnteredSpan {
        span!(
            Level::DEBUG,
            "gc_collect",
            trigger = ?trigger,
            gc_id = gc_id.0
        )
        .entered()
    }

    /// Create a span for collector teardown.
    pub fn trace_teardown(tracked: usize) -> span::EnteredSpan {
        span!(Level::DEBUG, "gc_teardown", tracked).entered()
    }
}

pub use internal::GcId;
