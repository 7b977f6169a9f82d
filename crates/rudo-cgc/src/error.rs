//! Allocation failure reporting.

use std::fmt;

/// The only failure the collector ever reports.
///
/// Whenever one of these is returned, the collector has already rolled its
/// state back to the last consistent configuration: a failed rehash keeps the
/// old table, and a failed registration has released the block it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The underlying heap could not provide a block of `requested` bytes.
    OutOfMemory {
        /// Size of the refused request in bytes.
        requested: usize,
    },
    /// The registry could not grow to `slots` slots, either because the slot
    /// array could not be allocated or because it exceeds
    /// [`GcConfig::max_slots`](crate::GcConfig::max_slots).
    TableExhausted {
        /// Slot count of the refused table.
        slots: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "heap exhausted while allocating {requested} bytes")
            }
            Self::TableExhausted { slots } => {
                write!(f, "allocation registry cannot grow to {slots} slots")
            }
        }
    }
}

impl std::error::Error for AllocError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AllocError::OutOfMemory { requested: 64 };
        assert_eq!(err.to_string(), "heap exhausted while allocating 64 bytes");

        let err = AllocError::TableExhausted { slots: 11 };
        assert_eq!(err.to_string(), "allocation registry cannot grow to 11 slots");
    }
}
