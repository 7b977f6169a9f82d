//! Mark-sweep collection.
//!
//! - [`marker`]: conservative reachability from the root set
//! - [`sweep`]: reclamation of everything the marker did not reach
//! - [`worklist`]: the explicit stack the marker traverses with

pub mod marker;
pub mod sweep;
pub mod worklist;

pub use marker::{mark, MarkStats, Marker};
pub use sweep::{next_threshold, sweep, SweepStats};

/// Inclusive address range covering every tracked block.
///
/// The window only ever grows. Candidates outside it are rejected before
/// any hash probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWindow {
    min: usize,
    max: usize,
}

impl AddressWindow {
    /// An empty window that rejects every address.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min: usize::MAX,
            max: 0,
        }
    }

    /// Grow the window to cover `[addr, addr + size]`.
    pub fn widen(&mut self, addr: usize, size: usize) {
        self.min = self.min.min(addr);
        self.max = self.max.max(addr.saturating_add(size));
    }

    /// Whether `candidate` could be a tracked address.
    #[inline]
    #[must_use]
    pub const fn contains(&self, candidate: usize) -> bool {
        candidate >= self.min && candidate <= self.max
    }

    /// Lowest tracked address seen, or `None` before the first registration.
    #[must_use]
    pub const fn min(&self) -> Option<usize> {
        if self.min > self.max {
            None
        } else {
            Some(self.min)
        }
    }

    /// One past the highest tracked byte seen.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }
}

impl Default for AddressWindow {
    fn default() -> Self {
        Self::new()
    }
}
