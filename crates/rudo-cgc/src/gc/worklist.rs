//! The mark work list.
//!
//! Marking follows references through an explicit LIFO stack of blocks
//! still to be scanned instead of recursing, so a long chain of blocks
//! costs heap memory rather than call-stack depth.

/// A tracked block whose payload has not been scanned yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingScan {
    /// Start of the payload.
    pub addr: usize,
    /// Payload size in bytes.
    pub size: usize,
}

/// LIFO stack of blocks awaiting a scan.
#[derive(Debug, Default)]
pub struct MarkStack {
    items: Vec<PendingScan>,
    high_water: usize,
}

impl MarkStack {
    /// Create an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            high_water: 0,
        }
    }

    /// Queue a block for scanning.
    pub fn push(&mut self, addr: usize, size: usize) {
        self.items.push(PendingScan { addr, size });
        self.high_water = self.high_water.max(self.items.len());
    }

    /// Take the most recently queued block.
    pub fn pop(&mut self) -> Option<PendingScan> {
        self.items.pop()
    }

    /// Number of queued blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The largest number of blocks queued at once.
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.high_water
    }
}
