//! The conservative root set.
//!
//! Roots are never registered one by one. Instead the collector treats every
//! word of two memory ranges as a potential reference: the host's static root
//! region, and the live part of the call stack up to a bottom address
//! captured when the collector starts.

use crate::scan::{Words, WORD};

/// Where the collector looks for roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootSet {
    stack_bottom: usize,
    static_low: usize,
    static_high: usize,
}

impl RootSet {
    /// Roots in the stack above `stack_bottom` and in `[static_low, static_high]`.
    ///
    /// Both static bounds are inclusive: `static_high` is the address of the
    /// last root word, not one past it. A null `stack_bottom` disables stack
    /// scanning. A null `static_low`, or `static_high` below it, disables the
    /// static region.
    #[must_use]
    pub fn new(stack_bottom: *const u8, static_low: *const u8, static_high: *const u8) -> Self {
        Self {
            stack_bottom: stack_bottom.expose_provenance(),
            static_low: static_low.expose_provenance(),
            static_high: static_high.expose_provenance(),
        }
    }

    /// A root set that never yields anything.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            stack_bottom: 0,
            static_low: 0,
            static_high: 0,
        }
    }

    /// The stack bottom, or `None` if stack scanning is disabled.
    #[must_use]
    pub const fn stack_bottom(&self) -> Option<usize> {
        if self.stack_bottom == 0 {
            None
        } else {
            Some(self.stack_bottom)
        }
    }

    /// Whether a static region is configured.
    #[must_use]
    pub const fn has_static_region(&self) -> bool {
        self.static_low != 0 && self.static_low <= self.static_high
    }

    /// Inclusive bounds of the static region.
    #[must_use]
    pub const fn static_region(&self) -> (usize, usize) {
        (self.static_low, self.static_high)
    }

    /// Candidate addresses from the static region.
    ///
    /// # Safety
    ///
    /// The static region passed to [`RootSet::new`] must still be readable.
    #[must_use]
    pub unsafe fn static_words(&self) -> Words {
        if !self.has_static_region() {
            return Words::empty();
        }
        // SAFETY: forwarded from the caller's contract; `static_high` is the
        // start of the last word and therefore readable.
        unsafe { Words::new(self.static_low, self.static_high.saturating_add(WORD)) }
    }
}

impl Default for RootSet {
    fn default() -> Self {
        Self::none()
    }
}
