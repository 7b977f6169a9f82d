//! The mark phase.

use crate::gc::worklist::MarkStack;
use crate::gc::AddressWindow;
use crate::registry::Registry;
use crate::roots::RootSet;
use crate::scan::Words;
use crate::stack;

/// Marks tracked blocks reachable from the candidates it is fed.
pub struct Marker<'a> {
    registry: &'a mut Registry,
    window: AddressWindow,
    worklist: MarkStack,
    objects_marked: usize,
}

impl<'a> Marker<'a> {
    /// Create a marker over `registry` accepting candidates inside `window`.
    pub fn new(registry: &'a mut Registry, window: AddressWindow) -> Self {
        Self {
            registry,
            window,
            worklist: MarkStack::new(),
            objects_marked: 0,
        }
    }

    /// Number of blocks this marker has marked so far.
    #[must_use]
    pub const fn objects_marked(&self) -> usize {
        self.objects_marked
    }

    /// Largest number of blocks that were waiting to be scanned at once.
    #[must_use]
    pub const fn worklist_high_water(&self) -> usize {
        self.worklist.high_water()
    }

    /// Mark the block starting at `candidate`, if there is one.
    ///
    /// Values that are not tracked addresses are ignored. Blocks already
    /// marked in this pass are not queued again, which is what terminates
    /// cyclic graphs. Leaf blocks are marked but never scanned.
    #[inline]
    pub fn mark_ptr(&mut self, candidate: usize) {
        if !self.window.contains(candidate) {
            return;
        }
        let Some(block) = self.registry.get_mut(candidate) else {
            return;
        };
        if block.is_marked() {
            return;
        }

        block.set_marked(true);
        self.objects_marked += 1;

        if !block.is_leaf() {
            self.worklist.push(block.addr(), block.size());
        }
    }

    /// Feed every word of `words` to [`Marker::mark_ptr`].
    pub fn mark_words(&mut self, words: Words) {
        for word in words {
            self.mark_ptr(word);
        }
    }

    /// Scan queued blocks until nothing reachable is left unmarked.
    pub fn drain(&mut self) {
        while let Some(pending) = self.worklist.pop() {
            // SAFETY: only tracked blocks are queued, and tracked blocks are
            // live heap allocations of at least `size` bytes.
            let words = unsafe { Words::new(pending.addr, pending.addr + pending.size) };
            self.mark_words(words);
        }
    }
}

/// Mark every block reachable from the static region and the stack.
///
/// `extra_roots` are marked first; the collector passes blocks it is in the
/// middle of handing back to the host.
///
/// # Safety
///
/// The static region and stack bottom of `roots` must still be valid, and
/// every tracked block must be a live allocation.
pub unsafe fn mark(
    registry: &mut Registry,
    roots: &RootSet,
    window: AddressWindow,
    extra_roots: &[usize],
) -> MarkStats {
    if registry.is_empty() {
        return MarkStats::default();
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(tracked = registry.len(), "mark_start");

    let mut marker = Marker::new(registry, window);

    for &root in extra_roots {
        marker.mark_ptr(root);
    }
    marker.drain();

    // SAFETY: forwarded from the caller's contract.
    marker.mark_words(unsafe { roots.static_words() });
    marker.drain();

    if let Some(bottom) = roots.stack_bottom() {
        // Calling through an opaque function pointer keeps the scan out of
        // line, so values this frame holds in registers are spilled first.
        let scan = std::hint::black_box(mark_stack as fn(&mut Marker<'_>, usize));
        scan(&mut marker, bottom);
    }

    let stats = MarkStats {
        objects_marked: marker.objects_marked(),
        worklist_high_water: marker.worklist_high_water(),
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(objects_marked = stats.objects_marked, "mark_end");

    stats
}

#[inline(never)]
fn mark_stack(marker: &mut Marker<'_>, bottom: usize) {
    let regs = stack::spill_registers();
    for &reg in &regs {
        marker.mark_ptr(reg);
    }

    let top = stack::approximate_sp();
    // SAFETY: every word between the innermost frame and the bottom captured
    // at start belongs to this thread's live stack.
    let words = unsafe { stack::stack_words(top, bottom) };
    marker.mark_words(words);
    marker.drain();

    std::hint::black_box(&regs);
}

/// Outcome of one mark pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkStats {
    /// Blocks marked reachable.
    pub objects_marked: usize,
    /// Peak length of the work list.
    pub worklist_high_water: usize,
}
