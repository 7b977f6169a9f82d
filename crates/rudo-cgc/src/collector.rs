//! The allocator façade.
//!
//! A [`Collector`] owns every block registered with it. The host obtains
//! memory, hands it over with [`Collector::add`] (or lets the collector do
//! both with [`Collector::alloc`]), and never frees it directly. Once more
//! blocks are tracked than the current threshold allows, the next
//! registration runs a full stop-the-world mark and sweep before returning.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::time::Instant;

use crate::config::GcConfig;
use crate::error::AllocError;
use crate::gc::{self, AddressWindow, SweepStats};
use crate::heap::{RawHeap, SystemHeap};
use crate::metrics::{CollectionTrigger, GcHistory, GcMetrics, PhaseTimer};
use crate::registry::{BlockInfo, Registry};
use crate::roots::RootSet;
use crate::scan::WORD;

#[cfg(feature = "tracing")]
use crate::tracing::internal::{trace_gc_collection, trace_teardown, GcId};

/// A conservative mark-sweep garbage collector.
///
/// The collector is single-threaded: it scans the stack of the thread it runs
/// on, so it is neither `Send` nor `Sync`.
pub struct Collector<H: RawHeap = SystemHeap> {
    registry: Registry,
    roots: RootSet,
    window: AddressWindow,
    /// Tracked-block count above which `add` collects.
    threshold: usize,
    config: GcConfig,
    heap: H,
    /// Nesting depth of `pause` calls.
    paused: usize,
    last_metrics: GcMetrics,
    history: GcHistory,
    _not_send: PhantomData<*mut ()>,
}

impl Collector<SystemHeap> {
    /// Start a collector on the process heap with the default configuration.
    ///
    /// `stack_bottom` is the outermost stack word to scan, usually the
    /// address of a local in `main` or [`stack_bottom`](crate::stack_bottom).
    /// `[roots_low, roots_high]` is a static region scanned as roots, with
    /// `roots_high` the address of its last word. Either `stack_bottom` or
    /// `roots_low` may be null to disable that root source.
    ///
    /// # Safety
    ///
    /// For as long as the collector lives, every word between any frame that
    /// calls into it and `stack_bottom` must be this thread's live stack, and
    /// the static region must stay readable.
    #[must_use]
    pub unsafe fn start(
        stack_bottom: *const u8,
        roots_low: *const u8,
        roots_high: *const u8,
    ) -> Self {
        let roots = RootSet::new(stack_bottom, roots_low, roots_high);
        // SAFETY: forwarded from the caller's contract.
        unsafe { Self::start_in(SystemHeap, GcConfig::default(), roots) }
    }
}

impl<H: RawHeap> Collector<H> {
    /// Start a collector on a custom heap and configuration.
    ///
    /// Invalid configuration values are replaced by their defaults.
    ///
    /// # Safety
    ///
    /// Same contract as [`Collector::start`] for the stack bottom and static
    /// region of `roots`.
    #[must_use]
    pub unsafe fn start_in(heap: H, config: GcConfig, roots: RootSet) -> Self {
        Self {
            registry: Registry::new(),
            roots,
            window: AddressWindow::new(),
            threshold: 0,
            config: config.sanitized(),
            heap,
            paused: 0,
            last_metrics: GcMetrics::new(),
            history: GcHistory::new(),
            _not_send: PhantomData,
        }
    }

    /// Register a freshly obtained block.
    ///
    /// If `ptr` is already tracked, its size and leaf flag are updated in
    /// place. Otherwise the block is inserted, and if the tracked count now
    /// exceeds the threshold a collection runs before this returns. The block
    /// being registered always survives that collection.
    ///
    /// # Errors
    ///
    /// If the registry cannot grow, the block is released to the heap, the
    /// registry is left unchanged, and the error is returned.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block of this collector's heap, at least `size`
    /// bytes long, and not owned by anything else from now on.
    pub unsafe fn add(
        &mut self,
        ptr: NonNull<u8>,
        size: usize,
        leaf: bool,
    ) -> Result<NonNull<u8>, AllocError> {
        let addr = ptr.as_ptr().expose_provenance();

        if let Some(block) = self.registry.get_mut(addr) {
            block.set_size(size);
            block.set_leaf(leaf);
            self.window.widen(addr, size);
            return Ok(ptr);
        }

        if let Err(err) = self.registry.grow_for(
            self.registry.len() + 1,
            self.config.load_factor,
            self.config.max_slots,
        ) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, size, "registration failed, releasing block");

            // SAFETY: the caller handed ownership of the block to us.
            unsafe { self.heap.free(ptr) };
            return Err(err);
        }

        self.window.widen(addr, size);
        self.registry.insert_unchecked(addr, size, leaf);

        if self.paused == 0 && self.registry.len() > self.threshold {
            self.run_collection(CollectionTrigger::Threshold, &[addr]);
        }

        Ok(ptr)
    }

    /// Resize a block, tracking the result.
    ///
    /// - A null `ptr` registers the new block as non-leaf.
    /// - An unmoved block keeps its entry with the new size.
    /// - A moved block is re-registered under its new address with its old
    ///   leaf flag.
    /// - An untracked `ptr` is adopted as a new non-leaf block. This is a
    ///   deliberate departure from a plain tracking `realloc`, which would
    ///   return null here and leave the resized block owned by nobody.
    ///
    /// # Errors
    ///
    /// If the heap cannot satisfy the request, `ptr` stops being tracked (the
    /// heap left it allocated, so it now belongs to the caller again) and
    /// [`AllocError::OutOfMemory`] is returned. Registration failures are
    /// reported as by [`Collector::add`].
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block of this collector's heap, and any
    /// copy of the old address is invalid if the block moves.
    pub unsafe fn realloc(&mut self, ptr: *mut u8, size: usize) -> Result<NonNull<u8>, AllocError> {
        let size = size.max(1);
        // SAFETY: forwarded from the caller's contract.
        let Some(moved) = (unsafe { self.heap.realloc(ptr, size) }) else {
            if !ptr.is_null() {
                self.untrack(ptr.expose_provenance());
            }
            return Err(AllocError::OutOfMemory { requested: size });
        };

        let old_addr = ptr.expose_provenance();
        let new_addr = moved.as_ptr().expose_provenance();

        let leaf = if ptr.is_null() {
            false
        } else if new_addr == old_addr {
            if let Some(block) = self.registry.get_mut(old_addr) {
                block.set_size(size);
                self.window.widen(new_addr, size);
                return Ok(moved);
            }
            false
        } else {
            self.untrack(old_addr).is_some_and(|block| block.leaf)
        };

        // SAFETY: `moved` is a live block of our heap nobody else owns.
        unsafe { self.add(moved, size, leaf) }
    }

    /// Allocate and register a block of `size` bytes.
    ///
    /// # Errors
    ///
    /// Fails if the heap is exhausted or the registry cannot grow.
    pub fn alloc(&mut self, size: usize, leaf: bool) -> Result<NonNull<u8>, AllocError> {
        let request = size.max(WORD);
        let ptr = self
            .heap
            .alloc(request)
            .ok_or(AllocError::OutOfMemory { requested: request })?;
        // SAFETY: the block was just obtained from our heap.
        unsafe { self.add(ptr, request, leaf) }
    }

    /// Allocate and register a zeroed array of `count` elements of `size`
    /// bytes each.
    ///
    /// # Errors
    ///
    /// Fails on overflow of `count * size`, if the heap is exhausted, or if
    /// the registry cannot grow.
    pub fn alloc_zeroed(
        &mut self,
        count: usize,
        size: usize,
        leaf: bool,
    ) -> Result<NonNull<u8>, AllocError> {
        let request = count
            .checked_mul(size)
            .ok_or(AllocError::OutOfMemory { requested: usize::MAX })?
            .max(WORD);
        let ptr = self
            .heap
            .alloc_zeroed(request)
            .ok_or(AllocError::OutOfMemory { requested: request })?;
        // SAFETY: the block was just obtained from our heap.
        unsafe { self.add(ptr, request, leaf) }
    }

    /// Stop tracking `ptr` and release it right away.
    ///
    /// Returns `false` if `ptr` was not tracked, in which case nothing is
    /// released.
    ///
    /// # Safety
    ///
    /// No live reference into the block may be used afterwards.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) -> bool {
        if self.untrack(ptr.as_ptr().expose_provenance()).is_none() {
            return false;
        }
        // SAFETY: the block was tracked, hence owned by us and live.
        unsafe { self.heap.free(ptr) };
        true
    }

    fn untrack(&mut self, addr: usize) -> Option<BlockInfo> {
        let block = self.registry.remove(addr)?;
        if let Err(_err) = self.registry.shrink_for(self.config.load_factor) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "registry shrink failed, keeping current table");
        }
        Some(BlockInfo::from(&block))
    }

    /// Run a full mark and sweep now, even while paused.
    pub fn collect(&mut self) {
        self.run_collection(CollectionTrigger::Explicit, &[]);
    }

    #[inline(never)]
    fn run_collection(&mut self, trigger: CollectionTrigger, extra_roots: &[usize]) {
        #[cfg(feature = "tracing")]
        let _span = trace_gc_collection(
            trigger,
            GcId(self.last_metrics.total_collections as u64 + 1),
        );

        let start = Instant::now();
        let mut timer = PhaseTimer::new();

        // SAFETY: `start`'s caller vouched for the root set, and every tracked
        // block is a live allocation of our heap.
        let marked = timer.time_mark(|| unsafe {
            gc::mark(&mut self.registry, &self.roots, self.window, extra_roots)
        });
        // SAFETY: every tracked block is owned by us.
        let swept = timer.time_sweep(|| unsafe {
            gc::sweep(&mut self.registry, &mut self.heap, &self.config)
        });

        self.threshold = swept.next_threshold;

        let metrics = GcMetrics {
            duration: start.elapsed(),
            mark_duration: timer.mark(),
            sweep_duration: timer.sweep(),
            objects_marked: marked.objects_marked,
            objects_reclaimed: swept.objects_reclaimed,
            bytes_reclaimed: swept.bytes_reclaimed,
            objects_surviving: swept.objects_surviving,
            bytes_surviving: swept.bytes_surviving,
            slots: self.registry.capacity(),
            next_threshold: swept.next_threshold,
            trigger,
            total_collections: self.last_metrics.total_collections + 1,
        };
        self.last_metrics = metrics;
        self.history.push(metrics);
    }

    /// Suppress automatic collection until a matching [`Collector::resume`].
    ///
    /// Pauses nest.
    pub const fn pause(&mut self) {
        self.paused += 1;
    }

    /// Undo one [`Collector::pause`].
    pub const fn resume(&mut self) {
        self.paused = self.paused.saturating_sub(1);
    }

    /// Whether automatic collection is suppressed.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused > 0
    }

    /// Metadata of the block starting at `ptr`.
    #[must_use]
    pub fn lookup(&self, ptr: *const u8) -> Option<BlockInfo> {
        self.registry
            .get(ptr.expose_provenance())
            .map(BlockInfo::from)
    }

    /// Whether the block starting at `ptr` is tracked.
    #[must_use]
    pub fn is_tracked(&self, ptr: *const u8) -> bool {
        self.registry.contains(ptr.expose_provenance())
    }

    /// Number of tracked blocks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of registry slots.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.registry.capacity()
    }

    /// Tracked-block count above which the next registration collects.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// The allocation registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Range covering every block ever tracked.
    #[must_use]
    pub const fn address_window(&self) -> AddressWindow {
        self.window
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Statistics of the most recent collection.
    #[must_use]
    pub const fn last_metrics(&self) -> GcMetrics {
        self.last_metrics
    }

    /// Statistics of recent collections.
    #[must_use]
    pub const fn history(&self) -> &GcHistory {
        &self.history
    }

    /// The underlying heap.
    #[must_use]
    pub const fn heap(&self) -> &H {
        &self.heap
    }

    /// Tear the collector down.
    ///
    /// Sweeps once without marking first and releases the registry's storage.
    /// Blocks that are still marked at this point stay allocated but are no
    /// longer tracked. Since every completed sweep clears all marks, in
    /// practice this releases every tracked block.
    pub fn stop(mut self) -> SweepStats {
        self.teardown()
    }

    fn teardown(&mut self) -> SweepStats {
        if self.registry.capacity() == 0 {
            return SweepStats::default();
        }

        #[cfg(feature = "tracing")]
        let _span = trace_teardown(self.registry.len());

        // SAFETY: every tracked block is owned by us.
        let stats = unsafe { gc::sweep(&mut self.registry, &mut self.heap, &self.config) };
        self.registry.release_storage();
        stats
    }
}

impl<H: RawHeap> Drop for Collector<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<H: RawHeap> std::fmt::Debug for Collector<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("tracked", &self.registry.len())
            .field("slots", &self.registry.capacity())
            .field("threshold", &self.threshold)
            .field("paused", &self.paused)
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}
