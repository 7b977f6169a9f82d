//! The sweep phase.
//!
//! Two phases, so that releasing memory never overlaps with compacting the
//! registry:
//! - Phase 1: move every unmarked block out of the registry into a batch and
//!   clear the marks of the survivors.
//! - Phase 2: hand the batch back to the heap.

use std::ptr::NonNull;

use crate::config::GcConfig;
use crate::heap::RawHeap;
use crate::registry::{Registry, TrackedBlock};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Blocks released to the heap.
    pub objects_reclaimed: usize,
    /// Bytes released to the heap.
    pub bytes_reclaimed: usize,
    /// Blocks still tracked.
    pub objects_surviving: usize,
    /// Bytes still tracked.
    pub bytes_surviving: usize,
    /// Tracked-block count above which the next automatic collection runs.
    pub next_threshold: usize,
}

/// Collection threshold after a sweep left `survivors` blocks.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn next_threshold(survivors: usize, sweep_factor: f64) -> usize {
    let allowance = (survivors as f64 * sweep_factor) as usize;
    survivors.saturating_add(allowance).saturating_add(1)
}

/// Release every unmarked block and clear the marks of the rest.
///
/// # Safety
///
/// Every tracked block must be a live allocation of `heap` owned by the
/// collector.
pub unsafe fn sweep<H: RawHeap>(
    registry: &mut Registry,
    heap: &mut H,
    config: &GcConfig,
) -> SweepStats {
    if registry.is_empty() {
        return SweepStats {
            next_threshold: next_threshold(0, config.sweep_factor),
            ..SweepStats::default()
        };
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(tracked = registry.len(), "sweep_start");

    let pending = registry.iter().filter(|block| !block.is_marked()).count();
    let mut batch: Vec<TrackedBlock> = Vec::new();
    if batch.try_reserve_exact(pending).is_ok() {
        sweep_phase1_unlink(registry, &mut batch);
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!(pending, "cannot allocate free batch, skipping reclamation");
    }
    clear_marks(registry);

    if let Err(_err) = registry.shrink_for(config.load_factor) {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %_err, "registry shrink failed, keeping current table");
    }

    let surviving = registry.len();
    let mut stats = SweepStats {
        objects_reclaimed: batch.len(),
        bytes_reclaimed: batch.iter().map(TrackedBlock::size).sum(),
        objects_surviving: surviving,
        bytes_surviving: registry.iter().map(TrackedBlock::size).sum(),
        next_threshold: next_threshold(surviving, config.sweep_factor),
    };

    // SAFETY: forwarded from the caller's contract; the batch holds blocks
    // that are no longer tracked.
    stats.objects_reclaimed = unsafe { sweep_phase2_release(batch, heap) };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        objects_freed = stats.objects_reclaimed,
        bytes_freed = stats.bytes_reclaimed,
        "sweep_end"
    );

    stats
}

/// Phase 1: unlink unmarked blocks.
///
/// Deleting shifts the following run back by one slot, so after a removal the
/// same index is examined again. Entries only ever move backwards, so every
/// slot before `index` holds a marked block and nothing is skipped.
fn sweep_phase1_unlink(registry: &mut Registry, batch: &mut Vec<TrackedBlock>) {
    let mut index = 0;
    while index < registry.capacity() {
        let dead = registry.slot(index).is_some_and(|block| !block.is_marked());
        if !dead {
            index += 1;
            continue;
        }
        if let Some(block) = registry.remove_at(index) {
            batch.push(block);
        }
    }
}

fn clear_marks(registry: &mut Registry) {
    for index in 0..registry.capacity() {
        if let Some(block) = registry.slot_mut(index) {
            block.set_marked(false);
        }
    }
}

/// Phase 2: release the unlinked blocks.
unsafe fn sweep_phase2_release<H: RawHeap>(batch: Vec<TrackedBlock>, heap: &mut H) -> usize {
    let mut released = 0;
    for block in batch {
        if let Some(ptr) = NonNull::new(std::ptr::with_exposed_provenance_mut::<u8>(block.addr())) {
            // SAFETY: the block was a live allocation of `heap` and has just
            // left the registry, so nothing else will release it.
            unsafe { heap.free(ptr) };
            released += 1;
        }
    }
    released
}
