//! The allocation registry.
//!
//! An open-addressing hash table keyed by block address. Insertion uses
//! robin-hood displacement so that probe sequences stay short, and deletion
//! shifts the following run of entries back by one slot instead of leaving
//! tombstones.
//!
//! # Invariants
//!
//! - No two occupied slots hold the same address.
//! - For every occupied slot, a lookup of its address reaches it after exactly
//!   `displacement` probes, where `displacement` is the distance from the
//!   entry's home slot. Lookups therefore stop as soon as the running probe
//!   count exceeds the displacement of the slot being examined.
//! - At least one slot is empty whenever the table is non-empty, so probe
//!   loops always terminate.

use crate::capacity::{self, Resize};
use crate::error::AllocError;

/// Number of low address bits that are always zero for word-aligned blocks.
const ADDR_SHIFT: u32 = std::mem::align_of::<usize>().trailing_zeros();

/// Metadata for one tracked block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedBlock {
    addr: usize,
    size: usize,
    leaf: bool,
    marked: bool,
    /// Ideal slot index for `addr` in the table it currently lives in.
    home: usize,
}

impl TrackedBlock {
    /// Start address of the block.
    #[must_use]
    pub const fn addr(&self) -> usize {
        self.addr
    }

    /// Payload size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether the block is known to hold no outgoing references.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Whether the current mark pass has reached this block.
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.marked
    }

    /// Ideal slot index of this block.
    #[must_use]
    pub const fn home(&self) -> usize {
        self.home
    }

    pub(crate) const fn set_marked(&mut self, marked: bool) {
        self.marked = marked;
    }

    pub(crate) const fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    pub(crate) const fn set_leaf(&mut self, leaf: bool) {
        self.leaf = leaf;
    }
}

/// Public snapshot of a tracked block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Start address of the block.
    pub addr: usize,
    /// Payload size in bytes.
    pub size: usize,
    /// Whether the block is skipped by interior scanning.
    pub leaf: bool,
}

impl From<&TrackedBlock> for BlockInfo {
    fn from(block: &TrackedBlock) -> Self {
        Self {
            addr: block.addr,
            size: block.size,
            leaf: block.leaf,
        }
    }
}

/// Hash of a block address.
#[inline]
const fn hash(addr: usize) -> usize {
    addr >> ADDR_SHIFT
}

/// Distance of slot `index` from `home` in a table of `slots` slots.
#[inline]
const fn displacement(index: usize, home: usize, slots: usize) -> usize {
    (index + slots - home) % slots
}

/// Pointer-keyed robin-hood hash table of tracked blocks.
#[derive(Debug, Default)]
pub struct Registry {
    slots: Vec<Option<TrackedBlock>>,
    len: usize,
}

impl Registry {
    /// Create an empty registry with no backing storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Number of tracked blocks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no blocks are tracked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn home_of(&self, addr: usize) -> usize {
        hash(addr) % self.slots.len()
    }

    /// Slot index holding `addr`, together with the number of probes taken.
    fn find(&self, addr: usize) -> Option<(usize, usize)> {
        let slots = self.slots.len();
        if slots == 0 {
            return None;
        }

        let mut index = self.home_of(addr);
        let mut probes = 0;
        loop {
            let block = self.slots[index].as_ref()?;
            if probes > displacement(index, block.home, slots) {
                return None;
            }
            if block.addr == addr {
                return Some((index, probes));
            }
            index = (index + 1) % slots;
            probes += 1;
        }
    }

    /// Look up the block starting at `addr`.
    #[must_use]
    pub fn get(&self, addr: usize) -> Option<&TrackedBlock> {
        let (index, _) = self.find(addr)?;
        self.slots[index].as_ref()
    }

    pub(crate) fn get_mut(&mut self, addr: usize) -> Option<&mut TrackedBlock> {
        let (index, _) = self.find(addr)?;
        self.slots[index].as_mut()
    }

    /// Whether `addr` is tracked.
    #[must_use]
    pub fn contains(&self, addr: usize) -> bool {
        self.find(addr).is_some()
    }

    /// Number of probes a lookup of `addr` takes before hitting it.
    #[must_use]
    pub fn probe_length(&self, addr: usize) -> Option<usize> {
        self.find(addr).map(|(_, probes)| probes)
    }

    /// Largest distance of any entry from its home slot.
    #[must_use]
    pub fn max_displacement(&self) -> usize {
        let slots = self.slots.len();
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref()
                    .map(|block| displacement(index, block.home, slots))
            })
            .max()
            .unwrap_or(0)
    }

    /// Iterate over all tracked blocks in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedBlock> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Track a new block.
    ///
    /// Returns `Ok(false)` without touching the table if `addr` is already
    /// tracked.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::TableExhausted`] if inserting would leave no
    /// empty slot. Call [`Registry::grow_for`] first to make room.
    pub fn insert(&mut self, addr: usize, size: usize, leaf: bool) -> Result<bool, AllocError> {
        if self.contains(addr) {
            return Ok(false);
        }
        if self.len + 1 >= self.slots.len() {
            return Err(AllocError::TableExhausted {
                slots: self.slots.len(),
            });
        }
        Ok(self.insert_unchecked(addr, size, leaf))
    }

    /// [`Registry::insert`] for callers that already grew the table.
    pub(crate) fn insert_unchecked(&mut self, addr: usize, size: usize, leaf: bool) -> bool {
        if self.find(addr).is_some() {
            return false;
        }
        self.place(TrackedBlock {
            addr,
            size,
            leaf,
            marked: false,
            home: 0,
        });
        true
    }

    /// Robin-hood insertion of a block known to be absent.
    fn place(&mut self, mut item: TrackedBlock) {
        let slots = self.slots.len();
        debug_assert!(self.len < slots, "registry has no free slot");

        let mut index = self.home_of(item.addr);
        item.home = index;
        let mut probes = 0;
        loop {
            let Some(occupant) = self.slots[index].as_mut() else {
                self.slots[index] = Some(item);
                self.len += 1;
                return;
            };

            let occupant_distance = displacement(index, occupant.home, slots);
            if probes >= occupant_distance {
                std::mem::swap(occupant, &mut item);
                probes = occupant_distance;
            }
            index = (index + 1) % slots;
            probes += 1;
        }
    }

    /// Stop tracking `addr`, returning its metadata.
    pub fn remove(&mut self, addr: usize) -> Option<TrackedBlock> {
        let (index, _) = self.find(addr)?;
        self.remove_at(index)
    }

    /// Vacate slot `index` and close the gap by shifting the following run
    /// back one slot.
    pub(crate) fn remove_at(&mut self, index: usize) -> Option<TrackedBlock> {
        let removed = self.slots[index].take()?;
        let slots = self.slots.len();

        let mut hole = index;
        loop {
            let next = (hole + 1) % slots;
            let shift = self.slots[next]
                .as_ref()
                .is_some_and(|block| displacement(next, block.home, slots) > 0);
            if !shift {
                break;
            }
            self.slots[hole] = self.slots[next].take();
            hole = next;
        }

        self.len -= 1;
        Some(removed)
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&TrackedBlock> {
        self.slots[index].as_ref()
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut TrackedBlock> {
        self.slots[index].as_mut()
    }

    /// Move every entry into a fresh table of `new_slots` slots.
    ///
    /// # Errors
    ///
    /// If the new slot array cannot be allocated, the current table is left
    /// exactly as it was.
    pub fn rehash(&mut self, new_slots: usize) -> Result<(), AllocError> {
        if new_slots <= self.len {
            return Err(AllocError::TableExhausted { slots: new_slots });
        }

        let mut fresh: Vec<Option<TrackedBlock>> = Vec::new();
        fresh
            .try_reserve_exact(new_slots)
            .map_err(|_| AllocError::TableExhausted { slots: new_slots })?;
        fresh.resize(new_slots, None);

        let old = std::mem::replace(&mut self.slots, fresh);
        self.len = 0;
        for block in old.into_iter().flatten() {
            self.place(block);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(slots = new_slots, items = self.len, "rehash");

        Ok(())
    }

    /// Make room for `items` entries at `load_factor`, capped at `max_slots`.
    ///
    /// # Errors
    ///
    /// Fails if the table would exceed `max_slots` or its storage cannot be
    /// allocated. The table is unchanged in both cases.
    pub fn grow_for(
        &mut self,
        items: usize,
        load_factor: f64,
        max_slots: usize,
    ) -> Result<(), AllocError> {
        match capacity::grow(items, self.capacity(), load_factor) {
            Resize::Keep => Ok(()),
            Resize::To(slots) if slots > max_slots => Err(AllocError::TableExhausted { slots }),
            Resize::To(slots) => self.rehash(slots),
        }
    }

    /// Give back slots the current population no longer needs.
    ///
    /// # Errors
    ///
    /// Fails if the smaller table cannot be allocated, keeping the current one.
    pub fn shrink_for(&mut self, load_factor: f64) -> Result<(), AllocError> {
        match capacity::shrink(self.len, self.capacity(), load_factor) {
            Resize::Keep => Ok(()),
            Resize::To(slots) => self.rehash(slots),
        }
    }

    /// Forget every entry and release the slot array.
    pub fn release_storage(&mut self) {
        self.slots = Vec::new();
        self.len = 0;
    }
}
