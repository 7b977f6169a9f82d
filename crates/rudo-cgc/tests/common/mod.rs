//! Shared helpers for the collector integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use rudo_cgc::{Collector, GcConfig, RawHeap, RootSet, SystemHeap};

#[derive(Debug, Default)]
struct HeapLog {
    /// Live blocks by address, with their size.
    live: HashMap<usize, usize>,
    frees: usize,
    moves: usize,
    fail_alloc: bool,
    fail_realloc: bool,
}

/// A heap that records every block it hands out.
///
/// Releasing a block it does not own, or releasing one twice, panics.
/// Growing `realloc` always moves; shrinking never does.
#[derive(Debug, Clone, Default)]
pub struct CountingHeap {
    log: Rc<RefCell<HeapLog>>,
}

impl CountingHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live blocks.
    pub fn live(&self) -> usize {
        self.log.borrow().live.len()
    }

    pub fn is_live(&self, ptr: NonNull<u8>) -> bool {
        self.log
            .borrow()
            .live
            .contains_key(&ptr.as_ptr().expose_provenance())
    }

    /// Number of calls to `free`.
    pub fn frees(&self) -> usize {
        self.log.borrow().frees
    }

    /// Number of blocks `realloc` moved.
    pub fn moves(&self) -> usize {
        self.log.borrow().moves
    }

    pub fn set_fail_alloc(&self, fail: bool) {
        self.log.borrow_mut().fail_alloc = fail;
    }

    pub fn set_fail_realloc(&self, fail: bool) {
        self.log.borrow_mut().fail_realloc = fail;
    }

    fn record(&self, ptr: NonNull<u8>, size: usize) {
        let previous = self
            .log
            .borrow_mut()
            .live
            .insert(ptr.as_ptr().expose_provenance(), size);
        assert!(previous.is_none(), "heap handed out a live block twice");
    }

    fn forget(&self, ptr: NonNull<u8>) -> usize {
        let addr = ptr.as_ptr().expose_provenance();
        self.log
            .borrow_mut()
            .live
            .remove(&addr)
            .unwrap_or_else(|| panic!("release of unowned or already freed block {addr:#x}"))
    }
}

unsafe impl RawHeap for CountingHeap {
    fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        if self.log.borrow().fail_alloc {
            return None;
        }
        let ptr = SystemHeap.alloc(size)?;
        self.record(ptr, size);
        Some(ptr)
    }

    fn alloc_zeroed(&mut self, size: usize) -> Option<NonNull<u8>> {
        if self.log.borrow().fail_alloc {
            return None;
        }
        let ptr = SystemHeap.alloc_zeroed(size)?;
        self.record(ptr, size);
        Some(ptr)
    }

    unsafe fn realloc(&mut self, ptr: *mut u8, size: usize) -> Option<NonNull<u8>> {
        if self.log.borrow().fail_realloc {
            return None;
        }
        let Some(old) = NonNull::new(ptr) else {
            return self.alloc(size);
        };

        let old_size = self.forget(old);
        if size <= old_size {
            self.record(old, size);
            return Some(old);
        }

        let Some(new) = SystemHeap.alloc_zeroed(size) else {
            self.record(old, old_size);
            return None;
        };
        unsafe {
            ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), old_size);
            SystemHeap.free(old);
        }
        self.record(new, size);
        self.log.borrow_mut().moves += 1;
        Some(new)
    }

    unsafe fn free(&mut self, ptr: NonNull<u8>) {
        self.forget(ptr);
        self.log.borrow_mut().frees += 1;
        unsafe { SystemHeap.free(ptr) };
    }
}

/// A static root region backed by a boxed slice.
pub struct StaticRoots {
    words: Box<[usize]>,
}

impl StaticRoots {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len].into_boxed_slice(),
        }
    }

    /// Roots in this region only; the stack is not scanned.
    pub fn root_set(&self) -> RootSet {
        let low = self.words.as_ptr();
        let high = low.wrapping_add(self.words.len().saturating_sub(1));
        RootSet::new(ptr::null(), low.cast(), high.cast())
    }

    pub fn set(&mut self, index: usize, block: NonNull<u8>) {
        self.words[index] = block.as_ptr().expose_provenance();
    }

    pub fn set_raw(&mut self, index: usize, value: usize) {
        self.words[index] = value;
    }

    pub fn clear(&mut self, index: usize) {
        self.words[index] = 0;
    }
}

pub fn collector(heap: &CountingHeap, roots: RootSet) -> Collector<CountingHeap> {
    collector_with(heap, GcConfig::default(), roots)
}

pub fn collector_with(
    heap: &CountingHeap,
    config: GcConfig,
    roots: RootSet,
) -> Collector<CountingHeap> {
    unsafe { Collector::start_in(heap.clone(), config, roots) }
}

/// Store a reference to `target` in word `index` of `block`.
pub fn link(block: NonNull<u8>, index: usize, target: NonNull<u8>) {
    unsafe { block.cast::<*mut u8>().add(index).write(target.as_ptr()) };
}

/// Overwrite word `index` of `block` with zero.
pub fn unlink(block: NonNull<u8>, index: usize) {
    unsafe { block.cast::<usize>().add(index).write(0) };
}

pub const WORD: usize = std::mem::size_of::<usize>();
