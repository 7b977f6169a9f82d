//! The heap the collector sits on.
//!
//! The collector never carves up memory itself. Blocks come from a
//! general-purpose allocator behind [`RawHeap`], and reclaimed blocks go back
//! to it. [`SystemHeap`] is the process heap via `sys_alloc`.

use std::ptr::NonNull;

/// A general-purpose `malloc`-style allocator.
///
/// # Safety
///
/// Implementors must return blocks that are readable and writable for at
/// least the requested number of bytes and aligned for `usize`, and must
/// keep them valid until they are passed to [`RawHeap::free`] or moved by a
/// successful [`RawHeap::realloc`]. The marker reads tracked blocks word by
/// word on the strength of this contract.
pub unsafe trait RawHeap {
    /// Allocate `size` bytes. `size` is never zero.
    fn alloc(&mut self, size: usize) -> Option<NonNull<u8>>;

    /// Allocate `size` zeroed bytes. `size` is never zero.
    fn alloc_zeroed(&mut self, size: usize) -> Option<NonNull<u8>>;

    /// Resize the block at `ptr`, which may be null, to `size` bytes.
    ///
    /// On failure the original block must be left intact.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block from this heap.
    unsafe fn realloc(&mut self, ptr: *mut u8, size: usize) -> Option<NonNull<u8>>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block from this heap; it is dangling afterwards.
    unsafe fn free(&mut self, ptr: NonNull<u8>);
}

/// The process heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHeap;

// SAFETY: sys_alloc forwards to the platform malloc family, whose blocks are
// aligned for every fundamental type and live until freed.
unsafe impl RawHeap for SystemHeap {
    fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        sys_alloc::malloc(size)
    }

    fn alloc_zeroed(&mut self, size: usize) -> Option<NonNull<u8>> {
        sys_alloc::calloc(1, size)
    }

    unsafe fn realloc(&mut self, ptr: *mut u8, size: usize) -> Option<NonNull<u8>> {
        // SAFETY: forwarded from the caller's contract.
        unsafe { sys_alloc::realloc(ptr, size) }
    }

    unsafe fn free(&mut self, ptr: NonNull<u8>) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { sys_alloc::free(ptr) }
    }
}

// SAFETY: a mutable reference forwards every call to the heap it borrows.
unsafe impl<H: RawHeap + ?Sized> RawHeap for &mut H {
    fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        (**self).alloc(size)
    }

    fn alloc_zeroed(&mut self, size: usize) -> Option<NonNull<u8>> {
        (**self).alloc_zeroed(size)
    }

    unsafe fn realloc(&mut self, ptr: *mut u8, size: usize) -> Option<NonNull<u8>> {
        // SAFETY: forwarded from the caller's contract.
        unsafe { (**self).realloc(ptr, size) }
    }

    unsafe fn free(&mut self, ptr: NonNull<u8>) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { (**self).free(ptr) }
    }
}
