//! Low-level access to the process heap.
//!
//! These are the `malloc` family primitives the collector layers itself on.
//! Every function reports failure as `None` instead of a null pointer; none of
//! them abort on exhaustion.

use std::ptr::NonNull;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as os;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as os;

/// Allocates `size` uninitialized bytes aligned for any fundamental type.
///
/// Returns `None` if `size` is zero or the heap is exhausted.
#[must_use]
pub fn malloc(size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
        return None;
    }
    // SAFETY: a non-zero size is a valid request for the platform allocator.
    NonNull::new(unsafe { os::malloc(size) })
}

/// Allocates zeroed storage for `count` elements of `size` bytes each.
///
/// Returns `None` on overflow of `count * size`, on a zero-sized request, or
/// when the heap is exhausted.
#[must_use]
pub fn calloc(count: usize, size: usize) -> Option<NonNull<u8>> {
    let total = count.checked_mul(size)?;
    if total == 0 {
        return None;
    }
    // SAFETY: the product was checked for overflow and is non-zero.
    NonNull::new(unsafe { os::calloc(count, size) })
}

/// Resizes the block at `ptr` to `size` bytes, possibly moving it.
///
/// A null `ptr` behaves like [`malloc`]. On failure the original block is
/// left untouched and still owned by the caller.
///
/// # Safety
///
/// `ptr` must be null or a live block returned by this crate that has not been
/// passed to [`free`] or successfully resized since.
#[must_use]
pub unsafe fn realloc(ptr: *mut u8, size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
        return None;
    }
    // SAFETY: forwarded from the caller's contract.
    NonNull::new(unsafe { os::realloc(ptr, size) })
}

/// Returns the block at `ptr` to the heap.
///
/// # Safety
///
/// `ptr` must be a live block returned by this crate and must not be used
/// afterwards.
pub unsafe fn free(ptr: NonNull<u8>) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { os::free(ptr.as_ptr()) };
}
