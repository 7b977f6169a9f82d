//! Conservative word scanning.
//!
//! This is the one place where raw memory is reinterpreted as candidate
//! addresses. Everything upstream sees only an iterator of `usize` values.

use std::iter::FusedIterator;

/// Size of a candidate address in bytes.
pub const WORD: usize = std::mem::size_of::<usize>();

/// The pointer-aligned words of a byte range, read one at a time.
///
/// Only whole words inside `[start, end)` are produced; a leading partial
/// word is skipped by aligning `start` up, and a trailing partial word is
/// ignored.
#[derive(Debug, Clone)]
pub struct Words {
    next: usize,
    end: usize,
}

impl Words {
    /// Iterate the words of `[start, end)`.
    ///
    /// # Safety
    ///
    /// Every aligned word in the range must stay readable for as long as the
    /// iterator is advanced.
    #[must_use]
    pub unsafe fn new(start: usize, end: usize) -> Self {
        let next = start.checked_next_multiple_of(WORD).unwrap_or(end);
        Self {
            next: next.min(end),
            end,
        }
    }

    /// An iterator that yields nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self { next: 0, end: 0 }
    }
}

impl Iterator for Words {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.end - self.next < WORD {
            return None;
        }
        let addr = self.next;
        self.next += WORD;

        // SAFETY: `Words::new`'s caller guarantees the range is readable. The
        // volatile load keeps the compiler from assuming anything about
        // memory it cannot see being written.
        Some(unsafe { std::ptr::read_volatile(std::ptr::with_exposed_provenance::<usize>(addr)) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) / WORD;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Words {}

impl FusedIterator for Words {}
