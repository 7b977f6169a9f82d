//! Conservative stack scanning.
//!
//! Spills callee-saved registers into memory and walks the live portion of
//! the current thread's stack as candidate addresses.

use crate::scan::{Words, WORD};

/// Number of register slots produced by [`spill_registers`].
#[cfg(all(target_arch = "x86_64", not(miri)))]
pub const SPILLED_REGISTERS: usize = 6;
/// Number of register slots produced by [`spill_registers`].
#[cfg(any(not(target_arch = "x86_64"), miri))]
pub const SPILLED_REGISTERS: usize = 32;

/// Copy the callee-saved registers into a stack array.
///
/// A pointer held only in a register of some caller frame would otherwise be
/// invisible to a memory scan.
#[inline(never)]
#[must_use]
pub fn spill_registers() -> [usize; SPILLED_REGISTERS] {
    #[allow(unused_mut)]
    let mut regs = [0usize; SPILLED_REGISTERS];

    #[cfg(all(target_arch = "x86_64", not(miri)))]
    // SAFETY: only reads general purpose registers into locals.
    unsafe {
        std::arch::asm!(
            "mov {0}, rbx",
            "mov {1}, rbp",
            "mov {2}, r12",
            "mov {3}, r13",
            "mov {4}, r14",
            "mov {5}, r15",
            out(reg) regs[0],
            out(reg) regs[1],
            out(reg) regs[2],
            out(reg) regs[3],
            out(reg) regs[4],
            out(reg) regs[5],
            options(nomem, nostack, preserves_flags),
        );
    }

    // Elsewhere the optimization barrier forces live values out to memory.
    std::hint::black_box(&regs);
    regs
}

/// Address of the innermost stack word of the calling frame.
#[inline(never)]
#[must_use]
pub fn approximate_sp() -> usize {
    let marker = 0usize;
    std::hint::black_box(&marker);
    std::ptr::addr_of!(marker).expose_provenance()
}

/// The words of the stack between `top` (the innermost live word) and
/// `bottom` (the outermost word to scan), both inclusive.
///
/// The direction of stack growth does not matter; the two ends are ordered
/// before scanning.
///
/// # Safety
///
/// Every word between the two addresses must belong to the current thread's
/// stack and stay mapped while the iterator is advanced.
#[must_use]
pub unsafe fn stack_words(top: usize, bottom: usize) -> Words {
    let (low, high) = if top <= bottom { (top, bottom) } else { (bottom, top) };
    let low = low & !(WORD - 1);
    // SAFETY: forwarded from the caller's contract; `high` is the start of
    // the last word and therefore readable.
    unsafe { Words::new(low, high.saturating_add(WORD)) }
}

/// A best-effort stack bottom for the current thread.
///
/// On Linux this is the last word of the thread's stack mapping as reported
/// by pthreads, which covers every frame of the thread. Elsewhere it falls
/// back to a word in the caller's frame, so only frames created after this
/// call are scanned.
#[cfg(all(target_os = "linux", not(miri)))]
#[must_use]
pub fn stack_bottom() -> *const u8 {
    use libc::{
        pthread_attr_destroy, pthread_attr_getstack, pthread_attr_t, pthread_getattr_np,
        pthread_self,
    };

    // SAFETY: the attribute object is initialised by `pthread_getattr_np`
    // before use and destroyed exactly once.
    unsafe {
        let mut attr: pthread_attr_t = std::mem::zeroed();
        if pthread_getattr_np(pthread_self(), &raw mut attr) != 0 {
            return caller_frame();
        }

        let mut stackaddr: *mut libc::c_void = std::ptr::null_mut();
        let mut stacksize: libc::size_t = 0;
        let ret = pthread_attr_getstack(&raw const attr, &raw mut stackaddr, &raw mut stacksize);
        pthread_attr_destroy(&raw mut attr);
        if ret != 0 || stackaddr.is_null() {
            return caller_frame();
        }

        stackaddr.cast::<u8>().add(stacksize - WORD)
    }
}

/// A best-effort stack bottom for the current thread.
#[cfg(any(not(target_os = "linux"), miri))]
#[must_use]
pub fn stack_bottom() -> *const u8 {
    caller_frame()
}

#[inline(never)]
fn caller_frame() -> *const u8 {
    std::ptr::with_exposed_provenance(approximate_sp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spill_registers_len() {
        assert_eq!(spill_registers().len(), SPILLED_REGISTERS);
    }

    #[test]
    fn test_stack_words_sees_local() {
        let needle = [0x5EED_CAFE_usize];
        std::hint::black_box(&needle);
        let at = needle.as_ptr().expose_provenance();

        let words = unsafe { stack_words(at, at) };
        assert_eq!(words.collect::<Vec<_>>(), vec![0x5EED_CAFE]);
    }

    #[test]
    fn test_stack_words_either_direction() {
        let pair = [11usize, 22];
        std::hint::black_box(&pair);
        let first = pair.as_ptr().expose_provenance();
        let second = first + WORD;

        let forward: Vec<_> = unsafe { stack_words(first, second) }.collect();
        let backward: Vec<_> = unsafe { stack_words(second, first) }.collect();
        assert_eq!(forward, vec![11, 22]);
        assert_eq!(forward, backward);
    }

    #[cfg(all(target_os = "linux", not(miri)))]
    #[test]
    fn test_stack_bottom_is_outside_current_frame() {
        let bottom = stack_bottom().expose_provenance();
        let sp = approximate_sp();
        assert!(bottom > sp);
        assert_eq!(bottom % WORD, 0);
    }
}
