//! Conservative stack scanning.
//!
//! Only retention is asserted: a stale copy of an address may survive
//! anywhere on the stack, so reclamation is never checked here.

#![cfg(all(target_os = "linux", not(miri)))]

use std::hint::black_box;
use std::ptr;

use rudo_cgc::{stack_bottom, Collector};

#[test]
fn test_local_keeps_block_alive() {
    let mut gc = unsafe { Collector::start(stack_bottom(), ptr::null(), ptr::null()) };

    let kept = gc.alloc(64, true).unwrap();
    for _ in 0..100 {
        gc.alloc(64, true).unwrap();
    }
    gc.collect();

    assert!(gc.is_tracked(black_box(kept).as_ptr()));
    gc.stop();
}

#[test]
fn test_stack_reference_reaches_heap_graph() {
    let mut gc = unsafe { Collector::start(stack_bottom(), ptr::null(), ptr::null()) };

    let head = gc.alloc_zeroed(1, std::mem::size_of::<usize>(), false).unwrap();
    let mut tail = head;
    for _ in 0..50 {
        let next = gc
            .alloc_zeroed(1, std::mem::size_of::<usize>(), false)
            .unwrap();
        unsafe { tail.cast::<*mut u8>().write(next.as_ptr()) };
        tail = next;
    }

    gc.collect();

    let mut node = black_box(head);
    let mut reached = 0;
    while gc.is_tracked(node.as_ptr()) {
        reached += 1;
        let next = unsafe { node.cast::<*mut u8>().read() };
        match ptr::NonNull::new(next) {
            Some(next) => node = next,
            None => break,
        }
    }
    assert_eq!(reached, 51);
    gc.stop();
}

#[test]
fn test_deep_recursion_is_scanned() {
    #[inline(never)]
    fn descend(gc: &mut Collector, depth: usize) -> bool {
        let local = gc.alloc(32, true).unwrap();
        if depth == 0 {
            gc.collect();
        } else if !descend(gc, depth - 1) {
            return false;
        }
        gc.is_tracked(black_box(local).as_ptr())
    }

    let mut gc = unsafe { Collector::start(stack_bottom(), ptr::null(), ptr::null()) };
    assert!(descend(&mut gc, 64));
    gc.stop();
}
