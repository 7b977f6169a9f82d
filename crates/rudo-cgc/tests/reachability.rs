//! Reachability tests: what survives a collection and what is reclaimed.
//!
//! Stack scanning is disabled here so that every retention comes from the
//! static root region the test controls.

mod common;

use common::{collector, link, unlink, CountingHeap, StaticRoots, WORD};
use rudo_cgc::RootSet;

#[test]
fn test_unreachable_blocks_are_reclaimed_once() {
    let heap = CountingHeap::new();
    let mut gc = collector(&heap, RootSet::none());

    gc.pause();
    for i in 0..1000 {
        gc.alloc(16 + i % 64, i % 2 == 0).unwrap();
    }
    gc.resume();
    assert_eq!(gc.len(), 1000);

    gc.collect();

    assert!(gc.is_empty());
    assert_eq!(heap.frees(), 1000);
    assert_eq!(heap.live(), 0);
    assert_eq!(gc.last_metrics().objects_reclaimed, 1000);
    assert_eq!(gc.last_metrics().objects_surviving, 0);

    // nothing left to free twice
    gc.collect();
    assert_eq!(heap.frees(), 1000);
}

#[test]
fn test_reference_from_reachable_block() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(4);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let p1 = gc.alloc_zeroed(2, WORD, false).unwrap();
    roots.set(0, p1);
    let p2 = gc.alloc_zeroed(1, 24, true).unwrap();
    link(p1, 0, p2);

    gc.collect();
    assert!(gc.is_tracked(p1.as_ptr()));
    assert!(gc.is_tracked(p2.as_ptr()));
    assert_eq!(heap.frees(), 0);

    roots.clear(0);
    gc.collect();
    assert!(gc.is_empty());
    assert_eq!(heap.frees(), 2);
}

#[test]
fn test_last_static_word_is_a_root() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(2);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let kept = gc.alloc(16, true).unwrap();
    roots.set(1, kept);

    gc.collect();
    assert!(gc.is_tracked(kept.as_ptr()));
    assert_eq!(heap.frees(), 0);

    roots.clear(1);
    gc.collect();
    assert!(gc.is_empty());
}

#[test]
fn test_dropping_a_link_reclaims_the_target() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(1);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let parent = gc.alloc_zeroed(2, WORD, false).unwrap();
    let left = gc.alloc_zeroed(1, 32, true).unwrap();
    let right = gc.alloc_zeroed(1, 32, true).unwrap();
    link(parent, 0, left);
    link(parent, 1, right);
    roots.set(0, parent);

    gc.collect();
    assert_eq!(gc.len(), 3);

    unlink(parent, 1);
    gc.collect();
    assert_eq!(gc.len(), 2);
    assert!(gc.is_tracked(left.as_ptr()));
    assert!(!gc.is_tracked(right.as_ptr()));
    assert!(!heap.is_live(right));
}

#[test]
fn test_unreachable_cycle_is_reclaimed() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(1);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let a = gc.alloc_zeroed(1, WORD, false).unwrap();
    let b = gc.alloc_zeroed(1, WORD, false).unwrap();
    link(a, 0, b);
    link(b, 0, a);
    roots.set(0, a);

    gc.collect();
    assert_eq!(gc.len(), 2);
    assert_eq!(gc.last_metrics().objects_marked, 2);

    roots.clear(0);
    gc.collect();
    assert!(gc.is_empty());
    assert_eq!(heap.frees(), 2);
}

#[test]
fn test_self_reference() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(1);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let node = gc.alloc_zeroed(1, WORD, false).unwrap();
    link(node, 0, node);
    roots.set(0, node);

    gc.collect();
    assert!(gc.is_tracked(node.as_ptr()));

    roots.clear(0);
    gc.collect();
    assert!(gc.is_empty());
    assert_eq!(heap.frees(), 1);
}

#[test]
fn test_long_chain_is_retained() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(1);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let head = gc.alloc_zeroed(1, WORD, false).unwrap();
    roots.set(0, head);
    let mut tail = head;
    for _ in 0..10_000 {
        let next = gc.alloc_zeroed(1, WORD, false).unwrap();
        link(tail, 0, next);
        tail = next;
    }

    gc.collect();
    assert_eq!(gc.len(), 10_001);
    assert_eq!(heap.frees(), 0);
    assert_eq!(gc.last_metrics().objects_marked, 10_001);
}

#[test]
fn test_leaf_contents_are_not_scanned() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(1);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let leaf = gc.alloc_zeroed(1, WORD, true).unwrap();
    let child = gc.alloc_zeroed(1, 16, true).unwrap();
    link(leaf, 0, child);
    roots.set(0, leaf);

    gc.collect();
    assert!(gc.is_tracked(leaf.as_ptr()));
    assert!(!gc.is_tracked(child.as_ptr()));
    assert_eq!(heap.frees(), 1);
}

#[test]
fn test_interior_pointer_does_not_retain() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(1);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    let block = gc.alloc_zeroed(4, WORD, true).unwrap();
    roots.set_raw(0, block.as_ptr().expose_provenance() + WORD);

    gc.collect();
    assert!(gc.is_empty());
    assert_eq!(heap.frees(), 1);
}

#[test]
fn test_threshold_follows_survivors() {
    let heap = CountingHeap::new();
    let mut roots = StaticRoots::new(3);
    let mut gc = collector(&heap, roots.root_set());
    gc.pause();

    for i in 0..3 {
        let kept = gc.alloc_zeroed(1, WORD, true).unwrap();
        roots.set(i, kept);
    }
    for _ in 0..5 {
        gc.alloc_zeroed(1, WORD, true).unwrap();
    }

    gc.collect();

    let metrics = gc.last_metrics();
    assert_eq!(metrics.objects_surviving, 3);
    assert_eq!(metrics.objects_reclaimed, 5);
    assert_eq!(metrics.bytes_reclaimed, 5 * WORD);
    // 3 + floor(3 * 2.0) + 1
    assert_eq!(gc.threshold(), 10);
    assert_eq!(metrics.next_threshold, 10);
}

#[test]
fn test_automatic_collection_keeps_the_new_block() {
    let heap = CountingHeap::new();
    let mut gc = collector(&heap, RootSet::none());

    for _ in 0..1000 {
        let block = gc.alloc(32, true).unwrap();
        assert!(gc.is_tracked(block.as_ptr()));
        assert!(gc.len() <= gc.threshold());
    }

    assert!(gc.last_metrics().total_collections > 100);
    assert_eq!(heap.frees() + gc.len(), 1000);
    assert_eq!(heap.live(), gc.len());
}

#[test]
fn test_pause_suppresses_automatic_collection() {
    let heap = CountingHeap::new();
    let mut gc = collector(&heap, RootSet::none());

    gc.pause();
    for _ in 0..100 {
        gc.alloc(8, true).unwrap();
    }
    assert_eq!(gc.last_metrics().total_collections, 0);
    assert_eq!(gc.len(), 100);

    // explicit collection still runs while paused
    gc.collect();
    assert!(gc.is_empty());
    gc.resume();
}
