//! A conservative, non-moving mark-sweep garbage collector for C-like hosts.
//!
//! `rudo-cgc` tracks blocks obtained from the system heap and frees the ones
//! that become unreachable. There is no type information: every aligned word
//! on the stack, in a static root region, or inside a reachable non-leaf
//! block that equals the start address of a tracked block keeps that block
//! alive. Blocks never move.
//!
//! # Usage
//!
//! ```
//! use rudo_cgc::{stack_bottom, Collector};
//!
//! // SAFETY: the collector lives on this thread, below the returned bottom.
//! let mut gc = unsafe { Collector::start(stack_bottom(), std::ptr::null(), std::ptr::null()) };
//!
//! let list = gc.alloc(2 * std::mem::size_of::<usize>(), false).unwrap();
//! let name = gc.alloc(32, true).unwrap();
//! unsafe { list.cast::<*mut u8>().write(name.as_ptr()) };
//!
//! gc.collect();
//! assert!(gc.is_tracked(name.as_ptr()));
//! gc.stop();
//! ```
//!
//! # Roots
//!
//! - the calling thread's stack, from the current frame to the bottom given
//!   at start, with callee-saved registers spilled first
//! - an optional static region `[low, high]`, where `high` is the address
//!   of its last word
//!
//! A block passed to [`Collector::add`] survives the collection that call
//! may trigger, even if nothing else refers to it yet.
//!
//! # Thread Safety
//!
//! A [`Collector`] is `!Send` and `!Sync`. It scans only the stack of the
//! thread it was started on.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod capacity;
mod collector;
mod config;
mod error;
pub mod ffi;
pub mod gc;
mod metrics;
pub mod registry;
mod roots;
pub mod runtime;
pub mod scan;
pub mod stack;
#[cfg(feature = "tracing")]
mod tracing;

/// Underlying heap the collector draws blocks from.
///
/// This module is public so hosts and tests can supply their own heap.
/// Most users should use [`SystemHeap`] through [`Collector::start`].
pub mod heap;

// Re-export public API
pub use collector::Collector;
pub use config::{GcConfig, DEFAULT_LOAD_FACTOR, DEFAULT_SWEEP_FACTOR};
pub use error::AllocError;
pub use gc::{AddressWindow, MarkStats, SweepStats};
pub use heap::{RawHeap, SystemHeap};
pub use metrics::{CollectionTrigger, GcHistory, GcMetrics, PhaseTimer};
pub use registry::{BlockInfo, Registry};
pub use roots::RootSet;
pub use stack::stack_bottom;
#[cfg(feature = "tracing")]
pub use crate::tracing::GcId;
