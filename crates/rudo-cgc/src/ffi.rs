//! C ABI for generated code.
//!
//! A collector is handed out as an opaque pointer from [`rudo_cgc_start`] and
//! given back to [`rudo_cgc_stop`]. Every other function takes that handle
//! first. A null handle is ignored, and functions that return a pointer
//! return null for it.

use std::ffi::{c_int, c_void};
use std::ptr::{self, NonNull};

use crate::collector::Collector;
use crate::runtime;

/// Start a collector on the process heap.
///
/// Returns an owning handle to pass to [`rudo_cgc_stop`].
///
/// # Safety
///
/// See [`Collector::start`].
#[no_mangle]
pub unsafe extern "C" fn rudo_cgc_start(
    stack_bottom: *const c_void,
    roots_low: *const c_void,
    roots_high: *const c_void,
) -> *mut Collector {
    // SAFETY: forwarded from the caller's contract.
    let gc = unsafe { Collector::start(stack_bottom.cast(), roots_low.cast(), roots_high.cast()) };
    Box::into_raw(Box::new(gc))
}

/// Stop a collector and release its handle.
///
/// # Safety
///
/// `gc` must be null or a handle from [`rudo_cgc_start`] not yet stopped.
#[no_mangle]
pub unsafe extern "C" fn rudo_cgc_stop(gc: *mut Collector) {
    if gc.is_null() {
        return;
    }
    // SAFETY: the handle came from `Box::into_raw` and is consumed here once.
    let gc = unsafe { Box::from_raw(gc) };
    gc.stop();
}

/// Register a block obtained from `malloc`.
///
/// Returns `ptr`, or null if it could not be registered. In that case the
/// block has already been freed.
///
/// # Safety
///
/// `gc` must be null or a live handle. See [`Collector::add`] for `ptr`.
#[no_mangle]
pub unsafe extern "C" fn rudo_cgc_add(
    gc: *mut Collector,
    ptr: *mut c_void,
    size: usize,
    leaf: c_int,
) -> *mut c_void {
    // SAFETY: forwarded from the caller's contract.
    let Some(gc) = (unsafe { gc.as_mut() }) else {
        return ptr::null_mut();
    };
    let Some(block) = NonNull::new(ptr.cast::<u8>()) else {
        return ptr::null_mut();
    };
    // SAFETY: forwarded from the caller's contract.
    into_raw(unsafe { gc.add(block, size, leaf != 0) })
}

/// Resize a block with `realloc` and track the result.
///
/// Returns null on failure. `ptr` is then no longer tracked.
///
/// # Safety
///
/// `gc` must be null or a live handle. See [`Collector::realloc`] for `ptr`.
#[no_mangle]
pub unsafe extern "C" fn rudo_cgc_realloc(
    gc: *mut Collector,
    ptr: *mut c_void,
    size: usize,
) -> *mut c_void {
    // SAFETY: forwarded from the caller's contract.
    let Some(gc) = (unsafe { gc.as_mut() }) else {
        return ptr::null_mut();
    };
    // SAFETY: forwarded from the caller's contract.
    into_raw(unsafe { gc.realloc(ptr.cast(), size) })
}

/// Allocate and register a block of `size` bytes.
///
/// # Safety
///
/// `gc` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn rudo_cgc_alloc(gc: *mut Collector, size: usize, leaf: c_int) -> *mut c_void {
    // SAFETY: forwarded from the caller's contract.
    let Some(gc) = (unsafe { gc.as_mut() }) else {
        return ptr::null_mut();
    };
    into_raw(gc.alloc(size, leaf != 0))
}

/// Run a full collection.
///
/// # Safety
///
/// `gc` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn rudo_cgc_collect(gc: *mut Collector) {
    // SAFETY: forwarded from the caller's contract.
    if let Some(gc) = unsafe { gc.as_mut() } {
        gc.collect();
    }
}

fn into_raw<E>(result: Result<NonNull<u8>, E>) -> *mut c_void {
    result.map_or(ptr::null_mut(), |block| block.as_ptr().cast())
}

macro_rules! export_binary {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            #[doc = concat!("C export of [`runtime::", stringify!($op), "`].")]
            #[no_mangle]
            pub extern "C" fn $name(a: c_int, b: c_int) -> c_int {
                runtime::$op(a, b)
            }
        )*
    };
}

export_binary! {
    rudo_rt_add => add,
    rudo_rt_sub => sub,
    rudo_rt_div => div,
    rudo_rt_mul => mul,
    rudo_rt_ne => ne,
    rudo_rt_eq => eq,
    rudo_rt_and => and,
    rudo_rt_gt => gt,
    rudo_rt_lt => lt,
}

/// C export of [`runtime::not`].
#[no_mangle]
pub extern "C" fn rudo_rt_not(a: c_int) -> c_int {
    runtime::not(a)
}
