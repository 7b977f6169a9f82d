use std::ffi::c_void;

use windows_sys::Win32::System::Memory::{
    GetProcessHeap, HeapAlloc, HeapFree, HeapReAlloc, HEAP_ZERO_MEMORY,
};

pub unsafe fn malloc(size: usize) -> *mut u8 {
    unsafe { HeapAlloc(GetProcessHeap(), 0, size).cast::<u8>() }
}

pub unsafe fn calloc(count: usize, size: usize) -> *mut u8 {
    // The caller has already checked the product for overflow.
    unsafe { HeapAlloc(GetProcessHeap(), HEAP_ZERO_MEMORY, count * size).cast::<u8>() }
}

pub unsafe fn realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    // HeapReAlloc does not accept a null block.
    if ptr.is_null() {
        return unsafe { malloc(size) };
    }
    unsafe { HeapReAlloc(GetProcessHeap(), 0, ptr.cast::<c_void>(), size).cast::<u8>() }
}

pub unsafe fn free(ptr: *mut u8) {
    unsafe {
        HeapFree(GetProcessHeap(), 0, ptr.cast::<c_void>());
    }
}
