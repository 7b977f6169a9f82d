use libc::c_void;

pub unsafe fn malloc(size: usize) -> *mut u8 {
    unsafe { libc::malloc(size).cast::<u8>() }
}

pub unsafe fn calloc(count: usize, size: usize) -> *mut u8 {
    unsafe { libc::calloc(count, size).cast::<u8>() }
}

pub unsafe fn realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    unsafe { libc::realloc(ptr.cast::<c_void>(), size).cast::<u8>() }
}

pub unsafe fn free(ptr: *mut u8) {
    unsafe { libc::free(ptr.cast::<c_void>()) }
}
