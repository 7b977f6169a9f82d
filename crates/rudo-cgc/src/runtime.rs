//! Integer helpers called directly by generated code.
//!
//! All operations work on C `int`. Arithmetic wraps in two's complement,
//! and every predicate returns 0 or 1 with zero meaning false. `and` is
//! strict: generated code evaluates both operands before the call.

use std::ffi::c_int;

/// `a + b`
pub extern "C" fn add(a: c_int, b: c_int) -> c_int {
    a.wrapping_add(b)
}

/// `a - b`
pub extern "C" fn sub(a: c_int, b: c_int) -> c_int {
    a.wrapping_sub(b)
}

/// `a / b`, truncating toward zero.
///
/// # Panics
///
/// Division by zero traps, like the native instruction would. `INT_MIN / -1`
/// wraps to `INT_MIN`.
pub extern "C" fn div(a: c_int, b: c_int) -> c_int {
    a.wrapping_div(b)
}

/// `a * b`
pub extern "C" fn mul(a: c_int, b: c_int) -> c_int {
    a.wrapping_mul(b)
}

/// `a != b`
pub extern "C" fn ne(a: c_int, b: c_int) -> c_int {
    c_int::from(a != b)
}

/// `a == b`
pub extern "C" fn eq(a: c_int, b: c_int) -> c_int {
    c_int::from(a == b)
}

/// `!a`
pub extern "C" fn not(a: c_int) -> c_int {
    c_int::from(a == 0)
}

/// `a && b`, without short-circuiting.
pub extern "C" fn and(a: c_int, b: c_int) -> c_int {
    c_int::from(a != 0 && b != 0)
}

/// `a > b`
pub extern "C" fn gt(a: c_int, b: c_int) -> c_int {
    c_int::from(a > b)
}

/// `a < b`
pub extern "C" fn lt(a: c_int, b: c_int) -> c_int {
    c_int::from(a < b)
}
