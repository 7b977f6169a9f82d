//! Registry sizing policy.
//!
//! Table sizes come from a fixed ascending list of prime-like values. Past the
//! end of the list, sizes grow in multiples of its last entry.

/// Ascending table sizes. Mostly primes so that `hash % size` spreads
/// pointer-aligned addresses evenly.
pub const TABLE_SIZES: [usize; 24] = [
    0, 1, 5, 11, 23, 53, 101, 197, 389, 683, 1259, 2417, 4733, 9371, 18617, 37097, 74093, 148_073,
    296_099, 592_019, 1_100_009, 2_200_013, 4_400_021, 8_800_019,
];

/// Slot count needed to hold `items` live entries plus one more at
/// `load_factor`.
///
/// `load_factor` must lie in `(0, 1]`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn ideal_size(items: usize, load_factor: f64) -> usize {
    let target = ((items as f64 + 1.0) / load_factor).ceil() as usize;

    if let Some(&size) = TABLE_SIZES.iter().find(|&&size| size >= target) {
        return size;
    }

    let last = TABLE_SIZES[TABLE_SIZES.len() - 1];
    target.div_ceil(last) * last
}

/// What the registry should do to stay within its load factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// Keep the current table.
    Keep,
    /// Rehash into a table of this many slots.
    To(usize),
}

/// Growth decision, taken after a registration.
#[must_use]
pub fn grow(items: usize, slots: usize, load_factor: f64) -> Resize {
    let ideal = ideal_size(items, load_factor);
    if ideal > slots {
        Resize::To(ideal)
    } else {
        Resize::Keep
    }
}

/// Shrink decision, taken after a sweep or removal.
#[must_use]
pub fn shrink(items: usize, slots: usize, load_factor: f64) -> Resize {
    let ideal = ideal_size(items, load_factor);
    if ideal < slots {
        Resize::To(ideal)
    } else {
        Resize::Keep
    }
}
