pub use glam::*;

/// Round `value` up to the next multiple of `alignment`, which must be a power of two.
#[inline]
pub fn min_value_align_to(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());

    (value + alignment - 1) & !(alignment - 1)
}
