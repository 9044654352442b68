//! Affine row permutation `perm(i) = (R + (2S + 1) * i) mod N` over one block.
//!
//! `N` is always a power of two and `2S + 1` is always odd, so the step is
//! coprime with `N` and `perm` is a bijection on `[0, N)` for every key.
//! Arithmetic is done modulo 2^64 and masked down to `N`, which is exact
//! because `N` divides 2^64, so no key can overflow the formula.

use crate::types::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationTable {
    size: usize,
    mask: u64,
    offset: u64,
    step: u64,
}

impl PermutationTable {
    /// Builds the mapping for a block of `size` rows.
    ///
    /// # Panics
    ///
    /// If `size` is not a power of two. Block decomposition never produces one.
    pub fn build(size: usize, key: Key) -> Self {
        assert!(
            size.is_power_of_two(),
            "block size {} is not a power of two",
            size
        );
        let mask = size as u64 - 1;
        Self {
            size,
            mask,
            offset: key.r as u64 & mask,
            step: key.step() & mask,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset `R mod N`.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Step `(2S + 1) mod N`.
    #[inline]
    pub fn step(&self) -> usize {
        self.step as usize
    }

    #[inline]
    pub fn get(&self, i: usize) -> usize {
        debug_assert!(i < self.size);
        (self.offset.wrapping_add(self.step.wrapping_mul(i as u64)) & self.mask) as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// The inverse mapping, itself affine: `perm⁻¹(j) = step⁻¹ · (j - offset) mod N`.
    pub fn inverse(&self) -> Self {
        let inv = odd_inverse(self.step);
        Self {
            size: self.size,
            mask: self.mask,
            offset: inv.wrapping_mul(self.offset).wrapping_neg() & self.mask,
            step: inv & self.mask,
        }
    }
}

/// Multiplicative inverse of an odd number modulo 2^64 by Newton iteration.
/// Each round doubles the number of correct low bits, starting from 3.
fn odd_inverse(a: u64) -> u64 {
    let mut x = a;
    for _ in 0..5 {
        x = x.wrapping_mul(2u64.wrapping_sub(a.wrapping_mul(x)));
    }
    x
}
