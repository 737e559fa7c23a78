use std::ops::AddAssign;

use super::number::{Superacc, LIMBS};
use crate::binary64::{EMIN, EXP_MAX};

impl Superacc {
    /// Adds `(-1)^sign * sig * 2^exp` to the accumulator exactly.
    ///
    /// `sig` is an integer significand product of at most 106 bits
    /// and `EMIN <= exp <= 2 * EXP_MAX`, which holds for every product
    /// of two finite binary64 values. Addition is exact: carries
    /// propagate through the whole register and nothing saturates.
    pub fn add_product(&mut self, sign: bool, sig: u128, exp: isize) {
        if sig == 0 {
            return;
        }

        debug_assert!(sig < (1u128 << 106), "significand product too wide");
        debug_assert!(
            exp >= EMIN && exp <= 2 * EXP_MAX,
            "exponent outside the binary64 product range: {}",
            exp
        );

        let shift = (exp - EMIN) as u32;
        let base = (shift / 64) as usize;
        let off = shift % 64;

        // spread `sig << off` across three limb-aligned words
        let words = if off == 0 {
            [sig as u64, (sig >> 64) as u64, 0]
        } else {
            [
                (sig << off) as u64,
                (sig >> (64 - off)) as u64,
                (sig >> (128 - off)) as u64,
            ]
        };

        if sign {
            self.sub_words(base, &words);
        } else {
            self.add_words(base, &words);
        }
    }

    /// Merges another accumulator into this one by exact integer
    /// addition. Any partition of a reduction into blocks, merged in
    /// any order, yields the same accumulator as the sequential scan.
    pub fn merge(&mut self, other: &Self) {
        // two's-complement addition; the final carry falls off the top,
        // which is exact while the true sum stays within the register
        let mut carry = false;
        for i in 0..LIMBS {
            let (sum, c1) = self.limbs[i].overflowing_add(other.limbs[i]);
            let (sum, c2) = sum.overflowing_add(carry as u64);
            self.limbs[i] = sum;
            carry = c1 || c2;
        }
    }

    /// Adds a three-word value at limb offset `base`, rippling the
    /// carry to the top of the register.
    fn add_words(&mut self, base: usize, words: &[u64; 3]) {
        let mut carry = false;
        for (i, &w) in words.iter().enumerate() {
            let (sum, c1) = self.limbs[base + i].overflowing_add(w);
            let (sum, c2) = sum.overflowing_add(carry as u64);
            self.limbs[base + i] = sum;
            carry = c1 || c2;
        }

        let mut i = base + 3;
        while carry && i < LIMBS {
            let (sum, c) = self.limbs[i].overflowing_add(1);
            self.limbs[i] = sum;
            carry = c;
            i += 1;
        }
    }

    /// Subtracts a three-word value at limb offset `base`, rippling
    /// the borrow to the top of the register.
    fn sub_words(&mut self, base: usize, words: &[u64; 3]) {
        let mut borrow = false;
        for (i, &w) in words.iter().enumerate() {
            let (diff, b1) = self.limbs[base + i].overflowing_sub(w);
            let (diff, b2) = diff.overflowing_sub(borrow as u64);
            self.limbs[base + i] = diff;
            borrow = b1 || b2;
        }

        let mut i = base + 3;
        while borrow && i < LIMBS {
            let (diff, b) = self.limbs[i].overflowing_sub(1);
            self.limbs[i] = diff;
            borrow = b;
            i += 1;
        }
    }
}

impl AddAssign<&Superacc> for Superacc {
    fn add_assign(&mut self, rhs: &Superacc) {
        self.merge(rhs);
    }
}
