use std::cmp::max;

use super::number::{Superacc, LIMBS};
use crate::binary64::{EMAX, EMIN, EXP_SUBNORMAL, NEG_INF_BITS, POS_INF_BITS, PRECISION};
use crate::util::bitmask;

// grid position of the lowest subnormal digit: bit `EXP_SUBNORMAL - EMIN`
const SUBNORMAL_POS: u32 = (EXP_SUBNORMAL - EMIN) as u32;

impl Superacc {
    /// Rounds the accumulator to the nearest binary64, ties to even.
    ///
    /// This is a pure function of the accumulated integer: two
    /// accumulators holding the same integer produce the same bits.
    /// A zero accumulator rounds to `+0.0`, values beyond the finite
    /// range round to the infinity of the accumulator's sign, and
    /// results below the normal range are subnormalized.
    pub fn round(&self) -> f64 {
        if self.is_zero() {
            // an empty or exactly cancelled sum is +0.0
            return 0.0;
        }

        let sign = self.is_negative();
        let mag = self.magnitude();

        // step 1: locate the leading digit and the lowest digit kept;
        // the subnormal cutoff clamps the window from below
        let k = leading_bit(&mag);
        let mut n = max(k as isize - (PRECISION as isize - 1), SUBNORMAL_POS as isize) as u32;

        // step 2: truncated significand and rounding bits
        let mut c = window(&mag, n);
        let halfway_bit = test_bit(&mag, n - 1);
        let sticky_bit = any_below(&mag, n - 1);

        // step 3: correct if needed
        if round_increment(c, halfway_bit, sticky_bit) {
            c += 1;
            if c == (1 << PRECISION) {
                // carried into a wider significand:
                // shift one digit down and move the window up
                c >>= 1;
                n += 1;
            }
        }

        encode(sign, n, c)
    }
}

/// Given the truncated significand and rounding bits, should the
/// truncated result be incremented? (nearest, ties to even)
fn round_increment(c: u64, halfway_bit: bool, sticky_bit: bool) -> bool {
    match (halfway_bit, sticky_bit) {
        (false, _) => {
            // below the halfway point => truncate
            false
        }
        (true, true) => {
            // above the halfway point => increment
            true
        }
        (true, false) => {
            // exactly halfway => increment if odd
            (c & 1) == 1
        }
    }
}

/// Assembles the binary64 with significand `c` whose lowest digit
/// sits at grid position `n`, overflowing to signed infinity.
fn encode(sign: bool, n: u32, c: u64) -> f64 {
    debug_assert!(c < (1 << PRECISION));

    let bits = if c >= (1 << (PRECISION - 1)) {
        // normal result
        let e = n as isize + EMIN + (PRECISION as isize - 1);
        if e > EMAX {
            return f64::from_bits(if sign { NEG_INF_BITS } else { POS_INF_BITS });
        }
        let biased = (e + EMAX) as u64;
        (biased << (PRECISION - 1)) | (c & bitmask(PRECISION - 1))
    } else {
        // subnormal result: the window was clamped at the subnormal
        // cutoff, so `c` drops into the fraction field unscaled
        c
    };

    f64::from_bits(bits | ((sign as u64) << 63))
}

/// Index of the most significant set bit.
fn leading_bit(limbs: &[u64; LIMBS]) -> u32 {
    for i in (0..LIMBS).rev() {
        if limbs[i] != 0 {
            return (i as u32) * 64 + (63 - limbs[i].leading_zeros());
        }
    }
    panic!("zero register has no leading digit");
}

/// The 53-bit window of digits starting at bit `n`.
fn window(limbs: &[u64; LIMBS], n: u32) -> u64 {
    let idx = (n / 64) as usize;
    let off = n % 64;

    let mut w = limbs[idx] >> off;
    if off != 0 && idx + 1 < LIMBS {
        w |= limbs[idx + 1] << (64 - off);
    }
    w & bitmask(PRECISION)
}

/// Tests the digit at bit `n`.
fn test_bit(limbs: &[u64; LIMBS], n: u32) -> bool {
    (limbs[(n / 64) as usize] >> (n % 64)) & 1 != 0
}

/// Returns true if any digit strictly below bit `n` is set.
fn any_below(limbs: &[u64; LIMBS], n: u32) -> bool {
    let idx = (n / 64) as usize;
    let off = n % 64;

    for &limb in &limbs[..idx] {
        if limb != 0 {
            return true;
        }
    }
    off != 0 && (limbs[idx] & bitmask(off)) != 0
}
