use std::cmp::max;

use rug::integer::Order;
use rug::{Float, Integer};

use gmp_mpfr_sys::gmp::mpz_t;
use gmp_mpfr_sys::mpfr;

use crate::binary64::{EMIN, EXP_MAX};

/// Number of 64-bit limbs in the accumulator.
pub(crate) const LIMBS: usize = 67;

/// Total width of the accumulator in bits.
pub(crate) const ACC_BITS: u32 = 64 * LIMBS as u32;

// the register must absorb the widest product (106 bits of
// significand, one sign bit) plus 2^91 terms of headroom
const _: () = assert!(ACC_BITS as isize >= (2 * EXP_MAX - EMIN) + 107 + 91);

/// A superaccumulator for binary64 products.
///
/// The accumulator is a single two's-complement integer `A` stored as
/// little-endian 64-bit limbs and interpreted in fixed-point units of
/// `2^EMIN`, so the represented real value is `A * 2^EMIN`. Every
/// product of two finite binary64 values lands on this grid with a
/// nonnegative shift, and each update is exact integer addition, so
/// the accumulated value is invariant under reordering and reblocking
/// of the terms.
///
/// A single product occupies at most bit 4196 of the grid (a 106-bit
/// significand product shifted by at most `971 + 971 - EMIN`), so the
/// 4288-bit register absorbs up to `2^91` terms without overflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Superacc {
    pub(crate) limbs: [u64; LIMBS],
}

impl Superacc {
    /// Constructs the zero accumulator.
    pub fn new() -> Self {
        Self { limbs: [0; LIMBS] }
    }

    /// Returns true if the accumulated integer is zero.
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&limb| limb == 0)
    }

    /// Returns true if the accumulated integer is negative.
    pub fn is_negative(&self) -> bool {
        (self.limbs[LIMBS - 1] >> 63) != 0
    }

    /// The magnitude of the accumulated integer as limbs.
    pub(crate) fn magnitude(&self) -> [u64; LIMBS] {
        let mut mag = self.limbs;
        if self.is_negative() {
            // two's-complement negation: invert, then add one
            let mut carry = true;
            for limb in mag.iter_mut() {
                let (v, c) = (!*limb).overflowing_add(carry as u64);
                *limb = v;
                carry = c;
            }
        }
        mag
    }

    /// The exact accumulated integer, in units of `2^EMIN`.
    pub fn to_integer(&self) -> Integer {
        let c = Integer::from_digits(&self.magnitude()[..], Order::Lsf);
        if self.is_negative() {
            -c
        } else {
            c
        }
    }
}

impl Default for Superacc {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Superacc> for Float {
    /// Converts the accumulator to the exact [`Float`] value
    /// `A * 2^EMIN`. The conversion never rounds.
    fn from(acc: &Superacc) -> Self {
        let m = acc.to_integer();
        if m.is_zero() {
            Float::with_val(rug::float::prec_min(), 0)
        } else {
            let mut f = Float::new(max(1, m.significant_bits()));
            let rnd = mpfr::rnd_t::RNDN;

            unsafe {
                // set `f` to `m * 2^EMIN`
                let src_ptr = m.as_raw() as *const mpz_t;
                let dest_ptr = f.as_raw_mut();
                let t = mpfr::set_z_2exp(dest_ptr, src_ptr, EMIN as i64, rnd);
                assert_eq!(t, 0, "should have been exact");
            }

            f
        }
    }
}
