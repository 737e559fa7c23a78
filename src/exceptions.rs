/*!
Tracking of exceptional terms in a reduction.

NaN operands, infinite contributions, and invalid `0 * Inf` products
never touch the accumulator. They are folded into a small set of
monotone flags whose state alone decides the exceptional output, so
exceptional results are independent of term order just like finite
ones.
*/

use crate::binary64::{CANONICAL_NAN, NEG_INF_BITS, POS_INF_BITS};

/// Exception flags raised while scanning the terms of a reduction.
///
/// Flags only transition from false to true, so recording is
/// commutative and the union of two trackers is just the bitwise OR
/// of their flags. `saw_invalid` marks a `0 * Inf` product, which has
/// no useful definable result.
#[derive(Clone, Copy, Debug, Default)]
pub struct Exceptions {
    pub saw_nan: bool,
    pub saw_invalid: bool,
    pub saw_pos_inf: bool,
    pub saw_neg_inf: bool,
}

impl Exceptions {
    /// Constructs a new set of exceptions.
    /// All flags are set to false.
    pub fn new() -> Self {
        Self {
            saw_nan: false,
            saw_invalid: false,
            saw_pos_inf: false,
            saw_neg_inf: false,
        }
    }

    /// Returns true if any flag has been raised.
    pub fn any(&self) -> bool {
        self.saw_nan || self.saw_invalid || self.saw_pos_inf || self.saw_neg_inf
    }

    /// Records a NaN operand.
    pub fn record_nan(&mut self) {
        self.saw_nan = true;
    }

    /// Records an invalid `0 * Inf` product.
    pub fn record_invalid(&mut self) {
        self.saw_invalid = true;
    }

    /// Records an infinite contribution with the given sign
    /// (true for negative).
    pub fn record_infinity(&mut self, sign: bool) {
        if sign {
            self.saw_neg_inf = true;
        } else {
            self.saw_pos_inf = true;
        }
    }

    /// Merges the flags of two trackers.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            saw_nan: self.saw_nan || other.saw_nan,
            saw_invalid: self.saw_invalid || other.saw_invalid,
            saw_pos_inf: self.saw_pos_inf || other.saw_pos_inf,
            saw_neg_inf: self.saw_neg_inf || other.saw_neg_inf,
        }
    }

    /// Resolves the exceptional output mandated by the flags, if any.
    ///
    /// A NaN operand or an invalid product yields the canonical quiet
    /// NaN, as do infinite contributions of both signs; infinite
    /// contributions of a single sign yield that infinity. A clean
    /// tracker yields `None` and the accumulator decides the result.
    pub fn special(&self) -> Option<f64> {
        if self.saw_nan || self.saw_invalid {
            Some(f64::from_bits(CANONICAL_NAN))
        } else if self.saw_pos_inf && self.saw_neg_inf {
            // Inf - Inf is undefined
            Some(f64::from_bits(CANONICAL_NAN))
        } else if self.saw_pos_inf {
            Some(f64::from_bits(POS_INF_BITS))
        } else if self.saw_neg_inf {
            Some(f64::from_bits(NEG_INF_BITS))
        } else {
            None
        }
    }
}
