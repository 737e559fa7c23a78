/*!
Reproducible dot-product reductions.

A reduction owns an exception tracker and a superaccumulator. Terms
are pushed one pair at a time; finite products are accumulated
exactly, exceptional products raise tracker flags. Reductions over
disjoint blocks merge exactly, so the blocked and threaded drivers
below are bit-identical to the sequential one for any partition.
*/

use std::thread;

use crate::acc::Superacc;
use crate::binary64::{decode, Decoded};
use crate::exceptions::Exceptions;

/// An in-progress reproducible dot-product reduction.
///
/// The reduction is a multiset operation: pushing the same pairs in
/// any order, or splitting them across several accumulators and
/// merging, always finalizes to the same bits.
#[derive(Clone, Debug)]
pub struct DotAccumulator {
    acc: Superacc,
    flags: Exceptions,
}

impl DotAccumulator {
    /// Constructs an empty reduction.
    pub fn new() -> Self {
        Self {
            acc: Superacc::new(),
            flags: Exceptions::new(),
        }
    }

    /// Accumulates one term `x * y`.
    ///
    /// Finite products are added to the accumulator exactly; NaN
    /// operands, infinities, and `0 * Inf` products only raise
    /// tracker flags.
    pub fn push(&mut self, x: f64, y: f64) {
        match (decode(x), decode(y)) {
            // any NaN operand poisons the reduction
            (Decoded::Nan, _) | (_, Decoded::Nan) => self.flags.record_nan(),
            // Inf * Inf carries the product sign
            (Decoded::PosInfinity, Decoded::PosInfinity)
            | (Decoded::NegInfinity, Decoded::NegInfinity) => self.flags.record_infinity(false),
            (Decoded::PosInfinity, Decoded::NegInfinity)
            | (Decoded::NegInfinity, Decoded::PosInfinity) => self.flags.record_infinity(true),
            // Inf * finite: invalid for zero, else signed infinity
            (Decoded::PosInfinity, Decoded::Real(s, _, c))
            | (Decoded::Real(s, _, c), Decoded::PosInfinity) => {
                if c == 0 {
                    // 0 * Inf is undefined
                    self.flags.record_invalid();
                } else {
                    self.flags.record_infinity(s);
                }
            }
            (Decoded::NegInfinity, Decoded::Real(s, _, c))
            | (Decoded::Real(s, _, c), Decoded::NegInfinity) => {
                if c == 0 {
                    self.flags.record_invalid();
                } else {
                    self.flags.record_infinity(!s);
                }
            }
            // finite * finite: an exact 106-bit product on the grid
            (Decoded::Real(s1, exp1, c1), Decoded::Real(s2, exp2, c2)) => {
                let sig = (c1 as u128) * (c2 as u128);
                self.acc.add_product(s1 != s2, sig, exp1 + exp2);
            }
        }
    }

    /// Merges a block-local reduction into this one. Merging is
    /// exact, so any partition of the terms yields bit-identical
    /// results.
    pub fn merge(&mut self, other: &Self) {
        self.acc.merge(&other.acc);
        self.flags = self.flags.union(&other.flags);
    }

    /// Completes the reduction.
    ///
    /// Exceptional terms take priority; otherwise the accumulator is
    /// rounded to the nearest binary64, ties to even.
    pub fn finalize(&self) -> f64 {
        match self.flags.special() {
            Some(special) => special,
            None => self.acc.round(),
        }
    }

    /// The exception flags raised so far.
    pub fn flags(&self) -> &Exceptions {
        &self.flags
    }

    /// The superaccumulator holding the finite terms.
    pub fn superacc(&self) -> &Superacc {
        &self.acc
    }
}

impl Default for DotAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the reproducible dot product of `x` and `y`.
///
/// The result is the nearest-even rounding of the exact real dot
/// product and is bit-identical for any reordering of the terms.
/// Exceptional inputs follow IEEE 754: any NaN operand or `0 * Inf`
/// term produces the canonical quiet NaN, infinite contributions of a
/// single sign produce that infinity, and mixed infinities produce
/// the canonical quiet NaN. Empty operands produce `+0.0`.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "operands must have equal length");

    let mut sum = DotAccumulator::new();
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        sum.push(xi, yi);
    }
    sum.finalize()
}

/// Computes the dot product in blocks of `block` terms, merging the
/// block-local accumulators. The result is bit-identical to [`dot`]
/// for every block size.
///
/// # Panics
///
/// Panics if the slices have different lengths or `block` is zero.
pub fn dot_blocked(x: &[f64], y: &[f64], block: usize) -> f64 {
    assert_eq!(x.len(), y.len(), "operands must have equal length");
    assert!(block > 0, "block size must be positive");

    let mut total = DotAccumulator::new();
    for (xs, ys) in x.chunks(block).zip(y.chunks(block)) {
        let mut part = DotAccumulator::new();
        for (&xi, &yi) in xs.iter().zip(ys.iter()) {
            part.push(xi, yi);
        }
        total.merge(&part);
    }
    total.finalize()
}

/// Computes the dot product on `threads` scoped threads, one private
/// accumulator per thread. Exact merging makes the result
/// bit-identical to [`dot`] for every thread count.
///
/// # Panics
///
/// Panics if the slices have different lengths or `threads` is zero.
pub fn dot_parallel(x: &[f64], y: &[f64], threads: usize) -> f64 {
    assert_eq!(x.len(), y.len(), "operands must have equal length");
    assert!(threads > 0, "thread count must be positive");

    if x.is_empty() {
        return DotAccumulator::new().finalize();
    }

    let chunk = x.len().div_ceil(threads);
    let parts: Vec<DotAccumulator> = thread::scope(|scope| {
        let handles: Vec<_> = x
            .chunks(chunk)
            .zip(y.chunks(chunk))
            .map(|(xs, ys)| {
                scope.spawn(move || {
                    let mut part = DotAccumulator::new();
                    for (&xi, &yi) in xs.iter().zip(ys.iter()) {
                        part.push(xi, yi);
                    }
                    part
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut total = DotAccumulator::new();
    for part in &parts {
        total.merge(part);
    }
    total.finalize()
}
