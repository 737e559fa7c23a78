/*!
`reprodot` computes a reproducible double-precision dot product:
given two equal-length slices of binary64 values, it returns the
nearest-even rounding of the exact real-number dot product, and the
result is bit-identical for any reordering, reblocking, or threading
of the reduction.

Reproducibility comes from exact arithmetic. Each operand is decoded
into an integer significand/exponent pair ([`decode`]), each product
is formed exactly as a 106-bit integer, and every product is added
into a wide fixed-point integer register — the superaccumulator
[`Superacc`] — whose grid covers the full exponent range of binary64
products. Integer addition is associative and commutative, so the
accumulated value does not depend on the order of the terms; a single
correctly rounded conversion at the end produces the answer.

Exceptional operands (NaN, infinities, `0 * Inf` products) never reach
the accumulator. They are recorded in an [`Exceptions`] tracker whose
flags decide the output ahead of rounding, so exceptional results are
bit-reproducible too.

The top-level entry points are [`dot`], [`dot_blocked`], and
[`dot_parallel`]; all three produce identical bits. The same kernel is
exported under a C ABI as `ddot_repro` (see the [`ffi`] module).
*/

pub mod acc;
pub mod binary64;
pub mod dot;
pub mod exceptions;
pub mod ffi;

mod util;

pub use crate::acc::Superacc;
pub use crate::binary64::{decode, Decoded};
pub use crate::dot::{dot, dot_blocked, dot_parallel, DotAccumulator};
pub use crate::exceptions::Exceptions;
