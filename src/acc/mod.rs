/*!
The superaccumulator: a wide fixed-point integer register covering
the full exponent range of binary64 products, enabling exact
summation.

This module implements the accumulator storage type [`Superacc`],
its exact update operations, and the correctly rounded conversion
back to a binary64.
*/

mod number;
mod ops;
mod round;

pub use number::Superacc;
