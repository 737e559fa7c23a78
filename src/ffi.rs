/*!
C ABI surface.

Declares `ddot_repro` with the signature in `include/reprodot.h`:

```c
double ddot_repro(const double *x, const double *y, size_t n);
```
*/

use std::slice;

use crate::binary64::CANONICAL_NAN;
use crate::dot::dot;

/// Computes the reproducible dot product over raw buffers.
///
/// Returns `+0.0` when `n` is zero and the canonical quiet NaN when
/// either pointer is null with `n > 0`; the function never signals
/// out of band.
///
/// # Safety
///
/// Non-null `x` and `y` must point to `n` readable doubles. The
/// buffers may alias each other but not the caller's result storage.
#[no_mangle]
pub unsafe extern "C" fn ddot_repro(x: *const f64, y: *const f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if x.is_null() || y.is_null() {
        return f64::from_bits(CANONICAL_NAN);
    }

    dot(slice::from_raw_parts(x, n), slice::from_raw_parts(y, n))
}
