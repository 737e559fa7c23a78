use num_traits::Zero;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rug::{Float, Integer};

use reprodot::binary64::{EMIN, EXP_MAX};
use reprodot::{DotAccumulator, Superacc};

/// A random term on the accumulator grid: a signed significand of at
/// most 106 bits and an exponent a binary64 product could carry.
fn random_term(rng: &mut StdRng) -> (bool, u128, isize) {
    let lo = rng.random::<u64>() as u128;
    let hi = (rng.random::<u64>() & ((1 << 42) - 1)) as u128;
    let sig = lo | (hi << 64);
    let exp = rng.random_range(EMIN as i64..=2 * EXP_MAX as i64) as isize;
    (rng.random::<bool>(), sig, exp)
}

/// The accumulated integer matches the big-integer model term by term.
#[test]
fn integer_model() {
    let mut rng = StdRng::seed_from_u64(0xacc0);
    let mut acc = Superacc::new();
    let mut model = Integer::zero();

    assert_eq!(acc.to_integer(), model, "empty accumulator is zero");
    assert!(acc.is_zero() && !acc.is_negative());

    for i in 0..1000 {
        let (sign, sig, exp) = random_term(&mut rng);
        acc.add_product(sign, sig, exp);

        let term = Integer::from(sig) << ((exp - EMIN) as u32);
        if sign {
            model -= term;
        } else {
            model += term;
        }

        assert_eq!(
            acc.to_integer(),
            model,
            "accumulator diverged from the integer model after {} terms",
            i + 1
        );
    }
}

/// Single-term sanity checks at the corners of the grid.
#[test]
fn grid_corners() {
    // the smallest product: 2^-1074 * 2^-1074
    let mut acc = Superacc::new();
    acc.add_product(false, 1, EMIN);
    assert_eq!(acc.to_integer(), Integer::from(1));

    // exact cancellation back to zero
    acc.add_product(true, 1, EMIN);
    assert!(acc.is_zero(), "1 - 1 should cancel exactly");

    // the widest value at the top of the product range
    let mut acc = Superacc::new();
    acc.add_product(true, (1 << 106) - 1, 2 * EXP_MAX);
    assert!(acc.is_negative());
    let expected = -(Integer::from((1u128 << 106) - 1) << ((2 * EXP_MAX - EMIN) as u32));
    assert_eq!(acc.to_integer(), expected);
}

/// The reduction exposes its tracker and register for inspection.
#[test]
fn tracker_and_register_views() {
    let mut sum = DotAccumulator::new();
    sum.push(1.5, 2.0);
    sum.push(-0.5, 4.0);

    // a clean reduction raises no flags and holds 3 - 2 = 1 exactly
    assert!(!sum.flags().any(), "clean reduction raised a flag");
    assert!(!sum.superacc().is_zero());
    assert_eq!(
        sum.superacc().to_integer(),
        Integer::from(1) << ((-EMIN) as u32),
        "mismatched register"
    );

    // an infinite term only raises its flag; the register is untouched
    let register = sum.superacc().clone();
    sum.push(f64::INFINITY, -2.0);
    assert!(sum.flags().any() && sum.flags().saw_neg_inf);
    assert!(!sum.flags().saw_nan && !sum.flags().saw_pos_inf);
    assert_eq!(
        sum.superacc(),
        &register,
        "exceptional term touched the register"
    );

    // merging unions the flags of both trackers
    let mut other = DotAccumulator::new();
    other.push(f64::NAN, 1.0);
    assert!(other.flags().saw_nan && other.superacc().is_zero());
    sum.merge(&other);
    assert!(sum.flags().saw_nan && sum.flags().saw_neg_inf);
}

/// Any insertion order yields the same register.
#[test]
fn order_independence() {
    let mut rng = StdRng::seed_from_u64(0x0bde);
    let terms: Vec<_> = (0..300).map(|_| random_term(&mut rng)).collect();

    let mut forward = Superacc::new();
    for &(sign, sig, exp) in &terms {
        forward.add_product(sign, sig, exp);
    }

    let mut shuffled = terms.clone();
    shuffled.shuffle(&mut rng);
    let mut backward = Superacc::new();
    for &(sign, sig, exp) in &shuffled {
        backward.add_product(sign, sig, exp);
    }

    assert_eq!(forward, backward, "term order changed the register");
}

/// Merging block-local registers equals the sequential scan,
/// for any partition and any merge order.
#[test]
fn merge_blocks() {
    let mut rng = StdRng::seed_from_u64(0x3e76);
    let terms: Vec<_> = (0..256).map(|_| random_term(&mut rng)).collect();

    let mut sequential = Superacc::new();
    for &(sign, sig, exp) in &terms {
        sequential.add_product(sign, sig, exp);
    }

    for block in [1, 7, 64, 300] {
        let mut parts: Vec<Superacc> = terms
            .chunks(block)
            .map(|chunk| {
                let mut part = Superacc::new();
                for &(sign, sig, exp) in chunk {
                    part.add_product(sign, sig, exp);
                }
                part
            })
            .collect();
        parts.shuffle(&mut rng);

        let mut merged = Superacc::new();
        for part in &parts {
            merged.merge(part);
        }
        assert_eq!(
            merged, sequential,
            "blocked reduction (block = {}) changed the register",
            block
        );
    }
}

/// The `rug::Float` view is exact.
#[test]
fn float_view() {
    let zero = Float::from(&Superacc::new());
    assert!(zero.is_zero(), "empty accumulator views as zero");

    let mut rng = StdRng::seed_from_u64(0xf10a);
    let mut acc = Superacc::new();
    for _ in 0..100 {
        let (sign, sig, exp) = random_term(&mut rng);
        acc.add_product(sign, sig, exp);
    }

    let expected = Float::with_val(4400, acc.to_integer()) << (EMIN as i32);
    assert_eq!(Float::from(&acc), expected, "float view must not round");
}

/// The exact dot product of `x` and `y` as a wide `rug::Float`.
/// Each product is exact in 106 bits and the running sum is exact at
/// this precision for the exponent ranges used here.
fn mpfr_dot(x: &[f64], y: &[f64]) -> Float {
    let mut sum = Float::with_val(4400, 0);
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let fx = Float::with_val(53, xi);
        let fy = Float::with_val(53, yi);
        sum += Float::with_val(106, &fx * &fy);
    }
    sum
}

/// Rounding the register agrees with MPFR over random vectors.
#[test]
fn round_matches_mpfr() {
    let mut rng = StdRng::seed_from_u64(0x4071);

    for trial in 0..200 {
        let n = rng.random_range(1..=50);
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for _ in 0..n {
            // wide exponent spread forces heavy cancellation
            x.push(rng.random_range(-1.0..1.0) * 2f64.powi(rng.random_range(-160..160)));
            y.push(rng.random_range(-1.0..1.0) * 2f64.powi(rng.random_range(-160..160)));
        }

        let mut sum = DotAccumulator::new();
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            sum.push(xi, yi);
        }

        let expected = mpfr_dot(&x, &y).to_f64();
        let actual = sum.finalize();
        assert_eq!(
            actual.to_bits(),
            expected.to_bits(),
            "trial {}: expected {:e}, actual {:e}",
            trial,
            expected,
            actual
        );
    }
}
