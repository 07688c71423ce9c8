//! This crate computes *reproducible* floating-point reductions: sums, dot products, norms, and
//! absolute-value sums whose results are **bit-identical** regardless of summation order, data
//! partitioning, thread count, or SIMD width. Plain floating-point addition is not associative,
//! so a parallel sum and a serial sum of the same data generally disagree in the last few bits;
//! this crate makes them agree in *every* bit.
//!
//! # How it works
//!
//! The workhorse is the [`Binned`] accumulator: a small fixed number of floating-point terms
//! (the *fold*), each anchored to a "bin" from a per-format table of reference magnitudes spaced
//! 40 bits apart (13 for `f32`). Values are *deposited* into the accumulator with a branch-free
//! compensated cascade built on a forced-low-mantissa-bit ("round-to-odd") trick, which makes
//! each addition an exact, order-insensitive transformation. Because the final accumulator state
//! depends only on the *multiset* of deposited values (and the anchoring bound), any two
//! reduction orders produce the same bits.
//!
//! # Usage
//!
//! ```
//! // One-shot reductions over slices.
//! let x = [1.0e16, 1.0, -1.0e16, 1.0];
//! assert_eq!(binsum::sum(&x), 2.0);
//!
//! // Partial reductions combine associatively: reduce each slice separately, add the
//! // accumulators in any order, and the result is bit-identical to one big reduction.
//! use binsum::{Binned, Strided, reduce};
//! let bound = 1.0e16;  // any bound ≥ the largest |x[i]|, shared by all partials
//! let mut a = Binned::<3, f64>::zero();
//! let mut b = Binned::<3, f64>::zero();
//! a.update(bound);
//! b.update(bound);
//! reduce::sum_into(Strided::from_slice(&x[..2]), &mut a);
//! reduce::sum_into(Strided::from_slice(&x[2..]), &mut b);
//! a += &b;
//! assert_eq!(a.value(), 2.0);
//! ```
//!
//! # Caveats
//!
//! Reproducibility holds for a fixed fold and the default IEEE-754 round-to-nearest-even mode;
//! results differ (deterministically) between folds. The accumulator is *not* arbitrary
//! precision: each fold term spans one bin width, so a fold-`k` accumulator resolves roughly
//! `40·k` bits below the largest deposited magnitude (`13·k` for `f32`).

mod float;
mod binned;
mod complex;
mod strided;
pub mod reduce;

pub use float::Float;
pub use binned::Binned;
pub use complex::BinnedComplex;
pub use strided::Strided;
pub use reduce::{sum, asum, nrm2, dot, csum, casum, cnrm2, cdotu, cdotc};

/// The fold used by the slice-level convenience reductions ([`sum`], [`dot`], ...).
pub const DEFAULT_FOLD: usize = 3;

/// The largest supported fold. Higher folds resolve more bits below the leading magnitude at a
/// proportional cost per deposit.
pub const MAX_FOLD: usize = 4;

/// Binned single precision with the default fold.
#[allow(non_camel_case_types)]
pub type sbinned = Binned<DEFAULT_FOLD, f32>;

/// Binned double precision with the default fold.
#[allow(non_camel_case_types)]
pub type dbinned = Binned<DEFAULT_FOLD, f64>;

/// Binned complex single precision with the default fold.
#[allow(non_camel_case_types)]
pub type cbinned = BinnedComplex<DEFAULT_FOLD, f32>;

/// Binned complex double precision with the default fold.
#[allow(non_camel_case_types)]
pub type zbinned = BinnedComplex<DEFAULT_FOLD, f64>;


/// Re-export some internals for benchmarking purposes, only on `feature = "bench"`.
#[cfg(feature = "bench")]
pub mod bench;
