//! This module contains the binned accumulator, the core of the crate.
//!
//! A [`Binned`] represents a running sum as `FOLD` floating-point *primary* terms plus `FOLD`
//! *carry* counters. Primary term `i` is anchored to entry `index + i` of a per-format table of
//! reference magnitudes (the *bins*, one every [`WIDTH`](crate::float::Sealed::WIDTH) bits of
//! exponent); it stores the canonical bin value plus an accumulated offset, so consecutive terms
//! capture successively finer slices of the sum. The anchor `index` is never stored: it is
//! recomputed from the exponent field of `primary[0]` whenever needed.
//!
//! The life of an accumulator:
//!
//!   - it starts as exact zero ([`Binned::zero`]; `primary[0] == 0.0` if and only if the
//!     accumulator is exact zero, whatever the carries say);
//!   - [`Binned::update`] anchors it for an upper bound on the magnitudes about to be summed;
//!   - [`Binned::deposit`] folds values in, cheaply, at most
//!     [`ENDURANCE`](crate::float::Sealed::ENDURANCE) times in a row;
//!   - [`Binned::renorm`] recentres the primaries and absorbs the drift into the carries,
//!     restoring the canonical form that makes the state a function of the deposited *multiset*
//!     only;
//!   - [`Binned::value`] converts back to a native float, [`Binned::add_binned`] merges two
//!     accumulators, and the wire form ([`Binned::write_slots`]) ships one across processes.
//!
//! NaN and ±Inf short-circuit the binning entirely: they land in `primary[0]` via ordinary
//! floating-point addition and from then on every operation passes them through, so the final
//! result matches what native IEEE arithmetic would have produced.

use crate::float::{Float, Sealed};

/// A binned floating-point accumulator with `FOLD` terms over the native format `F`.
///
/// `FOLD` trades accuracy for speed: each extra term resolves another
/// [`WIDTH`](crate::float::Sealed::WIDTH) bits below the largest deposited magnitude, and costs
/// one more floating-point add per deposit. `FOLD` must be between 1 and [`crate::MAX_FOLD`];
/// [`crate::DEFAULT_FOLD`] is the usual sweet spot.
///
/// Two accumulators can only combine if they have the same `FOLD` and format, which the types
/// already guarantee; results are only comparable between identical `FOLD`s.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Binned<const FOLD: usize, F: Float> {
  pub(crate) primary: [F; FOLD],
  pub(crate) carry: [F; FOLD],
}

/// The reference bin tables.
pub(crate) mod bins;

/// Sizes, zeroing, index queries, wire form.
mod basics;

/// Re-anchoring for a new magnitude bound.
mod update;

/// The compensated deposit cascade.
mod deposit;

/// Renormalisation back to canonical form.
mod renorm;

/// Conversion to and from native floats.
pub(crate) mod convert;

/// Accumulator-accumulator operations: add, negate, rescale.
mod ops;
