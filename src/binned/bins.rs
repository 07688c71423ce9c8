//! The reference bin tables: one immutable array per format, covering the full exponent range
//! in steps of [`WIDTH`](Sealed::WIDTH) bits.
//!
//! Entry `i` is the canonical "empty" primary term for bin `i`: `1.5 × 2^q(i)`, a value whose
//! offset-from-canonical is zero. Entry 0 sits at the very top of the exponent range
//! (`1.5 × 2^(MAX_EXP-1)`); entries 1.. descend by `WIDTH` bits each, starting high enough that
//! a primary anchored at bin `i` can absorb any value from bin `i` without leaving its own
//! exponent window. The descent stops at `1.5 × 2^(MIN_EXP-1)`, the finest anchor that is
//! still a *normal* number: its ulp is the smallest subnormal, so the term below the stop
//! resolves values all the way down to the bottom of the format, and descending further would
//! only produce anchors whose own representation degrades. Tail entries (reached by the
//! trailing terms of bottom-anchored accumulators) repeat the stop value.
//!
//! The tables are built entirely in const context from exponent bit patterns, so there is no
//! initialisation order to worry about: they are plain `static` data, readable from any thread
//! from the first instruction of the program.

use crate::float::{Float, Sealed};

/// Table length: one entry per anchorable index, plus the replicated tail the highest anchor's
/// trailing terms reach into.
const fn table_len(max_index: usize) -> usize {
  max_index + crate::MAX_FOLD + 1
}

macro_rules! build_table {
  ($f:ty, $bits:ty, $len:expr) => {{
    // 1.5 × 2^q assembled as bits: biased exponent field, and the top fraction bit set.
    const fn entry(q: i32) -> $f {
      <$f>::from_bits(
        (((q + <$f>::EXP_BIAS) as $bits) << (<$f>::MANT_DIG - 1)) | (1 << (<$f>::MANT_DIG - 2)),
      )
    }
    // Bin 0 tops out the exponent range; bins 1.. descend by WIDTH from just-above-bin-1's
    // values (MANT_DIG - WIDTH bits of headroom over the largest value in the bin), flooring
    // at the last normal anchor.
    const TOP: i32 = <$f>::MAX_EXP - 1;
    const STEP0: i32 = <$f>::MAX_EXP + <$f>::MANT_DIG as i32 - 2 * <$f>::WIDTH as i32;
    const FLOOR: i32 = <$f>::MIN_EXP - 1;
    let mut table = [0.0; $len];
    table[0] = entry(TOP);
    let mut i = 1;
    while i < $len {
      let q = STEP0 - ((i - 1) as i32) * (<$f>::WIDTH as i32);
      table[i] = entry(if q < FLOOR { FLOOR } else { q });
      i += 1;
    }
    table
  }};
}

pub(crate) static BINS_F64: [f64; table_len(<f64 as Sealed>::MAX_INDEX)] =
  build_table!(f64, u64, table_len(<f64 as Sealed>::MAX_INDEX));

pub(crate) static BINS_F32: [f32; table_len(<f32 as Sealed>::MAX_INDEX)] =
  build_table!(f32, u32, table_len(<f32 as Sealed>::MAX_INDEX));

/// The bin index a *value* falls in, from its exponent field alone: 0 for the largest
/// magnitudes (and Inf/NaN), [`MAX_INDEX`](Sealed::MAX_INDEX) for subnormals. Zero maps to
/// index 0 by convention; it never influences anchoring because a zero bound never anchors
/// anything (see [`Binned::update`](super::Binned::update)).
#[inline]
pub(crate) fn index_of<F: Float>(x: F) -> usize {
  let e = x.exp_field() as usize;
  if e == 0 {
    if x == F::ZERO { 0 } else { F::MAX_INDEX }
  } else {
    ((F::MAX_EXP + F::EXP_BIAS) as usize - e) / F::WIDTH as usize
  }
}

/// The anchor index of an accumulator, from the exponent field of its leading primary term.
/// Well-formed nonzero accumulators keep `primary[0]` normal, so the subnormal case only
/// defends against garbage.
#[inline]
pub(crate) fn primary_index<F: Float>(pri0: F) -> usize {
  let e = pri0.exp_field() as usize;
  if e == 0 {
    F::MAX_INDEX
  } else {
    ((F::MAX_EXP + F::MANT_DIG as i32 - F::WIDTH as i32 + F::EXP_BIAS) as usize - e)
      / F::WIDTH as usize
  }
}
