//! This module contains the bit-level IEEE-754 operations needed by the binned accumulator,
//! behind the sealed [`Float`] trait, implemented for `f32` and `f64`. The binning scheme only
//! ever inspects a value's *exponent field* and forces its *lowest mantissa bit*; everything
//! else is ordinary floating-point arithmetic, so the surface here is deliberately tiny.
//!
//! Terminology used throughout the crate:
//!
//!   - **Bin / index**: magnitude bands [`WIDTH`](Sealed::WIDTH) bits wide, numbered from 0 at
//!     the *top* of the exponent range down to [`MAX_INDEX`](Sealed::MAX_INDEX) at the bottom.
//!   - **ufp**: "unit in the first place", the power-of-two weight of a value's leading bit.
//!   - **blp**: "bit in the last place", the forced low mantissa bit that makes additions
//!     behave like round-to-odd.

/// The trait for native floating-point formats that can back a binned accumulator (only
/// satisfied by `f32` and `f64`).
///
/// This is a *sealed* type.
pub trait Float: Sealed + crate::reduce::vector::Lanes {}

impl Float for f32 {}
impl Float for f64 {}

/// Actual constants and operations implemented here.
pub trait Sealed:
  core::fmt::Debug + core::fmt::Display +
  Copy + Clone +
  PartialEq + PartialOrd +
  Default +
  core::ops::Add<Self, Output=Self> + core::ops::AddAssign<Self> +
  core::ops::Sub<Self, Output=Self> + core::ops::SubAssign<Self> +
  core::ops::Mul<Self, Output=Self> + core::ops::MulAssign<Self> +
  core::ops::Div<Self, Output=Self> + core::ops::DivAssign<Self> +
  core::ops::Neg<Output=Self> +
  Send + Sync + 'static
{
  /// The widened arithmetic used when converting an accumulator back to a native value (`f64`
  /// for `f32`; a two-float expansion for `f64`).
  type Wide: crate::binned::convert::Wide<Self>;

  /// Mantissa digits including the hidden bit (53 for `f64`, 24 for `f32`).
  const MANT_DIG: u32;
  /// One more than the maximum unbiased exponent (1024 for `f64`, 128 for `f32`).
  const MAX_EXP: i32;
  /// Exponent bias of the format (1023 for `f64`, 127 for `f32`).
  const EXP_BIAS: i32;
  /// Minimum normalised exponent, as in `f64::MIN_EXP`.
  const MIN_EXP: i32;
  /// Value of the biased exponent field for Inf/NaN (all ones).
  const EXP_FIELD_MAX: u32;

  /// Bin width in bits: the spacing between consecutive reference bins.
  ///
  /// Each deposit splits a value across fold terms `WIDTH` bits apart, so the choice trades
  /// the resolved span (`WIDTH × fold` bits) against the deposit count limit below.
  const WIDTH: u32;

  /// Index of the lowest (smallest-magnitude) bin a finite value can fall in.
  const MAX_INDEX: usize;

  /// The maximum number of deposits between renormalisations.
  ///
  /// Each deposit can move a primary term by slightly less than `2^-(MANT_DIG - WIDTH)` of its
  /// ufp; after `ENDURANCE = 2^(MANT_DIG - WIDTH - 2)` of them the term may have drifted a
  /// quarter of its ufp from canonical and must be recentred before it can leave its exponent
  /// window. Exceeding this without a renormalisation silently corrupts the accumulator.
  const ENDURANCE: usize;

  /// `2^-(MANT_DIG - WIDTH + 1)`: deposits into a top-of-range (index 0) accumulator are
  /// pre-multiplied by this so the leading primary term cannot overflow. The exponent is the
  /// smallest that works: compressed, the largest finite value sits exactly as far below the
  /// bin-0 anchor as an ordinary value sits below its own bin's anchor, so the capacity
  /// analysis is unchanged and the residual handed to the second term still fits its window.
  const COMPRESSION: Self;
  /// `2^(MANT_DIG - WIDTH + 1)`: undoes [`COMPRESSION`](Self::COMPRESSION) during conversion.
  const EXPANSION: Self;

  const ZERO: Self;
  const ONE: Self;

  /// Convert a small exact constant (a dyadic rational like `0.25` or `1.75`). Lossless for
  /// every value this crate passes in.
  fn of(x: f64) -> Self;

  /// The raw biased exponent field: `0` for zero and subnormals, [`Self::EXP_FIELD_MAX`] for
  /// Inf/NaN.
  fn exp_field(self) -> u32;

  /// Force the least significant mantissa bit to 1 ("bit in the last place").
  ///
  /// This is the round-to-odd primitive the whole deposit cascade rests on: adding `x.with_blp()`
  /// to a term whose ufp is at least `2^WIDTH` times larger than `|x|` rounds *identically
  /// regardless of the bits below the term's precision*, because the forced odd bit breaks every
  /// round-to-nearest-even tie the same way. The residual `term_before - term_after + x` is then
  /// exactly representable and cascades to the next term. The 1-ulp bias this introduces is
  /// corrected during renormalisation.
  fn with_blp(self) -> Self;

  /// "Unit in the first place": the power-of-two weight of `self`'s leading bit, read straight
  /// from the exponent field. Zero for `0.0` *and* for subnormals (which never occur as primary
  /// terms); infinity for Inf/NaN.
  fn ufp(self) -> Self;

  /// `true` iff the exponent field is all ones (Inf or NaN). Cheaper than
  /// `!self.is_finite()` on some targets and matches how the accumulator tests its own terms.
  fn is_nan_or_inf(self) -> bool;

  fn abs(self) -> Self;
  fn sqrt(self) -> Self;

  /// A power of two near `√|self|`, used as the running scale for sums of squares: `(x/scale)²`
  /// stays inside the finite range for every `|x| ≤ self`, even at the very top of the
  /// exponent range. Returns `2^⌈e/2⌉` where `e` is `self`'s unbiased exponent; `0.0` for zero
  /// input.
  fn scale(self) -> Self;

  /// The reference bin table for this format. See [`crate::binned`].
  fn bins() -> &'static [Self];

  /// Raw bits widened to `u64`, for bit-exact comparisons.
  fn to_bits_u64(self) -> u64;
}

macro_rules! impl_sealed {
  ($f:ty, $bits:ty, $mant:expr, $max_exp:expr, $width:expr, $table:path, $wide:ty) => {
    impl Sealed for $f {
      type Wide = $wide;

      const MANT_DIG: u32 = $mant;
      const MAX_EXP: i32 = $max_exp;
      const EXP_BIAS: i32 = $max_exp - 1;
      const MIN_EXP: i32 = <$f>::MIN_EXP;
      const EXP_FIELD_MAX: u32 = (1 << (<$f>::MAX_EXP.ilog2() + 1)) - 1;

      const WIDTH: u32 = $width;
      const MAX_INDEX: usize = ((Self::MAX_EXP + Self::EXP_BIAS) as usize) / ($width as usize);
      const ENDURANCE: usize = 1 << ($mant - $width - 2);

      // Powers of two, assembled from their exponent bits so they are usable in const context.
      const COMPRESSION: $f =
        <$f>::from_bits(((Self::EXP_BIAS - ($mant - $width + 1)) as $bits) << ($mant - 1));
      const EXPANSION: $f =
        <$f>::from_bits(((Self::EXP_BIAS + ($mant - $width + 1)) as $bits) << ($mant - 1));

      const ZERO: $f = 0.0;
      const ONE: $f = 1.0;

      #[inline(always)]
      fn of(x: f64) -> $f { x as $f }

      #[inline(always)]
      fn exp_field(self) -> u32 {
        ((self.to_bits() >> (Self::MANT_DIG - 1)) as u32) & Self::EXP_FIELD_MAX
      }

      #[inline(always)]
      fn with_blp(self) -> $f {
        <$f>::from_bits(self.to_bits() | 1)
      }

      #[inline(always)]
      fn ufp(self) -> $f {
        <$f>::from_bits(self.to_bits() & ((Self::EXP_FIELD_MAX as $bits) << (Self::MANT_DIG - 1)))
      }

      #[inline(always)]
      fn is_nan_or_inf(self) -> bool {
        self.exp_field() == Self::EXP_FIELD_MAX
      }

      #[inline(always)]
      fn abs(self) -> $f { self.abs() }

      #[inline(always)]
      fn sqrt(self) -> $f { self.sqrt() }

      fn scale(self) -> $f {
        if self == 0.0 { return 0.0 }
        // Subnormals get the smallest normal exponent; precision of the scale is irrelevant,
        // only that it is a deterministic power of two with about half the exponent.
        let e = (self.exp_field().max(1) as i32) - Self::EXP_BIAS;
        let half = (e + 1) >> 1;  // ceiling: the square of MAX / scale must stay finite
        <$f>::from_bits(((half + Self::EXP_BIAS) as $bits) << (Self::MANT_DIG - 1))
      }

      #[inline(always)]
      fn bins() -> &'static [$f] { &$table }

      #[inline(always)]
      fn to_bits_u64(self) -> u64 { self.to_bits() as u64 }
    }
  };
}

impl_sealed!(f32, u32, 24, 128, 13, crate::binned::bins::BINS_F32, f64);
impl_sealed!(f64, u64, 53, 1024, 40, crate::binned::bins::BINS_F64, crate::binned::convert::Dd);
