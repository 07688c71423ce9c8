use super::*;

/// The widened arithmetic used to sum fold contributions during conversion.
///
/// The contributions span up to `WIDTH × FOLD` bits, more than one native float holds, so the
/// running total needs extra precision: `f32` conversions run in plain `f64` (plenty of both
/// precision and range), `f64` conversions in a two-float expansion ([`Dd`]). Only determinism
/// is load-bearing here (the total is a fixed function of the canonical accumulator state
/// either way), but the extra precision is what makes single-value round-trips exact.
pub trait Wide<F>: Copy {
  const ZERO: Self;
  fn accum(&mut self, term: F);
  fn finish(self) -> F;
  /// As [`finish`](Self::finish), scaling by [`EXPANSION`](crate::float::Sealed::EXPANSION)
  /// on the way out (exact, or ±Inf if the true total overflows the native range).
  fn finish_expanded(self) -> F;
}

impl Wide<f32> for f64 {
  const ZERO: f64 = 0.0;

  #[inline]
  fn accum(&mut self, term: f32) {
    *self += term as f64;
  }

  #[inline]
  fn finish(self) -> f32 {
    self as f32
  }

  #[inline]
  fn finish_expanded(self) -> f32 {
    (self * <f32 as Sealed>::EXPANSION as f64) as f32
  }
}

/// An unevaluated sum of two `f64`s, `hi + lo`, with `hi = fl(hi + lo)`.
#[derive(Clone, Copy)]
pub struct Dd {
  hi: f64,
  lo: f64,
}

impl Wide<f64> for Dd {
  const ZERO: Dd = Dd { hi: 0.0, lo: 0.0 };

  /// Add a double to the expansion, error-free up to the final renormalisation: a two-sum of
  /// `b` against `hi`, its error folded into `lo` with a second two-sum, then the pair
  /// recombined so `hi` stays the correctly rounded total.
  fn accum(&mut self, b: f64) {
    let s1 = self.hi + b;
    let q = s1 - self.hi;
    let s2 = (b - q) + (self.hi - (s1 - q));

    let t1 = self.lo + s2;
    let q = t1 - self.lo;
    let mut t2 = (s2 - q) + (self.lo - (t1 - q));

    let s2 = t1;
    let t1 = s1 + s2;
    t2 += s2 - (t1 - s1);

    self.hi = t1 + t2;
    self.lo = t2 - (self.hi - t1);
  }

  #[inline]
  fn finish(self) -> f64 {
    self.hi
  }

  #[inline]
  fn finish_expanded(self) -> f64 {
    // hi is the rounded total; scaling a rounded value by a power of two commutes with the
    // rounding, and overflow becomes the Inf the true total deserves.
    self.hi * <f64 as Sealed>::EXPANSION
  }
}

impl<const FOLD: usize, F: Float> Binned<FOLD, F> {
  /// Convert to a native float.
  ///
  /// Sums the fold contributions from the most significant term down; term `i` contributes
  /// `carry[i]·0.25·M + (primary[i] − 1.5·M)` with `M` the term's ufp. For a top-of-range
  /// (index 0) accumulator the leading term lives at compressed scale, so the *other* terms
  /// are compressed to match and the whole total expanded once at the end; a sum whose true
  /// value exceeds the native range converts to ±Inf, exactly as if it had been accumulated
  /// natively.
  ///
  /// The result is a deterministic function of the accumulator state alone. Call
  /// [`renorm`](Self::renorm) first if any deposit happened since the last one; not for this
  /// conversion's sake, but because only canonical states are reproducible across differently
  /// ordered runs. NaN/Inf in `primary[0]` pass through unchanged; an exact-zero accumulator
  /// converts to `0.0` whatever its carries hold.
  pub fn value(&self) -> F {
    if self.primary[0].is_nan_or_inf() {
      return self.primary[0];
    }
    if self.is_zero() {
      return F::ZERO;
    }
    let expanded = self.is_index_zero();
    let mut total = <F::Wide as Wide<F>>::ZERO;
    for i in 0..FOLD {
      let p = self.primary[i];
      let m = p.ufp();
      let quarter = m * F::of(0.25);
      let (offset, carried) = if expanded && i > 0 {
        // Bring the uncompressed trailing terms down to the leading term's scale. Exact:
        // these terms sit near the top of the range, nowhere near underflow.
        ((p - m * F::of(1.5)) * F::COMPRESSION, self.carry[i] * (quarter * F::COMPRESSION))
      } else {
        (p - m * F::of(1.5), self.carry[i] * quarter)
      };
      total.accum(carried);
      total.accum(offset);
    }
    if expanded { total.finish_expanded() } else { total.finish() }
  }

  /// Convert a native float into a fresh accumulator: anchor at `|x|`, deposit, renormalise.
  pub fn from_value(x: F) -> Self {
    let mut out = Self::zero();
    out.add_value(x);
    out
  }

  /// Add one native float through the full protocol (re-anchor, deposit, renormalise).
  ///
  /// This is the convenient-but-slow path: three passes over the fold per value. Bulk
  /// reductions hoist the `update` and the `renorm` out of the loop; see [`crate::reduce`].
  pub fn add_value(&mut self, x: F) {
    if x == F::ZERO {
      return;
    }
    self.update(x.abs());
    self.deposit(x);
    self.renorm();
  }
}
