use super::*;

impl<const FOLD: usize, F: Float> Binned<FOLD, F> {
  /// Fold `x` into the accumulator. This is the hot path: `FOLD` floating-point adds and, per
  /// call, one early-out compare for exact zero plus a branch on the accumulator's anchor
  /// class; nothing else depends on the data.
  ///
  /// Each term absorbs the slice of `x` that lies within its own precision window and passes
  /// the exact remainder down to the next, finer, term; the last term absorbs whatever is left
  /// unconditionally. The absorption is made order-insensitive by the
  /// [`with_blp`](crate::float::Sealed::with_blp) trick: forcing the lowest mantissa bit of the
  /// addend breaks every round-to-nearest tie identically, so what a term absorbs depends only
  /// on the addend, not on the bits already accumulated. The forced bit costs one ulp of bias
  /// per term, which [`renorm`](Self::renorm) corrects.
  ///
  /// For accumulators anchored at the top of the exponent range (bin 0), the leading term works
  /// on values pre-multiplied by [`COMPRESSION`](crate::float::Sealed::COMPRESSION): values up
  /// there can be within a factor of two of the largest finite float, and an uncompressed term
  /// would overflow. Conversion undoes the compression.
  ///
  /// NaN or ±Inf (whether incoming or already in `primary[0]`) bypass binning entirely and
  /// combine into `primary[0]` with a plain addition, exactly reproducing native IEEE
  /// semantics (`Inf + -Inf = NaN` and so on).
  ///
  /// Calling this requires that
  ///
  ///   - the accumulator was [`update`](Self::update)d with a bound ≥ `|x|` (else the value is
  ///     silently misbinned), and
  ///   - fewer than [`ENDURANCE`](crate::float::Sealed::ENDURANCE) deposits happened since the
  ///     last [`renorm`](Self::renorm) (else a primary term can drift out of its window).
  ///
  /// Both are `debug_assert!`ed where cheap, and unchecked in release builds.
  pub fn deposit(&mut self, x: F) {
    if x.is_nan_or_inf() || self.primary[0].is_nan_or_inf() {
      self.primary[0] += x;
      return;
    }
    // Exact zeros contribute nothing and may arrive before any anchoring happened at all (a
    // zero bound anchors nothing), so they return before the cascade can touch the terms.
    if x == F::ZERO {
      return;
    }
    debug_assert!(
      !self.is_zero(),
      "deposit into an unanchored accumulator; call update first",
    );
    debug_assert!(
      super::bins::index_of(x) >= self.index(),
      "deposit of {x:?} outside the current window; update with a covering bound first",
    );

    let mut x = x;
    if self.is_index_zero() {
      // Compressed leading term. The residual comes back out at compressed scale and is
      // re-expanded in two halves: a single expansion could overflow right at the top of the
      // range.
      let m = self.primary[0];
      let q = (x * F::COMPRESSION).with_blp() + m;
      self.primary[0] = q;
      if FOLD == 1 {
        return;
      }
      let r = (m - q) * (F::EXPANSION * F::of(0.5));
      x = x + r;
      x = x + r;
      for i in 1..FOLD - 1 {
        let m = self.primary[i];
        let q = x.with_blp() + m;
        self.primary[i] = q;
        x = x + (m - q);
      }
      self.primary[FOLD - 1] += x.with_blp();
    } else {
      for i in 0..FOLD - 1 {
        let m = self.primary[i];
        let q = x.with_blp() + m;
        self.primary[i] = q;
        x = x + (m - q);
      }
      self.primary[FOLD - 1] += x.with_blp();
    }
  }
}
