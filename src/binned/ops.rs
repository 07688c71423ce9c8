use super::*;

impl<const FOLD: usize, F: Float> Binned<FOLD, F> {
  /// Merge another accumulator into this one (`self += x`).
  ///
  /// Associative and commutative over *renormalised* operands: partial accumulators built over
  /// disjoint data (with a shared fold and a shared bound) can be combined in any order and
  /// grouping and still convert to identical bits. Both operands must be renormalised; the
  /// result is renormalised on the way out.
  ///
  /// The finer-anchored operand is re-expressed on the coarser anchor: matching terms add as
  /// offsets (exact: offsets are small multiples of a shared ulp), trailing terms that fall
  /// off the fold are below representable precision at the coarser anchor, and freshly
  /// exposed leading slots start from the bin table. NaN/Inf in either operand combine into
  /// `primary[0]` with a plain addition and pass through everything downstream.
  pub fn add_binned(&mut self, x: &Self) {
    if x.is_zero() {
      return;
    }
    if self.is_zero() {
      *self = *x;
      return;
    }
    if x.primary[0].is_nan_or_inf() || self.primary[0].is_nan_or_inf() {
      self.primary[0] += x.primary[0];
      return;
    }

    let bins = F::bins();
    let x_index = x.index();
    let y_index = self.index();
    if y_index > x_index {
      // self is anchored finer: shift its terms towards the fine end, folding them into x's
      // copied over terms as offsets against their own bins.
      let shift = y_index - x_index;
      for i in (shift..FOLD).rev() {
        self.primary[i] = x.primary[i] + (self.primary[i - shift] - bins[y_index + i - shift]);
        self.carry[i] = x.carry[i] + self.carry[i - shift];
      }
      for i in 0..shift.min(FOLD) {
        self.primary[i] = x.primary[i];
        self.carry[i] = x.carry[i];
      }
    } else {
      // x is anchored the same or finer: fold x's surviving terms into self.
      let shift = x_index - y_index;
      for i in shift..FOLD {
        self.primary[i] += x.primary[i - shift] - bins[x_index + i - shift];
        self.carry[i] += x.carry[i - shift];
      }
    }
    self.renorm();
  }

  /// Negate in place (`self = -self`).
  ///
  /// Primary terms are stored as *offsets above their bin value*, not signed magnitudes, so
  /// negation reflects each term about its bin, `bins[i] - (primary[i] - bins[i])`, rather
  /// than flipping the sign bit, which would destroy the anchor encoding. Carries are plain
  /// counters and negate normally. Exact, and an involution: negating twice restores the
  /// original bits. Zero accumulators are untouched; NaN/Inf reflect through bin 0, which
  /// flips their sign like ordinary negation.
  pub fn negate(&mut self) {
    if self.is_zero() {
      return;
    }
    let bins = F::bins();
    let index = self.index();
    for i in 0..FOLD {
      self.primary[i] = bins[index + i] - (self.primary[i] - bins[index + i]);
      self.carry[i] = -self.carry[i];
    }
  }

  /// Adjust a sum-of-squares accumulator from units of `old_scale²` to units of `new_scale²`
  /// (both powers of two from [`scale`](crate::float::Sealed::scale), `new_scale ≥
  /// old_scale`). A no-op if the scales match or either is zero.
  ///
  /// Used when a running scaled sum of squares meets data larger than its current scale
  /// allows: existing terms are divided by the squared scale ratio, and if a term collapses to
  /// zero in the division the remaining terms are re-seeded at the bottom of the bin table
  /// (their old content is below representable precision in the new units).
  pub fn rescale(&mut self, new_scale: F, old_scale: F) {
    if new_scale == old_scale || new_scale == F::ZERO || old_scale == F::ZERO {
      return;
    }
    debug_assert!(new_scale >= old_scale, "rescale only coarsens: new {new_scale:?} < old {old_scale:?}");
    let mut ratio = new_scale / old_scale;
    ratio *= ratio;
    for i in 0..FOLD {
      self.primary[i] /= ratio;
      if self.primary[i] == F::ZERO {
        self.seed_tail(i);
        return;
      }
    }
  }

  /// Seed terms `from..` at the bottom of the bin table with zeroed carries.
  fn seed_tail(&mut self, from: usize) {
    let bins = F::bins();
    for i in from..FOLD {
      self.primary[i] = bins[F::MAX_INDEX + (i - from)];
      self.carry[i] = F::ZERO;
    }
  }
}

impl<const FOLD: usize, F: Float> core::ops::AddAssign<&Binned<FOLD, F>> for Binned<FOLD, F> {
  fn add_assign(&mut self, x: &Binned<FOLD, F>) {
    self.add_binned(x)
  }
}

impl<const FOLD: usize, F: Float> core::ops::Neg for Binned<FOLD, F> {
  type Output = Self;

  fn neg(mut self) -> Self {
    self.negate();
    self
  }
}
