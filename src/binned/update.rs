use super::*;
use super::bins::index_of;

impl<const FOLD: usize, F: Float> Binned<FOLD, F> {
  /// Prepare this accumulator to absorb values of magnitude up to `bound`.
  ///
  /// This must be called with a bound covering the largest magnitude *before* the deposits that
  /// might reach it: depositing a value larger than every bound seen so far silently corrupts
  /// the accumulator (checked by a `debug_assert!` in [`Self::deposit`], never in release
  /// builds). The bound does not have to be tight, but two reductions only produce identical
  /// bits if they were anchored at the same bin, so parallel partial reductions should all be
  /// updated with one shared bound at least as large as the global maximum.
  ///
  /// An exact-zero accumulator is seeded directly at `bound`'s bin. Otherwise, if `bound` needs
  /// a coarser anchor than the current one, the existing terms shift towards the fine end of
  /// the fold (the slots they vacate are re-seeded from the bin table with zeroed carries) and
  /// whatever falls off the end is discarded: those bins are below representable precision at
  /// the new anchor. A zero `bound` promises only zeros will be deposited and is a no-op.
  pub fn update(&mut self, bound: F) {
    if bound == F::ZERO || self.primary[0].is_nan_or_inf() {
      return;
    }
    let new_index = index_of(bound);
    if self.is_zero() {
      self.seed(new_index);
      return;
    }
    let old_index = self.index();
    if new_index < old_index {
      let shift = old_index - new_index;
      let bins = F::bins();
      for i in (shift..FOLD).rev() {
        self.primary[i] = self.primary[i - shift];
        self.carry[i] = self.carry[i - shift];
      }
      for i in 0..shift.min(FOLD) {
        self.primary[i] = bins[new_index + i];
        self.carry[i] = F::ZERO;
      }
    }
  }

  /// Seed every term at anchor `index` with zeroed carries (the canonical empty state).
  pub(crate) fn seed(&mut self, index: usize) {
    let bins = F::bins();
    for i in 0..FOLD {
      self.primary[i] = bins[index + i];
      self.carry[i] = F::ZERO;
    }
  }
}
