use super::*;
use super::bins::primary_index;

impl<const FOLD: usize, F: Float> Binned<FOLD, F> {
  /// The fold of this accumulator type (i.e. parameter `FOLD`).
  pub const FOLD: usize = {
    assert!(FOLD >= 1, "A binned accumulator cannot have a fold smaller than 1");
    assert!(FOLD <= crate::MAX_FOLD, "A binned accumulator cannot have a fold above MAX_FOLD");
    FOLD
  };

  /// The number of native-format slots an accumulator occupies: `FOLD` primary terms followed
  /// by `FOLD` carry terms. This is also the length of the wire form (see
  /// [`Self::write_slots`]).
  pub const NUM_SLOTS: usize = 2 * Self::FOLD;

  /// The size of the wire form in bytes.
  pub const SIZE_BYTES: usize = Self::NUM_SLOTS * core::mem::size_of::<F>();

  /// An accumulator representing exact zero: every primary and carry term is `0.0`.
  ///
  /// # Example
  ///
  /// ```
  /// # use binsum::dbinned;
  /// assert_eq!(dbinned::zero().value(), 0.0);
  /// ```
  #[inline]
  pub fn zero() -> Self {
    let _ = Self::FOLD;
    Self { primary: [F::ZERO; FOLD], carry: [F::ZERO; FOLD] }
  }

  /// Reset to exact zero in place.
  #[inline]
  pub fn set_zero(&mut self) {
    *self = Self::zero();
  }

  /// Whether this accumulator represents exact zero. By invariant this is decided by
  /// `primary[0]` alone.
  #[inline]
  pub fn is_zero(&self) -> bool {
    self.primary[0] == F::ZERO
  }

  /// The anchor index of this accumulator, derived from `primary[0]`'s exponent field. Only
  /// meaningful for anchored (nonzero, finite) accumulators.
  #[inline]
  pub fn index(&self) -> usize {
    primary_index(self.primary[0])
  }

  /// `true` iff this accumulator is anchored at the top of the exponent range, where deposits
  /// are compressed to keep the primary term representable (see
  /// [`deposit`](Self::deposit)). O(1): a single compare against the largest finite exponent
  /// field, which only the bin-0 anchor occupies.
  #[inline]
  pub fn is_index_zero(&self) -> bool {
    self.primary[0].exp_field() == (F::MAX_EXP - 1 + F::EXP_BIAS) as u32
  }

  /// Whether arithmetic on this accumulator's current window could touch subnormal values.
  ///
  /// When this is `false` the deposit cascade provably never produces a subnormal
  /// intermediate, and kernels are free to use any path (including flush-to-zero hardware
  /// modes); when `true` only a fully IEEE-correct path may be used. The reductions in
  /// [`crate::reduce`] route such accumulators to the scalar kernels.
  #[inline]
  pub fn has_denormals(&self) -> bool {
    let threshold = F::MIN_EXP + F::MANT_DIG as i32 + F::EXP_BIAS + F::WIDTH as i32 * (FOLD as i32 + 1);
    (self.primary[0].exp_field() as i32) < threshold
  }

  /// Serialise into `out` as `NUM_SLOTS` contiguous slots: primaries first, then carries.
  /// This fixed layout is the contract for shipping accumulators between processes (message
  /// passing, custom reduction operators); the receiving side rebuilds with
  /// [`Self::read_slots`], and combining is `add_binned` followed by a final `renorm`.
  ///
  /// # Panics
  ///
  /// If `out.len() != NUM_SLOTS`.
  pub fn write_slots(&self, out: &mut [F]) {
    assert_eq!(out.len(), Self::NUM_SLOTS);
    out[..FOLD].copy_from_slice(&self.primary);
    out[FOLD..].copy_from_slice(&self.carry);
  }

  /// Rebuild an accumulator from its wire form. Inverse of [`Self::write_slots`].
  ///
  /// # Panics
  ///
  /// If `slots.len() != NUM_SLOTS`.
  pub fn read_slots(slots: &[F]) -> Self {
    assert_eq!(slots.len(), Self::NUM_SLOTS);
    let mut out = Self::zero();
    out.primary.copy_from_slice(&slots[..FOLD]);
    out.carry.copy_from_slice(&slots[FOLD..]);
    out
  }

  /// The raw primary terms. Exposed for inspection and tests; mutating an accumulator is only
  /// possible through the documented operations.
  #[inline]
  pub fn primary(&self) -> &[F; FOLD] { &self.primary }

  /// The raw carry terms.
  #[inline]
  pub fn carry(&self) -> &[F; FOLD] { &self.carry }
}

impl<const FOLD: usize, F: Float> Default for Binned<FOLD, F> {
  fn default() -> Self {
    Self::zero()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slot_counts() {
    assert_eq!(Binned::<1, f64>::NUM_SLOTS, 2);
    assert_eq!(Binned::<3, f64>::NUM_SLOTS, 6);
    assert_eq!(Binned::<4, f32>::NUM_SLOTS, 8);
    assert_eq!(Binned::<3, f64>::SIZE_BYTES, 48);
    assert_eq!(Binned::<3, f32>::SIZE_BYTES, 24);
  }

  #[test]
  fn zero_is_zero() {
    let z = Binned::<3, f64>::zero();
    assert!(z.is_zero());
    assert_eq!(z, Binned::default());
  }

  #[test]
  fn wire_roundtrip() {
    let x = Binned::<3, f64>::from_value(123.456);
    let mut slots = [0.0; 6];
    x.write_slots(&mut slots);
    assert_eq!(slots[..3], *x.primary());
    assert_eq!(slots[3..], *x.carry());
    assert_eq!(Binned::<3, f64>::read_slots(&slots), x);
  }

  #[test]
  fn index_zero_detection() {
    let mut a = Binned::<3, f64>::zero();
    a.update(f64::MAX);
    assert!(a.is_index_zero());
    assert_eq!(a.index(), 0);

    let mut b = Binned::<3, f64>::zero();
    b.update(1.0);
    assert!(!b.is_index_zero());
  }

  #[test]
  fn denormal_window_detection() {
    let mut small = Binned::<3, f64>::zero();
    small.update(1e-300);
    assert!(small.has_denormals());

    let mut big = Binned::<3, f64>::zero();
    big.update(1.0);
    assert!(!big.has_denormals());
  }
}
