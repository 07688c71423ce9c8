//! The complex binned accumulator: an independent [`Binned`] per component, with the
//! cross-component conventions (non-finite routing, conjugation) made explicit.
//!
//! Everything a real accumulator guarantees holds per component: reductions over complex data
//! are reproducible in the real and imaginary parts separately, and a NaN/Inf in one component
//! passes through natively without disturbing the binning of the other.

use crate::binned::Binned;
use crate::float::Float;
use num_complex::Complex;

/// A binned accumulator for complex values: real and imaginary [`Binned`] halves.
///
/// The halves anchor independently: a value like `1e300 + 1e-300 i` keeps full resolution in
/// both components. See [`Binned`] for the accumulation protocol; every operation here applies
/// it componentwise unless noted.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct BinnedComplex<const FOLD: usize, F: Float> {
  pub(crate) re: Binned<FOLD, F>,
  pub(crate) im: Binned<FOLD, F>,
}

impl<const FOLD: usize, F: Float> BinnedComplex<FOLD, F> {
  /// The number of native-format slots: real half then imaginary half, each primary-then-carry.
  pub const NUM_SLOTS: usize = 4 * Binned::<FOLD, F>::FOLD;

  /// The size of the wire form in bytes.
  pub const SIZE_BYTES: usize = Self::NUM_SLOTS * core::mem::size_of::<F>();

  /// An accumulator representing exact zero in both components.
  #[inline]
  pub fn zero() -> Self {
    Self { re: Binned::zero(), im: Binned::zero() }
  }

  /// Whether both components are exact zero.
  #[inline]
  pub fn is_zero(&self) -> bool {
    self.re.is_zero() && self.im.is_zero()
  }

  /// Access the real half.
  #[inline]
  pub fn re(&self) -> &Binned<FOLD, F> { &self.re }

  /// Access the imaginary half.
  #[inline]
  pub fn im(&self) -> &Binned<FOLD, F> { &self.im }

  /// Anchor each component for deposits with magnitudes up to the matching component of
  /// `bound`. See [`Binned::update`] for the contract.
  pub fn update(&mut self, bound: Complex<F>) {
    self.re.update(bound.re);
    self.im.update(bound.im);
  }

  /// Fold a complex value in, componentwise. A non-finite component (incoming or accumulated)
  /// short-circuits into that component's `primary[0]` as a plain addition while the other
  /// component keeps binning normally, which is exactly how native complex addition treats the
  /// components.
  #[inline]
  pub fn deposit(&mut self, x: Complex<F>) {
    self.re.deposit(x.re);
    self.im.deposit(x.im);
  }

  /// Componentwise [`Binned::renorm`].
  pub fn renorm(&mut self) {
    self.re.renorm();
    self.im.renorm();
  }

  /// Convert to a native complex value. Componentwise [`Binned::value`].
  pub fn value(&self) -> Complex<F> {
    Complex::new(self.re.value(), self.im.value())
  }

  /// Convert a native complex value into a fresh accumulator.
  pub fn from_value(x: Complex<F>) -> Self {
    Self { re: Binned::from_value(x.re), im: Binned::from_value(x.im) }
  }

  /// Add one native complex value through the full protocol.
  pub fn add_value(&mut self, x: Complex<F>) {
    self.re.add_value(x.re);
    self.im.add_value(x.im);
  }

  /// Merge another accumulator into this one. Componentwise [`Binned::add_binned`].
  pub fn add_binned(&mut self, x: &Self) {
    self.re.add_binned(&x.re);
    self.im.add_binned(&x.im);
  }

  /// Negate in place: both components reflect about their bins (see [`Binned::negate`]).
  pub fn negate(&mut self) {
    self.re.negate();
    self.im.negate();
  }

  /// Conjugate in place: only the imaginary half reflects.
  pub fn conj(&mut self) {
    self.im.negate();
  }

  /// Whether either component's window could touch subnormals; see
  /// [`Binned::has_denormals`].
  pub fn has_denormals(&self) -> bool {
    self.re.has_denormals() || self.im.has_denormals()
  }

  /// Serialise as `NUM_SLOTS` contiguous slots: the real half's primaries and carries, then
  /// the imaginary half's.
  ///
  /// # Panics
  ///
  /// If `out.len() != NUM_SLOTS`.
  pub fn write_slots(&self, out: &mut [F]) {
    assert_eq!(out.len(), Self::NUM_SLOTS);
    let half = Self::NUM_SLOTS / 2;
    self.re.write_slots(&mut out[..half]);
    self.im.write_slots(&mut out[half..]);
  }

  /// Rebuild from the wire form. Inverse of [`Self::write_slots`].
  ///
  /// # Panics
  ///
  /// If `slots.len() != NUM_SLOTS`.
  pub fn read_slots(slots: &[F]) -> Self {
    assert_eq!(slots.len(), Self::NUM_SLOTS);
    let half = Self::NUM_SLOTS / 2;
    Self {
      re: Binned::read_slots(&slots[..half]),
      im: Binned::read_slots(&slots[half..]),
    }
  }
}

impl<const FOLD: usize, F: Float> Default for BinnedComplex<FOLD, F> {
  fn default() -> Self {
    Self::zero()
  }
}

impl<const FOLD: usize, F: Float> core::ops::AddAssign<&BinnedComplex<FOLD, F>>
  for BinnedComplex<FOLD, F>
{
  fn add_assign(&mut self, x: &BinnedComplex<FOLD, F>) {
    self.add_binned(x)
  }
}

impl<const FOLD: usize, F: Float> core::ops::Neg for BinnedComplex<FOLD, F> {
  type Output = Self;

  fn neg(mut self) -> Self {
    self.negate();
    self
  }
}
