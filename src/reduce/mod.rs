//! The vector reduction kernels: reproducible `sum`, `asum`, `nrm2`, `dot`, and their complex
//! counterparts.
//!
//! Every reduction runs the same two-phase protocol:
//!
//!   1. **Bound pass**: scan for the largest magnitude that will be deposited (see
//!      [`bound`]), and anchor the accumulator once with it.
//!   2. **Accumulate pass**: deposit every element (or elementwise product), renormalising
//!      after each block of [`ENDURANCE`](crate::float::Sealed::ENDURANCE) deposits, and once
//!      more at the end.
//!
//! The accumulate pass runs on one of three kernel variants ([`Kernel::Scalar`],
//! [`Kernel::Sse`], [`Kernel::Avx`]), selected once per process from CPU detection. The
//! per-element algorithm is identical in all three, and unit-stride and strided traversals of
//! the same logical data are identical too: **any path converts to the same bits**. That is
//! the contract this module exists for, and the test suite pins it directly.
//!
//! The `*_into` functions accumulate into a caller-owned accumulator, which is how partial
//! (parallel or distributed) reductions are built: give every partial the *same* fold and a
//! shared [`update`](crate::Binned::update) bound covering the global maximum, reduce disjoint
//! pieces, then combine with [`add_binned`](crate::Binned::add_binned) in any order.

use crate::binned::Binned;
use crate::complex::BinnedComplex;
use crate::float::{Float, Sealed};
use crate::strided::Strided;
use num_complex::Complex;
use std::sync::OnceLock;

pub(crate) mod bound;
pub(crate) mod scalar;
#[cfg(target_arch = "x86_64")]
pub(crate) mod simd;
pub(crate) mod vector;

/// The kernel variants. The per-element arithmetic is identical across variants; they differ
/// only in how many accumulator copies run side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
  /// One element at a time; the reference everything else must match.
  Scalar,
  /// 128-bit lanes (2 × f64 / 4 × f32). Baseline on x86_64.
  Sse,
  /// 256-bit lanes (4 × f64 / 8 × f32).
  Avx,
}

/// The kernel variant used by this process, detected once on first use.
pub fn active_kernel() -> Kernel {
  static SELECTED: OnceLock<Kernel> = OnceLock::new();
  *SELECTED.get_or_init(|| {
    #[cfg(target_arch = "x86_64")]
    {
      if is_x86_feature_detected!("avx") { Kernel::Avx } else { Kernel::Sse }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
      Kernel::Scalar
    }
  })
}

/// Whether the vector kernels may run: they handle neither compressed (index 0) anchors, nor
/// windows touching subnormals, nor non-finite bounds; all of those belong to the scalar
/// path. The subnormal-window exclusion also keeps zero elements exactly free in both paths.
#[cfg(target_arch = "x86_64")]
fn vector_ok<const FOLD: usize, F: Float>(kernel: Kernel, bound: F, acc: &Binned<FOLD, F>) -> bool {
  kernel != Kernel::Scalar
    && !bound.is_nan_or_inf()
    && !acc.is_zero()
    && !acc.is_index_zero()
    && !acc.has_denormals()
}

/// View the interleaved components of a complex slice as a flat real slice.
fn flatten<F: Float>(z: &[Complex<F>]) -> &[F] {
  // SAFETY: Complex<F> is repr(C) { re: F, im: F }, so a slice of n of them is exactly a
  // valid slice of 2n F values at the same address.
  unsafe { core::slice::from_raw_parts(z.as_ptr() as *const F, z.len() * 2) }
}

#[doc(hidden)]
pub fn sum_into_with<const FOLD: usize, F: Float>(
  kernel: Kernel,
  x: Strided<'_, F>,
  acc: &mut Binned<FOLD, F>,
) {
  let bound = bound::amax(&x);
  if bound == F::ZERO {
    return;
  }
  acc.update(bound);
  #[cfg(target_arch = "x86_64")]
  if let Some(slice) = x.as_contiguous() {
    if vector_ok(kernel, bound, acc) {
      for chunk in slice.chunks(F::ENDURANCE) {
        // SAFETY: `kernel` comes from CPU detection (or a test forcing a detected variant),
        // so the required target feature is present.
        unsafe {
          match kernel {
            Kernel::Avx => simd::x86_64::sum_avx(chunk, acc),
            _ => simd::x86_64::sum_sse(chunk, acc),
          }
        }
        acc.renorm();
      }
      return;
    }
  }
  let _ = kernel;
  scalar::sum(&x, acc);
}

/// Add the reproducible sum of `x` to `acc`.
pub fn sum_into<const FOLD: usize, F: Float>(x: Strided<'_, F>, acc: &mut Binned<FOLD, F>) {
  sum_into_with(active_kernel(), x, acc)
}

#[doc(hidden)]
pub fn asum_into_with<const FOLD: usize, F: Float>(
  kernel: Kernel,
  x: Strided<'_, F>,
  acc: &mut Binned<FOLD, F>,
) {
  let bound = bound::amax(&x);
  if bound == F::ZERO {
    return;
  }
  acc.update(bound);
  #[cfg(target_arch = "x86_64")]
  if let Some(slice) = x.as_contiguous() {
    if vector_ok(kernel, bound, acc) {
      for chunk in slice.chunks(F::ENDURANCE) {
        // SAFETY: as in `sum_into_with`.
        unsafe {
          match kernel {
            Kernel::Avx => simd::x86_64::asum_avx(chunk, acc),
            _ => simd::x86_64::asum_sse(chunk, acc),
          }
        }
        acc.renorm();
      }
      return;
    }
  }
  let _ = kernel;
  scalar::asum(&x, acc);
}

/// Add the reproducible sum of absolute values of `x` to `acc`.
pub fn asum_into<const FOLD: usize, F: Float>(x: Strided<'_, F>, acc: &mut Binned<FOLD, F>) {
  asum_into_with(active_kernel(), x, acc)
}

/// Pick the scale for a sum of squares: the larger of the caller's running scale and the
/// scale of the data's own maximum. Returns `(scale, 1/scale, deposit bound)`.
fn ssq_scale<F: Float>(amax: F, prior_scale: F) -> (F, F, F) {
  let local = amax.scale();
  let scl = if prior_scale > local { prior_scale } else { local };
  let recip = F::ONE / scl;
  let b = amax * recip;
  (scl, recip, b * b)
}

#[doc(hidden)]
pub fn ssq_into_with<const FOLD: usize, F: Float>(
  kernel: Kernel,
  x: Strided<'_, F>,
  prior_scale: F,
  acc: &mut Binned<FOLD, F>,
) -> F {
  let amax = bound::amax(&x);
  if amax == F::ZERO {
    return prior_scale;
  }
  let (scl, recip, bound) = ssq_scale(amax, prior_scale);
  if prior_scale != F::ZERO && scl > prior_scale {
    acc.rescale(scl, prior_scale);
  }
  acc.update(bound);
  #[cfg(target_arch = "x86_64")]
  if let Some(slice) = x.as_contiguous() {
    if vector_ok(kernel, bound, acc) {
      for chunk in slice.chunks(F::ENDURANCE) {
        // SAFETY: as in `sum_into_with`.
        unsafe {
          match kernel {
            Kernel::Avx => simd::x86_64::ssq_avx(chunk, recip, acc),
            _ => simd::x86_64::ssq_sse(chunk, recip, acc),
          }
        }
        acc.renorm();
      }
      return scl;
    }
  }
  let _ = kernel;
  scalar::ssq(&x, recip, acc);
  scl
}

/// Add the scaled sum of squares of `x` to `acc`, returning the scale in effect afterwards.
///
/// `acc` holds `Σ (x[i] / scale)²`; the squared Euclidean norm is `scale² · acc.value()` and
/// the norm itself `scale · √acc.value()` (see [`nrm2`]). Pass `prior_scale = 0` to start
/// fresh. To extend a running sum, pass the scale returned by the previous call; if the new
/// data needs a coarser scale, the accumulated squares are rescaled automatically. Chained
/// calls are bit-reproducible; partials combined out of order additionally need a pre-agreed
/// common scale (e.g. from the global maximum), just like the shared bound for [`sum_into`].
pub fn ssq_into<const FOLD: usize, F: Float>(
  x: Strided<'_, F>,
  prior_scale: F,
  acc: &mut Binned<FOLD, F>,
) -> F {
  ssq_into_with(active_kernel(), x, prior_scale, acc)
}

#[doc(hidden)]
pub fn dot_into_with<const FOLD: usize, F: Float>(
  kernel: Kernel,
  x: Strided<'_, F>,
  y: Strided<'_, F>,
  acc: &mut Binned<FOLD, F>,
) {
  assert_eq!(x.len(), y.len(), "dot product of vectors with different lengths");
  let bound = bound::amaxm(&x, &y);
  if bound == F::ZERO {
    return;
  }
  acc.update(bound);
  #[cfg(target_arch = "x86_64")]
  if let (Some(xs), Some(ys)) = (x.as_contiguous(), y.as_contiguous()) {
    if vector_ok(kernel, bound, acc) {
      for (cx, cy) in xs.chunks(F::ENDURANCE).zip(ys.chunks(F::ENDURANCE)) {
        // SAFETY: as in `sum_into_with`.
        unsafe {
          match kernel {
            Kernel::Avx => simd::x86_64::dot_avx(cx, cy, acc),
            _ => simd::x86_64::dot_sse(cx, cy, acc),
          }
        }
        acc.renorm();
      }
      return;
    }
  }
  let _ = kernel;
  scalar::dot(&x, &y, acc);
}

/// Add the reproducible dot product `Σ x[i]·y[i]` to `acc`. Each product is rounded once,
/// elementwise (deterministically), then deposited exactly.
pub fn dot_into<const FOLD: usize, F: Float>(
  x: Strided<'_, F>,
  y: Strided<'_, F>,
  acc: &mut Binned<FOLD, F>,
) {
  dot_into_with(active_kernel(), x, y, acc)
}

#[doc(hidden)]
pub fn csum_into_with<const FOLD: usize, F: Float>(
  kernel: Kernel,
  x: Strided<'_, Complex<F>>,
  acc: &mut BinnedComplex<FOLD, F>,
) {
  let b = bound::camax(&x);
  if b.re == F::ZERO && b.im == F::ZERO {
    return;
  }
  acc.update(b);
  #[cfg(target_arch = "x86_64")]
  if let Some(slice) = x.as_contiguous() {
    if vector_ok(kernel, b.re, &acc.re) && vector_ok(kernel, b.im, &acc.im) {
      let flat = flatten(slice);
      for chunk in flat.chunks(2 * F::ENDURANCE) {
        // SAFETY: as in `sum_into_with`; chunks of even length keep the lane parity.
        unsafe {
          match kernel {
            Kernel::Avx => simd::x86_64::csum_avx(chunk, &mut acc.re, &mut acc.im),
            _ => simd::x86_64::csum_sse(chunk, &mut acc.re, &mut acc.im),
          }
        }
        acc.renorm();
      }
      return;
    }
  }
  let _ = kernel;
  scalar::csum(&x, acc);
}

/// Add the reproducible componentwise sum of a complex vector to `acc`.
pub fn csum_into<const FOLD: usize, F: Float>(
  x: Strided<'_, Complex<F>>,
  acc: &mut BinnedComplex<FOLD, F>,
) {
  csum_into_with(active_kernel(), x, acc)
}

#[doc(hidden)]
pub fn casum_into_with<const FOLD: usize, F: Float>(
  kernel: Kernel,
  x: Strided<'_, Complex<F>>,
  acc: &mut Binned<FOLD, F>,
) {
  // The BLAS convention: Σ (|re| + |im|), one real result. On interleaved memory that is
  // literally the absolute sum of the flattened stream.
  if let Some(slice) = x.as_contiguous() {
    return asum_into_with(kernel, Strided::from_slice(flatten(slice)), acc);
  }
  let b = bound::camax(&x);
  let bound = if b.re > b.im { b.re } else { b.im };
  if bound == F::ZERO {
    return;
  }
  acc.update(bound);
  let _ = kernel;
  scalar::casum(&x, acc);
}

/// Add the reproducible absolute sum `Σ (|re| + |im|)` of a complex vector to `acc`.
pub fn casum_into<const FOLD: usize, F: Float>(
  x: Strided<'_, Complex<F>>,
  acc: &mut Binned<FOLD, F>,
) {
  casum_into_with(active_kernel(), x, acc)
}

#[doc(hidden)]
pub fn cssq_into_with<const FOLD: usize, F: Float>(
  kernel: Kernel,
  x: Strided<'_, Complex<F>>,
  prior_scale: F,
  acc: &mut Binned<FOLD, F>,
) -> F {
  // Squared magnitudes are componentwise squares, so the flattened stream reduces with the
  // real machinery.
  if let Some(slice) = x.as_contiguous() {
    return ssq_into_with(kernel, Strided::from_slice(flatten(slice)), prior_scale, acc);
  }
  let b = bound::camax(&x);
  let amax = if b.re > b.im { b.re } else { b.im };
  if amax == F::ZERO {
    return prior_scale;
  }
  let (scl, recip, bound) = ssq_scale(amax, prior_scale);
  if prior_scale != F::ZERO && scl > prior_scale {
    acc.rescale(scl, prior_scale);
  }
  acc.update(bound);
  let _ = kernel;
  scalar::cssq(&x, recip, acc);
  scl
}

/// Add the scaled sum of squared magnitudes of a complex vector to `acc`; see [`ssq_into`].
pub fn cssq_into<const FOLD: usize, F: Float>(
  x: Strided<'_, Complex<F>>,
  prior_scale: F,
  acc: &mut Binned<FOLD, F>,
) -> F {
  cssq_into_with(active_kernel(), x, prior_scale, acc)
}

fn cdot_into_impl<const FOLD: usize, F: Float>(
  x: Strided<'_, Complex<F>>,
  y: Strided<'_, Complex<F>>,
  conj: bool,
  acc: &mut BinnedComplex<FOLD, F>,
) {
  assert_eq!(x.len(), y.len(), "dot product of vectors with different lengths");
  let b = bound::camaxm(&x, &y);
  if b.re == F::ZERO && b.im == F::ZERO {
    return;
  }
  acc.update(b);
  scalar::cdot(&x, &y, conj, acc);
}

/// Add the reproducible unconjugated complex dot product `Σ x[i]·y[i]` to `acc`. The four
/// cross products per element are each rounded once and deposited separately.
pub fn cdotu_into<const FOLD: usize, F: Float>(
  x: Strided<'_, Complex<F>>,
  y: Strided<'_, Complex<F>>,
  acc: &mut BinnedComplex<FOLD, F>,
) {
  cdot_into_impl(x, y, false, acc)
}

/// Add the reproducible conjugated complex dot product `Σ conj(x[i])·y[i]` to `acc`.
pub fn cdotc_into<const FOLD: usize, F: Float>(
  x: Strided<'_, Complex<F>>,
  y: Strided<'_, Complex<F>>,
  acc: &mut BinnedComplex<FOLD, F>,
) {
  cdot_into_impl(x, y, true, acc)
}

/// The reproducible sum of a slice. Bit-identical for any permutation of `x`.
///
/// # Example
///
/// ```
/// let x = [0.1, 0.2, 0.3];
/// let y = [0.3, 0.1, 0.2];
/// assert_eq!(binsum::sum(&x).to_bits(), binsum::sum(&y).to_bits());
/// ```
pub fn sum<F: Float>(x: &[F]) -> F {
  let mut acc = Binned::<{ crate::DEFAULT_FOLD }, F>::zero();
  sum_into(Strided::from_slice(x), &mut acc);
  acc.value()
}

/// The reproducible sum of absolute values of a slice.
pub fn asum<F: Float>(x: &[F]) -> F {
  let mut acc = Binned::<{ crate::DEFAULT_FOLD }, F>::zero();
  asum_into(Strided::from_slice(x), &mut acc);
  acc.value()
}

/// The reproducible Euclidean norm of a slice, computed as `scale · √(Σ (x/scale)²)` so that
/// vectors near the top or bottom of the exponent range neither overflow nor flush to zero.
pub fn nrm2<F: Float>(x: &[F]) -> F {
  let mut acc = Binned::<{ crate::DEFAULT_FOLD }, F>::zero();
  let scl = ssq_into(Strided::from_slice(x), F::ZERO, &mut acc);
  scl * acc.value().sqrt()
}

/// The reproducible dot product of two slices.
///
/// # Panics
///
/// If the slices have different lengths.
pub fn dot<F: Float>(x: &[F], y: &[F]) -> F {
  let mut acc = Binned::<{ crate::DEFAULT_FOLD }, F>::zero();
  dot_into(Strided::from_slice(x), Strided::from_slice(y), &mut acc);
  acc.value()
}

/// The reproducible componentwise sum of a complex slice.
pub fn csum<F: Float>(x: &[Complex<F>]) -> Complex<F> {
  let mut acc = BinnedComplex::<{ crate::DEFAULT_FOLD }, F>::zero();
  csum_into(Strided::from_slice(x), &mut acc);
  acc.value()
}

/// The reproducible absolute sum `Σ (|re| + |im|)` of a complex slice.
pub fn casum<F: Float>(x: &[Complex<F>]) -> F {
  let mut acc = Binned::<{ crate::DEFAULT_FOLD }, F>::zero();
  casum_into(Strided::from_slice(x), &mut acc);
  acc.value()
}

/// The reproducible Euclidean norm of a complex slice.
pub fn cnrm2<F: Float>(x: &[Complex<F>]) -> F {
  let mut acc = Binned::<{ crate::DEFAULT_FOLD }, F>::zero();
  let scl = cssq_into(Strided::from_slice(x), F::ZERO, &mut acc);
  scl * acc.value().sqrt()
}

/// The reproducible unconjugated complex dot product.
///
/// # Panics
///
/// If the slices have different lengths.
pub fn cdotu<F: Float>(x: &[Complex<F>], y: &[Complex<F>]) -> Complex<F> {
  let mut acc = BinnedComplex::<{ crate::DEFAULT_FOLD }, F>::zero();
  cdotu_into(Strided::from_slice(x), Strided::from_slice(y), &mut acc);
  acc.value()
}

/// The reproducible conjugated complex dot product `Σ conj(x[i])·y[i]`.
///
/// # Panics
///
/// If the slices have different lengths.
pub fn cdotc<F: Float>(x: &[Complex<F>], y: &[Complex<F>]) -> Complex<F> {
  let mut acc = BinnedComplex::<{ crate::DEFAULT_FOLD }, F>::zero();
  cdotc_into(Strided::from_slice(x), Strided::from_slice(y), &mut acc);
  acc.value()
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn c(re: f64, im: f64) -> Complex<f64> {
    Complex::new(re, im)
  }

  /// Every kernel variant this machine can run.
  fn kernels() -> Vec<Kernel> {
    #[allow(unused_mut)]
    let mut v = vec![Kernel::Scalar];
    #[cfg(target_arch = "x86_64")]
    {
      v.push(Kernel::Sse);
      if is_x86_feature_detected!("avx") {
        v.push(Kernel::Avx);
      }
    }
    v
  }

  /// A deterministic value mix covering many bins, both signs, zeros and subnormals. The
  /// exponents stay mid-range so the anchor is neither bin 0 nor a subnormal window: this is
  /// the data that actually exercises the vector kernels (see [`extreme_values`] for the
  /// scalar-fallback anchors).
  fn mixed_values(n: usize) -> Vec<f64> {
    let mut state: u64 = 0x243f6a8885a308d3;
    let mut step = || {
      state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
      state
    };
    (0..n)
      .map(|i| match i % 16 {
        0 => 0.0,
        1 => -0.0,
        2 => f64::from_bits(step() >> 12 | 1),  // subnormal
        _ => {
          let bits = step();
          let exp = 512 + (bits >> 52) % 1024;  // mid-range exponents
          f64::from_bits((bits & (1 << 63 | (1 << 52) - 1)) | exp << 52)
        }
      })
      .collect()
  }

  /// Values that force the scalar fallback: bin-0 anchors and subnormal windows.
  fn extreme_values(n: usize) -> Vec<f64> {
    let mut v = mixed_values(n);
    if n > 0 {
      v[0] = f64::MAX / 2.0;
    }
    if n > 1 {
      v[1] = -f64::MAX / 2.0;
    }
    v
  }

  /// Lay `vals` out at stride `inc` (negative: reversed in memory, per the BLAS convention),
  /// poisoning the gaps so a stride bug cannot go unnoticed.
  fn embed(vals: &[f64], inc: isize) -> Vec<f64> {
    let step = inc.unsigned_abs();
    let mut buf = vec![f64::NAN; (vals.len() - 1) * step + 1];
    for (i, &v) in vals.iter().enumerate() {
      let slot = if inc > 0 { i * step } else { (vals.len() - 1 - i) * step };
      buf[slot] = v;
    }
    buf
  }

  #[test]
  fn empty_inputs_are_identity() {
    assert_eq!(sum::<f64>(&[]), 0.0);
    assert_eq!(asum::<f64>(&[]), 0.0);
    assert_eq!(nrm2::<f64>(&[]), 0.0);
    assert_eq!(dot::<f64>(&[], &[]), 0.0);
    assert_eq!(csum::<f64>(&[]), c(0.0, 0.0));
    assert_eq!(casum::<f64>(&[]), 0.0);

    let mut acc = Binned::<3, f64>::from_value(7.0);
    sum_into(Strided::<f64>::from_slice(&[]), &mut acc);
    assert_eq!(acc.value(), 7.0);  // untouched, not zeroed
  }

  #[test]
  fn magnitude_robustness() {
    // One huge value, its exact negation elsewhere, and many small values: the sum must
    // cancel the giants exactly, whatever the order.
    let mut x = vec![(2.0f64).powi(-20); 1000];
    x[0] = (2.0f64).powi(35);
    x[500] = -(2.0f64).powi(35);
    let expect = 998.0 * (2.0f64).powi(-20);

    assert_eq!(sum(&x), expect);

    x.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(sum(&x).to_bits(), expect.to_bits());
    x.reverse();
    assert_eq!(sum(&x).to_bits(), expect.to_bits());

    // The absolute sum must register both giant magnitudes instead of cancelling them.
    let expect_asum = (2.0f64).powi(36) + 998.0 * (2.0f64).powi(-20);
    assert_eq!(asum(&x), expect_asum);

    // And a dot product against ones is the same sum through the product pipeline.
    let ones = vec![1.0; 1000];
    assert_eq!(dot(&x, &ones).to_bits(), expect.to_bits());
  }

  #[test]
  fn kernel_and_stride_parity() {
    // The reproducibility contract: every kernel variant and every stride pattern over the
    // same logical data produces identical bits, both for data the vector kernels accept
    // and for data that falls back to the scalar path.
    for data in [mixed_values as fn(usize) -> Vec<f64>, extreme_values] {
      for n in [0usize, 1, 3, 4, 7, 64, 1000, 5000] {
        let vals = data(n);
        let mut sums = Vec::new();
        let mut asums = Vec::new();
        let mut dots = Vec::new();
        let ys = data(n);
        for kernel in kernels() {
          for inc in [1isize, 2, 3, -1, -2] {
            let buf = if n > 0 { embed(&vals, inc) } else { Vec::new() };
            let ybuf = if n > 0 { embed(&ys, inc) } else { Vec::new() };
            let view = Strided::new(&buf, n, inc);
            let yview = Strided::new(&ybuf, n, inc);

            let mut acc = Binned::<3, f64>::zero();
            sum_into_with(kernel, view, &mut acc);
            sums.push(acc.value().to_bits());

            let mut acc = Binned::<3, f64>::zero();
            asum_into_with(kernel, view, &mut acc);
            asums.push(acc.value().to_bits());

            let mut acc = Binned::<3, f64>::zero();
            dot_into_with(kernel, view, yview, &mut acc);
            dots.push(acc.value().to_bits());
          }
        }
        assert!(sums.windows(2).all(|w| w[0] == w[1]), "sum parity at n={n}: {sums:x?}");
        assert!(asums.windows(2).all(|w| w[0] == w[1]), "asum parity at n={n}");
        assert!(dots.windows(2).all(|w| w[0] == w[1]), "dot parity at n={n}");
      }
    }
  }

  #[test]
  fn kernel_parity_f32_and_ssq() {
    // f32 values rebuilt from the f64 mix with in-range exponents, so the vector path runs.
    let vals64 = mixed_values(777);
    let vals: Vec<f32> = vals64
      .iter()
      .map(|&v| {
        let b = v.to_bits() as u32;
        let exp = 64 + (v.to_bits() >> 52) as u32 % 128;
        f32::from_bits((b & 0x807f_ffff) | exp << 23)
      })
      .collect();
    let mut sums = Vec::new();
    let mut ssqs = Vec::new();
    for kernel in kernels() {
      let mut acc = Binned::<3, f32>::zero();
      sum_into_with(kernel, Strided::from_slice(&vals), &mut acc);
      sums.push(acc.value().to_bits());

      let mut acc = Binned::<3, f64>::zero();
      let scl = ssq_into_with(kernel, Strided::from_slice(&vals64), 0.0, &mut acc);
      ssqs.push((scl.to_bits(), acc.value().to_bits()));
    }
    assert!(sums.windows(2).all(|w| w[0] == w[1]), "f32 sum parity: {sums:x?}");
    assert!(ssqs.windows(2).all(|w| w[0] == w[1]), "ssq parity: {ssqs:x?}");
  }

  proptest!{
    #[test]
    fn order_invariance(
      (xs, shuffled) in proptest::collection::vec(crate::test::moderate_f64(), 1..128)
        .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
      prop_assert_eq!(sum(&xs).to_bits(), sum(&shuffled).to_bits());
      prop_assert_eq!(asum(&xs).to_bits(), asum(&shuffled).to_bits());
      prop_assert_eq!(nrm2(&xs).to_bits(), nrm2(&shuffled).to_bits());
    }

    #[test]
    fn partition_invariance(
      xs in proptest::collection::vec(crate::test::moderate_f64(), 1..200),
      cut in any::<proptest::sample::Index>(),
    ) {
      let cut = cut.index(xs.len());
      let bound = xs.iter().fold(0.0f64, |b, x| b.max(x.abs()));

      let mut whole = Binned::<3, f64>::zero();
      whole.update(bound);
      sum_into(Strided::from_slice(&xs), &mut whole);

      let mut a = Binned::<3, f64>::zero();
      let mut b = Binned::<3, f64>::zero();
      a.update(bound);
      b.update(bound);
      sum_into(Strided::from_slice(&xs[..cut]), &mut a);
      sum_into(Strided::from_slice(&xs[cut..]), &mut b);

      // Combine in both orders: both must equal the one-pass result bit for bit.
      let mut ab = a;
      ab.add_binned(&b);
      let mut ba = b;
      ba.add_binned(&a);
      prop_assert_eq!(ab, whole);
      prop_assert_eq!(ba, whole);
      prop_assert_eq!(ab.value().to_bits(), whole.value().to_bits());
    }

    #[test]
    fn nrm2_partials_with_shared_scale(
      xs in proptest::collection::vec(crate::test::moderate_f64(), 1..100),
      cut in any::<proptest::sample::Index>(),
    ) {
      let cut = cut.index(xs.len());
      let amax = xs.iter().fold(0.0f64, |b, x| b.max(x.abs()));
      prop_assume!(amax > 0.0);
      // Partials need the global scale *and* the global deposit bound, exactly like the
      // shared bound for plain sums.
      let shared = crate::float::Sealed::scale(amax);
      let (_, _, global_bound) = ssq_scale(amax, shared);

      let mut whole = Binned::<3, f64>::zero();
      whole.update(global_bound);
      let scl = ssq_into(Strided::from_slice(&xs), shared, &mut whole);
      prop_assert_eq!(scl.to_bits(), shared.to_bits());

      let mut a = Binned::<3, f64>::zero();
      let mut b = Binned::<3, f64>::zero();
      a.update(global_bound);
      b.update(global_bound);
      ssq_into(Strided::from_slice(&xs[..cut]), shared, &mut a);
      ssq_into(Strided::from_slice(&xs[cut..]), shared, &mut b);
      a.add_binned(&b);
      prop_assert_eq!(a, whole);
    }

    #[test]
    fn wire_roundtrip_combines(
      xs in proptest::collection::vec(crate::test::moderate_f64(), 2..100),
      cut in any::<proptest::sample::Index>(),
    ) {
      // Ship a partial across a (simulated) process boundary and combine on the other side.
      let cut = 1 + cut.index(xs.len() - 1);
      let bound = xs.iter().fold(0.0f64, |b, x| b.max(x.abs()));

      let mut whole = Binned::<3, f64>::zero();
      whole.update(bound);
      sum_into(Strided::from_slice(&xs), &mut whole);

      let mut local = Binned::<3, f64>::zero();
      local.update(bound);
      sum_into(Strided::from_slice(&xs[..cut]), &mut local);

      let mut remote = Binned::<3, f64>::zero();
      remote.update(bound);
      sum_into(Strided::from_slice(&xs[cut..]), &mut remote);
      let mut wire = [0.0; 6];
      remote.write_slots(&mut wire);

      local.add_binned(&Binned::read_slots(&wire));
      prop_assert_eq!(local, whole);
    }

    #[test]
    fn dot_order_invariance(
      (pairs, shuffled) in proptest::collection::vec(
        (crate::test::moderate_f64(), crate::test::moderate_f64()), 1..100,
      ).prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
      let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
      let (xs2, ys2): (Vec<f64>, Vec<f64>) = shuffled.into_iter().unzip();
      prop_assert_eq!(dot(&xs, &ys).to_bits(), dot(&xs2, &ys2).to_bits());
    }
  }

  #[test]
  fn nonfinite_matches_native() {
    assert_eq!(sum(&[1.0, f64::INFINITY, 2.0]), f64::INFINITY);
    assert_eq!(sum(&[1.0, f64::NEG_INFINITY]), f64::NEG_INFINITY);
    assert!(sum(&[f64::INFINITY, f64::NEG_INFINITY]).is_nan());
    assert!(sum(&[1.0, f64::NAN, 2.0]).is_nan());
    assert_eq!(asum(&[f64::NEG_INFINITY, 1.0]), f64::INFINITY);
    // 0 × Inf inside a dot product is NaN, exactly as natively.
    assert!(dot(&[0.0, 1.0], &[f64::INFINITY, 1.0]).is_nan());
    assert_eq!(dot(&[1e300, 1e300], &[1e300, 1e300]), f64::INFINITY);
  }

  #[test]
  fn nrm2_values() {
    assert_eq!(nrm2(&[3.0, 4.0]), 5.0);
    assert_eq!(nrm2(&[f64::MAX]), f64::MAX);
    assert_eq!(nrm2(&[f64::MIN_POSITIVE]), f64::MIN_POSITIVE);

    // Neither overflow at the top...
    let big = nrm2(&[1e300, 1e300]);
    let expect = (2.0f64).sqrt() * 1e300;
    assert!((big - expect).abs() <= expect * 1e-15, "{big:e}");
    // ... nor flush to zero at the bottom.
    let small = nrm2(&[1e-300, 1e-300]);
    let expect = (2.0f64).sqrt() * 1e-300;
    assert!((small - expect).abs() <= expect * 1e-15, "{small:e}");
  }

  #[test]
  fn complex_reductions_manual() {
    let x = [c(1.0, 2.0), c(3.0, -1.0)];
    let y = [c(2.0, -1.0), c(1.0, 1.0)];

    assert_eq!(csum(&x), c(4.0, 1.0));
    assert_eq!(casum(&x), 7.0);
    assert_eq!(cnrm2(&[c(3.0, 4.0)]), 5.0);
    // (1+2i)(2-i) + (3-i)(1+i) = (4+3i) + (4+2i)
    assert_eq!(cdotu(&x, &y), c(8.0, 5.0));
    // (1-2i)(2-i) + (3+i)(1+i) = (0-5i) + (2+4i)
    assert_eq!(cdotc(&x, &y), c(2.0, -1.0));

    // Componentwise cancellation of huge parts.
    let z = [c(1e16, 1.0), c(-1e16, 2.0)];
    assert_eq!(csum(&z), c(0.0, 3.0));
  }

  #[test]
  fn complex_kernel_and_stride_parity() {
    let vals64 = mixed_values(502);
    let zs: Vec<Complex<f64>> =
      vals64.chunks(2).map(|p| c(p[0], p[1])).collect();
    // A strided copy with gaps.
    let mut gapped = vec![c(f64::NAN, f64::NAN); zs.len() * 2];
    for (i, &z) in zs.iter().enumerate() {
      gapped[i * 2] = z;
    }

    let mut results = Vec::new();
    for kernel in kernels() {
      for view in [Strided::from_slice(&zs), Strided::new(&gapped, zs.len(), 2)] {
        let mut acc = BinnedComplex::<3, f64>::zero();
        csum_into_with(kernel, view, &mut acc);
        let v = acc.value();

        let mut aacc = Binned::<3, f64>::zero();
        casum_into_with(kernel, view, &mut aacc);

        let mut sacc = Binned::<3, f64>::zero();
        let scl = cssq_into_with(kernel, view, 0.0, &mut sacc);

        results.push((
          v.re.to_bits(), v.im.to_bits(),
          aacc.value().to_bits(),
          scl.to_bits(), sacc.value().to_bits(),
        ));
      }
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]), "{results:x?}");
  }

  proptest!{
    #[test]
    fn casum_equals_real_asum_of_components(
      zs in proptest::collection::vec(
        (crate::test::moderate_f64(), crate::test::moderate_f64()), 1..64,
      ),
    ) {
      let zs: Vec<Complex<f64>> = zs.into_iter().map(|(re, im)| c(re, im)).collect();
      let comps: Vec<f64> = zs.iter().flat_map(|z| [z.re, z.im]).collect();
      prop_assert_eq!(casum(&zs).to_bits(), asum(&comps).to_bits());
    }
  }
}
