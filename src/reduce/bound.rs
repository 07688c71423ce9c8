//! Bound passes: the first phase of every reduction.
//!
//! Each reduction first scans its input for the largest magnitude it will deposit, anchors the
//! accumulator once with [`Binned::update`](crate::Binned::update), and only then deposits.
//! These scans are exact operations (`abs`, `max`, and for dot products the elementwise
//! product the accumulate phase will deposit anyway), so they are scalar: vectorising them
//! would change speed, never results.
//!
//! A NaN anywhere poisons the bound immediately: no finite anchor is meaningful then, and the
//! drivers route NaN bounds through the scalar path where the deposits reproduce native IEEE
//! NaN propagation element by element.

use crate::float::{Float, Sealed};
use crate::strided::Strided;
use num_complex::Complex;

/// Largest absolute element; `0` for an empty vector, NaN if any element is NaN.
pub(crate) fn amax<F: Float>(x: &Strided<'_, F>) -> F {
  let mut m = F::ZERO;
  for &v in x.iter() {
    let a = v.abs();
    if a != a {
      return a;
    }
    if a > m {
      m = a;
    }
  }
  m
}

/// Componentwise largest absolute element of a complex vector.
pub(crate) fn camax<F: Float>(x: &Strided<'_, Complex<F>>) -> Complex<F> {
  let mut re = F::ZERO;
  let mut im = F::ZERO;
  for v in x.iter() {
    let (ar, ai) = (v.re.abs(), v.im.abs());
    if ar != ar || ai != ai {
      return Complex::new(F::ZERO / F::ZERO, F::ZERO / F::ZERO);
    }
    if ar > re {
      re = ar;
    }
    if ai > im {
      im = ai;
    }
  }
  Complex::new(re, im)
}

/// Largest absolute elementwise product `|x[i] · y[i]|`: the exact values a dot product
/// deposits. NaN if any product is NaN (including `0 × Inf`).
pub(crate) fn amaxm<F: Float>(x: &Strided<'_, F>, y: &Strided<'_, F>) -> F {
  let mut m = F::ZERO;
  for (&a, &b) in x.iter().zip(y.iter()) {
    let p = (a * b).abs();
    if p != p {
      return p;
    }
    if p > m {
      m = p;
    }
  }
  m
}

/// Componentwise bound for a complex dot product: the real accumulator receives
/// `±(x.re·y.re)` and `±(x.im·y.im)`, the imaginary one `±(x.re·y.im)` and `±(x.im·y.re)`;
/// each side is bounded by the larger of its two product magnitudes.
pub(crate) fn camaxm<F: Float>(
  x: &Strided<'_, Complex<F>>,
  y: &Strided<'_, Complex<F>>,
) -> Complex<F> {
  let mut re = F::ZERO;
  let mut im = F::ZERO;
  for (a, b) in x.iter().zip(y.iter()) {
    let rr = (a.re * b.re).abs();
    let ii = (a.im * b.im).abs();
    let ri = (a.re * b.im).abs();
    let ir = (a.im * b.re).abs();
    if rr != rr || ii != ii || ri != ri || ir != ir {
      return Complex::new(F::ZERO / F::ZERO, F::ZERO / F::ZERO);
    }
    re = if rr > re { rr } else { re };
    re = if ii > re { ii } else { re };
    im = if ri > im { ri } else { im };
    im = if ir > im { ir } else { im };
  }
  Complex::new(re, im)
}
