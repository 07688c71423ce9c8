//! The scalar accumulate loops: one [`Binned::deposit`] per mapped element, renormalising
//! every [`ENDURANCE`](crate::float::Sealed::ENDURANCE) deposits.
//!
//! This path handles everything the vector kernels do not (non-unit strides, top-of-range
//! anchors, windows touching subnormals, non-finite data), and is the reference the vector
//! kernels must match bit for bit.

use crate::binned::Binned;
use crate::complex::BinnedComplex;
use crate::float::{Float, Sealed};
use crate::strided::Strided;
use num_complex::Complex;

pub(crate) fn sum<const FOLD: usize, F: Float>(x: &Strided<'_, F>, acc: &mut Binned<FOLD, F>) {
  let mut n = 0;
  for &v in x.iter() {
    acc.deposit(v);
    n += 1;
    if n == F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}

pub(crate) fn asum<const FOLD: usize, F: Float>(x: &Strided<'_, F>, acc: &mut Binned<FOLD, F>) {
  let mut n = 0;
  for &v in x.iter() {
    acc.deposit(v.abs());
    n += 1;
    if n == F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}

pub(crate) fn ssq<const FOLD: usize, F: Float>(
  x: &Strided<'_, F>,
  recip: F,
  acc: &mut Binned<FOLD, F>,
) {
  let mut n = 0;
  for &v in x.iter() {
    let scaled = v * recip;
    acc.deposit(scaled * scaled);
    n += 1;
    if n == F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}

pub(crate) fn dot<const FOLD: usize, F: Float>(
  x: &Strided<'_, F>,
  y: &Strided<'_, F>,
  acc: &mut Binned<FOLD, F>,
) {
  let mut n = 0;
  for (&a, &b) in x.iter().zip(y.iter()) {
    acc.deposit(a * b);
    n += 1;
    if n == F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}

pub(crate) fn csum<const FOLD: usize, F: Float>(
  x: &Strided<'_, Complex<F>>,
  acc: &mut BinnedComplex<FOLD, F>,
) {
  let mut n = 0;
  for &z in x.iter() {
    acc.deposit(z);
    n += 1;
    if n == F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}

pub(crate) fn casum<const FOLD: usize, F: Float>(
  x: &Strided<'_, Complex<F>>,
  acc: &mut Binned<FOLD, F>,
) {
  // Two deposits per element, so half the elements per renormalisation.
  let mut n = 0;
  for z in x.iter() {
    acc.deposit(z.re.abs());
    acc.deposit(z.im.abs());
    n += 2;
    if n >= F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}

pub(crate) fn cssq<const FOLD: usize, F: Float>(
  x: &Strided<'_, Complex<F>>,
  recip: F,
  acc: &mut Binned<FOLD, F>,
) {
  let mut n = 0;
  for z in x.iter() {
    let re = z.re * recip;
    let im = z.im * recip;
    acc.deposit(re * re);
    acc.deposit(im * im);
    n += 2;
    if n >= F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}

/// Complex dot product; `conj` selects `Σ conj(x)·y` over `Σ x·y`. Each cross product is
/// deposited separately, so nothing is lost to an intermediate rounded add.
pub(crate) fn cdot<const FOLD: usize, F: Float>(
  x: &Strided<'_, Complex<F>>,
  y: &Strided<'_, Complex<F>>,
  conj: bool,
  acc: &mut BinnedComplex<FOLD, F>,
) {
  let mut n = 0;
  for (a, b) in x.iter().zip(y.iter()) {
    let (rr, ii) = (a.re * b.re, a.im * b.im);
    let (ri, ir) = (a.re * b.im, a.im * b.re);
    if conj {
      acc.re.deposit(rr);
      acc.re.deposit(ii);
      acc.im.deposit(ri);
      acc.im.deposit(-ir);
    } else {
      acc.re.deposit(rr);
      acc.re.deposit(-ii);
      acc.im.deposit(ri);
      acc.im.deposit(ir);
    }
    n += 2;
    if n >= F::ENDURANCE {
      acc.renorm();
      n = 0;
    }
  }
  acc.renorm();
}
