//! The vectorised accumulate kernels.
//!
//! Strategy: replicate the accumulator's fold terms across the register lanes (every lane
//! starts from the *same* seed, broadcast from the primaries), let each lane deposit a
//! disjoint subsequence of the chunk with the in-register cascade, then consolidate: sum the
//! lanes in fixed lane order after subtracting the `LANES - 1` extra seed copies. Lane values
//! only ever differ from the seed by accumulated deposit drift, all of it in multiples of the
//! term's ulp inside one exponent window, so the consolidation arithmetic is exact and the
//! result is bit-identical to the scalar kernel over the same chunk.
//!
//! The in-register deposit is the same forced-bit cascade as [`Binned::deposit`], expressed
//! in the `q = s; s += (v | blp); q -= s; v += q` form that needs no per-lane memory traffic.
//! Carries are untouched during a chunk; the driver renormalises between chunks, which also
//! bounds each lane's drift to the endurance limit.
//!
//! Top-of-range (index 0) and denormal-window accumulators never reach these kernels: the
//! drivers route them (and non-finite bounds) to the scalar path, whose deposit handles the
//! compressed anchor. For finite data both paths produce identical bits (tested).

use crate::binned::Binned;
use crate::float::{Float, Sealed};
use super::vector::Simd;

/// One deposit of `v` into the lane-replicated fold terms `s`.
#[inline(always)]
unsafe fn cascade<V: Simd, const FOLD: usize>(s: &mut [V; FOLD], mut v: V) {
  unsafe {
    for i in 0..FOLD - 1 {
      let q = s[i];
      s[i] = s[i].add(v.or_blp());
      let q = q.sub(s[i]);
      v = v.add(q);
    }
    s[FOLD - 1] = s[FOLD - 1].add(v.or_blp());
  }
}

/// Every lane starts from the accumulator's current primaries.
#[inline(always)]
unsafe fn broadcast<V: Simd, const FOLD: usize>(acc: &Binned<FOLD, V::Elem>) -> [V; FOLD] {
  unsafe {
    let mut s = [V::splat(acc.primary[0]); FOLD];
    for i in 1..FOLD {
      s[i] = V::splat(acc.primary[i]);
    }
    s
  }
}

/// Fold the lanes back into the accumulator: lane 0 keeps the seed, the others contribute
/// their drift, summed left to right so the order is fixed by lane index.
#[inline(always)]
unsafe fn consolidate<V: Simd, const FOLD: usize>(s: [V; FOLD], acc: &mut Binned<FOLD, V::Elem>) {
  let mut buf = [<V::Elem as Sealed>::ZERO; 8];
  for i in 0..FOLD {
    unsafe { s[i].write(&mut buf) };
    let seed = acc.primary[i];
    let mut total = buf[0];
    for lane in 1..V::LANES {
      total += buf[lane] - seed;
    }
    acc.primary[i] = total;
  }
}

/// As [`broadcast`]/[`consolidate`], but lanes alternate between the real and imaginary
/// accumulators of an interleaved complex stream.
#[inline(always)]
unsafe fn broadcast_pairs<V: Simd, const FOLD: usize>(
  re: &Binned<FOLD, V::Elem>,
  im: &Binned<FOLD, V::Elem>,
) -> [V; FOLD] {
  unsafe {
    let mut s = [V::splat_pair(re.primary[0], im.primary[0]); FOLD];
    for i in 1..FOLD {
      s[i] = V::splat_pair(re.primary[i], im.primary[i]);
    }
    s
  }
}

#[inline(always)]
unsafe fn consolidate_pairs<V: Simd, const FOLD: usize>(
  s: [V; FOLD],
  re: &mut Binned<FOLD, V::Elem>,
  im: &mut Binned<FOLD, V::Elem>,
) {
  let mut buf = [<V::Elem as Sealed>::ZERO; 8];
  for i in 0..FOLD {
    unsafe { s[i].write(&mut buf) };
    let (seed_re, seed_im) = (re.primary[i], im.primary[i]);
    let mut total_re = buf[0];
    let mut total_im = buf[1];
    let mut lane = 2;
    while lane < V::LANES {
      total_re += buf[lane] - seed_re;
      total_im += buf[lane + 1] - seed_im;
      lane += 2;
    }
    re.primary[i] = total_re;
    im.primary[i] = total_im;
  }
}

#[inline(always)]
unsafe fn sum_chunk<V: Simd, const FOLD: usize>(x: &[V::Elem], acc: &mut Binned<FOLD, V::Elem>) {
  unsafe {
    let mut s = broadcast::<V, FOLD>(acc);
    let mut i = 0;
    while i + V::LANES <= x.len() {
      cascade(&mut s, V::load(x.as_ptr().add(i)));
      i += V::LANES;
    }
    if i < x.len() {
      cascade(&mut s, V::load_partial(x.as_ptr().add(i), x.len() - i));
    }
    consolidate(s, acc);
  }
}

#[inline(always)]
unsafe fn asum_chunk<V: Simd, const FOLD: usize>(x: &[V::Elem], acc: &mut Binned<FOLD, V::Elem>) {
  unsafe {
    let mut s = broadcast::<V, FOLD>(acc);
    let mut i = 0;
    while i + V::LANES <= x.len() {
      cascade(&mut s, V::load(x.as_ptr().add(i)).abs());
      i += V::LANES;
    }
    if i < x.len() {
      cascade(&mut s, V::load_partial(x.as_ptr().add(i), x.len() - i).abs());
    }
    consolidate(s, acc);
  }
}

#[inline(always)]
unsafe fn ssq_chunk<V: Simd, const FOLD: usize>(
  x: &[V::Elem],
  recip: V::Elem,
  acc: &mut Binned<FOLD, V::Elem>,
) {
  unsafe {
    let mut s = broadcast::<V, FOLD>(acc);
    let r = V::splat(recip);
    let mut i = 0;
    while i + V::LANES <= x.len() {
      let v = V::load(x.as_ptr().add(i)).mul(r);
      cascade(&mut s, v.mul(v));
      i += V::LANES;
    }
    if i < x.len() {
      let v = V::load_partial(x.as_ptr().add(i), x.len() - i).mul(r);
      cascade(&mut s, v.mul(v));
    }
    consolidate(s, acc);
  }
}

#[inline(always)]
unsafe fn dot_chunk<V: Simd, const FOLD: usize>(
  x: &[V::Elem],
  y: &[V::Elem],
  acc: &mut Binned<FOLD, V::Elem>,
) {
  debug_assert_eq!(x.len(), y.len());
  unsafe {
    let mut s = broadcast::<V, FOLD>(acc);
    let mut i = 0;
    while i + V::LANES <= x.len() {
      cascade(&mut s, V::load(x.as_ptr().add(i)).mul(V::load(y.as_ptr().add(i))));
      i += V::LANES;
    }
    if i < x.len() {
      let n = x.len() - i;
      cascade(
        &mut s,
        V::load_partial(x.as_ptr().add(i), n).mul(V::load_partial(y.as_ptr().add(i), n)),
      );
    }
    consolidate(s, acc);
  }
}

/// Interleaved complex sum over the flattened `[re, im, re, im, ...]` stream; `flat.len()` is
/// even, so the zero-filled tail never splits a pair across the lane parity.
#[inline(always)]
unsafe fn csum_chunk<V: Simd, const FOLD: usize>(
  flat: &[V::Elem],
  re: &mut Binned<FOLD, V::Elem>,
  im: &mut Binned<FOLD, V::Elem>,
) {
  debug_assert_eq!(flat.len() % 2, 0);
  unsafe {
    let mut s = broadcast_pairs::<V, FOLD>(re, im);
    let mut i = 0;
    while i + V::LANES <= flat.len() {
      cascade(&mut s, V::load(flat.as_ptr().add(i)));
      i += V::LANES;
    }
    if i < flat.len() {
      cascade(&mut s, V::load_partial(flat.as_ptr().add(i), flat.len() - i));
    }
    consolidate_pairs(s, re, im);
  }
}

/// The per-width entry points: thin monomorphic-feature wrappers around the generic chunks.
/// SSE2 is part of the x86_64 baseline, so only the AVX versions carry a feature gate.
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_64 {
  use super::*;

  pub(crate) unsafe fn sum_sse<const FOLD: usize, F: Float>(x: &[F], acc: &mut Binned<FOLD, F>) {
    unsafe { sum_chunk::<F::Sse, FOLD>(x, acc) }
  }

  #[target_feature(enable = "avx")]
  pub(crate) unsafe fn sum_avx<const FOLD: usize, F: Float>(x: &[F], acc: &mut Binned<FOLD, F>) {
    unsafe { sum_chunk::<F::Avx, FOLD>(x, acc) }
  }

  pub(crate) unsafe fn asum_sse<const FOLD: usize, F: Float>(x: &[F], acc: &mut Binned<FOLD, F>) {
    unsafe { asum_chunk::<F::Sse, FOLD>(x, acc) }
  }

  #[target_feature(enable = "avx")]
  pub(crate) unsafe fn asum_avx<const FOLD: usize, F: Float>(x: &[F], acc: &mut Binned<FOLD, F>) {
    unsafe { asum_chunk::<F::Avx, FOLD>(x, acc) }
  }

  pub(crate) unsafe fn ssq_sse<const FOLD: usize, F: Float>(
    x: &[F],
    recip: F,
    acc: &mut Binned<FOLD, F>,
  ) {
    unsafe { ssq_chunk::<F::Sse, FOLD>(x, recip, acc) }
  }

  #[target_feature(enable = "avx")]
  pub(crate) unsafe fn ssq_avx<const FOLD: usize, F: Float>(
    x: &[F],
    recip: F,
    acc: &mut Binned<FOLD, F>,
  ) {
    unsafe { ssq_chunk::<F::Avx, FOLD>(x, recip, acc) }
  }

  pub(crate) unsafe fn dot_sse<const FOLD: usize, F: Float>(
    x: &[F],
    y: &[F],
    acc: &mut Binned<FOLD, F>,
  ) {
    unsafe { dot_chunk::<F::Sse, FOLD>(x, y, acc) }
  }

  #[target_feature(enable = "avx")]
  pub(crate) unsafe fn dot_avx<const FOLD: usize, F: Float>(
    x: &[F],
    y: &[F],
    acc: &mut Binned<FOLD, F>,
  ) {
    unsafe { dot_chunk::<F::Avx, FOLD>(x, y, acc) }
  }

  pub(crate) unsafe fn csum_sse<const FOLD: usize, F: Float>(
    flat: &[F],
    re: &mut Binned<FOLD, F>,
    im: &mut Binned<FOLD, F>,
  ) {
    unsafe { csum_chunk::<F::Sse, FOLD>(flat, re, im) }
  }

  #[target_feature(enable = "avx")]
  pub(crate) unsafe fn csum_avx<const FOLD: usize, F: Float>(
    flat: &[F],
    re: &mut Binned<FOLD, F>,
    im: &mut Binned<FOLD, F>,
  ) {
    unsafe { csum_chunk::<F::Avx, FOLD>(flat, re, im) }
  }
}
