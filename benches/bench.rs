//! Benchmarks of the binned reductions against naive native loops: the price of
//! reproducibility per element, per kernel variant, per fold.
//!
//! Run with `cargo bench -F bench`.

use binsum::bench::{Kernel, dot_into_with, sum_into_with};
use binsum::{Binned, Strided};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn test_vector(n: usize) -> Vec<f64> {
  // A fixed mix of magnitudes; the kernels are data-independent, this just keeps the
  // comparison against the naive sum honest.
  let mut state: u64 = 0x9e3779b97f4a7c15;
  (0..n)
    .map(|_| {
      state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
      let exp = 1000 + (state >> 52) % 64;
      f64::from_bits((state & (1 << 63 | (1 << 52) - 1)) | exp << 52)
    })
    .collect()
}

fn available_kernels() -> Vec<(&'static str, Kernel)> {
  let mut v = vec![("scalar", Kernel::Scalar)];
  #[cfg(target_arch = "x86_64")]
  {
    v.push(("sse", Kernel::Sse));
    if is_x86_feature_detected!("avx") {
      v.push(("avx", Kernel::Avx));
    }
  }
  v
}

fn bench_sum(criterion: &mut Criterion) {
  let mut group = criterion.benchmark_group("sum");
  for n in [1_000, 100_000] {
    let x = test_vector(n);
    group.throughput(Throughput::Elements(n as u64));

    group.bench_with_input(BenchmarkId::new("naive", n), &x, |b, x| {
      b.iter(|| black_box(x.iter().sum::<f64>()))
    });

    for (name, kernel) in available_kernels() {
      group.bench_with_input(BenchmarkId::new(format!("binned3/{name}"), n), &x, |b, x| {
        b.iter(|| {
          let mut acc = Binned::<3, f64>::zero();
          sum_into_with(kernel, Strided::from_slice(x), &mut acc);
          black_box(acc.value())
        })
      });
    }

    group.bench_with_input(BenchmarkId::new("binned2/auto", n), &x, |b, x| {
      b.iter(|| {
        let mut acc = Binned::<2, f64>::zero();
        binsum::reduce::sum_into(Strided::from_slice(x), &mut acc);
        black_box(acc.value())
      })
    });
  }
  group.finish();
}

fn bench_dot(criterion: &mut Criterion) {
  let mut group = criterion.benchmark_group("dot");
  for n in [1_000, 100_000] {
    let x = test_vector(n);
    let y = test_vector(n);
    group.throughput(Throughput::Elements(n as u64));

    group.bench_with_input(BenchmarkId::new("naive", n), &n, |b, _| {
      b.iter(|| black_box(x.iter().zip(&y).map(|(a, b)| a * b).sum::<f64>()))
    });

    for (name, kernel) in available_kernels() {
      group.bench_with_input(BenchmarkId::new(format!("binned3/{name}"), n), &n, |b, _| {
        b.iter(|| {
          let mut acc = Binned::<3, f64>::zero();
          dot_into_with(kernel, Strided::from_slice(&x), Strided::from_slice(&y), &mut acc);
          black_box(acc.value())
        })
      });
    }
  }
  group.finish();
}

fn bench_nrm2(criterion: &mut Criterion) {
  let mut group = criterion.benchmark_group("nrm2");
  for n in [1_000, 100_000] {
    let x = test_vector(n);
    group.throughput(Throughput::Elements(n as u64));

    group.bench_with_input(BenchmarkId::new("naive", n), &x, |b, x| {
      b.iter(|| black_box(x.iter().map(|v| v * v).sum::<f64>().sqrt()))
    });

    group.bench_with_input(BenchmarkId::new("binned3", n), &x, |b, x| {
      b.iter(|| black_box(binsum::nrm2(x)))
    });
  }
  group.finish();
}

criterion_group!(benches, bench_sum, bench_dot, bench_nrm2);
criterion_main!(benches);
