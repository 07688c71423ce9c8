//! Re-exports of internals for the criterion benchmarks (`cargo bench -F bench`). Not a
//! public API: shapes here change without notice.

pub use crate::reduce::{
  Kernel, asum_into_with, csum_into_with, dot_into_with, ssq_into_with, sum_into_with,
};
