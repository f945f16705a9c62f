//! Synthetic workloads for benchmarks and manual testing.

pub mod workload;
