//! Fusion primitives: score rewriting and run merging.
//!
//! Layout: `kernels` (RRF term, min-max), `rescore` (per-run transforms),
//! `merge` (union/sum with depth and k truncation).

mod kernels;
mod merge;
mod rescore;

pub use kernels::{DEFAULT_RRF_K, min_max, min_max_scale, rrf_term};
pub use merge::{FUSED_TAG, merge};
pub use rescore::{RescoreMethod, rescore, rescore_per_query};
