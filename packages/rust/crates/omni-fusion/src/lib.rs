//! omni-fusion - Rank-list fusion for TREC run files
//!
//! Combines ranked lists produced by independent retrievers (sparse, dense,
//! ...) into one ranking per query, approximating a hybrid retriever without
//! re-running retrieval.
//!
//! # Architecture (ODF-REP Compliant)
//!
//! ```text
//! omni-fusion/src/
//! ├── lib.rs        # Re-exports (this file)
//! ├── error.rs      # FusionError enum
//! ├── types.rs      # ScoredDoc, QueryRanking, Run
//! ├── run_file.rs   # TREC run parse / render / atomic write
//! ├── fusion/       # kernels, rescore, merge
//! ├── lambda.rs     # Per-query λ table (JSONL)
//! ├── strategy.rs   # FusionMethod sum type + fuse()
//! ├── config.rs     # FusionConfig (CLI / YAML) and validation
//! ├── job.rs        # validate → load → fuse → save
//! └── plan.rs       # YAML fusion plans
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_fusion::{FusionMethod, FusionParams, fuse, read_run, write_run};
//!
//! let runs = vec![read_run("bm25.trec", false)?, read_run("dense.trec", false)?];
//! let fused = fuse(&runs, &FusionMethod::Rrf { k: 60 }, &FusionParams::default())?;
//! write_run("fused.trec", &fused, "omni.fusion")?;
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
mod error;
pub mod fusion;
pub mod job;
pub mod lambda;
pub mod plan;
pub mod run_file;
pub mod strategy;
mod types;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use config::{FusionConfig, ValidatedConfig, parse_weights};
pub use error::{FusionError, Result};
pub use job::{FusionJob, FusionSummary};
pub use lambda::{LambdaTable, load_lambda_table, parse_lambda_table};
pub use plan::FusionPlan;
pub use run_file::{parse_run, read_run, render_run, write_run};
pub use strategy::{FusionMethod, FusionParams, MethodName, fuse};
pub use types::{QueryRanking, Run, ScoredDoc};
