#![allow(missing_docs)]

//! fuse-runs CLI: fuse TREC run files, or execute a YAML fusion plan.
//!
//! Logging goes to stderr (`RUST_LOG=omni_fusion=debug` for details); the
//! JSON summary of what was written goes to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use omni_fusion::config::{DEFAULT_ALPHA, DEFAULT_DEPTH, DEFAULT_K, DEFAULT_RUNTAG};
use omni_fusion::fusion::DEFAULT_RRF_K;
use omni_fusion::{FusionConfig, FusionJob, FusionPlan};

#[derive(Parser, Debug)]
#[command(
    name = "fuse-runs",
    about = "Fuse ranked TREC runs (average, rrf, interpolation, weighted, dynamic, normalize)",
    arg_required_else_help = true
)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fuse two or more run files into one.
    Fuse(FuseArgs),
    /// Execute every method of a YAML fusion plan.
    Plan {
        /// Plan file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct FuseArgs {
    /// Run files to fuse, in order.
    #[arg(long, required = true, num_args = 1.., value_name = "FILE")]
    runs: Vec<PathBuf>,

    /// Path to save the fused run.
    #[arg(long, short = 'o', value_name = "FILE")]
    output: PathBuf,

    /// Run tag written in the last column.
    #[arg(long, default_value = DEFAULT_RUNTAG)]
    runtag: String,

    /// Fusion method: average, rrf, interpolation, weighted, dynamic, normalize.
    #[arg(long, default_value = "rrf")]
    method: String,

    /// RRF constant.
    #[arg(long = "rrf-k", default_value_t = DEFAULT_RRF_K)]
    rrf_k: u32,

    /// Interpolation weight of the first run; default λ for dynamic fusion.
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,

    /// Documents to output per query.
    #[arg(long = "k", default_value_t = DEFAULT_K)]
    k: usize,

    /// Pool depth per run per query.
    #[arg(long, default_value_t = DEFAULT_DEPTH)]
    depth: usize,

    /// Comma-separated weights for weighted fusion (e.g. "0.7,0.3").
    #[arg(long)]
    weights: Option<String>,

    /// Apply min-max normalization before fusion.
    #[arg(long)]
    min_max_normalization: bool,

    /// JSONL file of per-query lambda values for dynamic fusion.
    #[arg(long, value_name = "FILE")]
    lambda_file: Option<PathBuf>,

    /// Re-sort input runs by score before fusion.
    #[arg(long)]
    resort: bool,
}

impl FuseArgs {
    fn into_job(self) -> FusionJob {
        FusionJob {
            runs: self.runs,
            output: self.output,
            config: FusionConfig {
                method: self.method,
                rrf_k: self.rrf_k,
                alpha: self.alpha,
                k: self.k,
                depth: self.depth,
                weights: self.weights,
                min_max_normalization: self.min_max_normalization,
                lambda_file: self.lambda_file,
                resort: self.resort,
                runtag: self.runtag,
            },
        }
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let rendered =
        serde_json::to_string(value).context("failed to serialize fusion summary as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "omni_fusion=debug,fuse_runs=debug"
        } else {
            "omni_fusion=info,fuse_runs=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Command::Fuse(args) => {
            let job = args.into_job();
            let summary = job
                .run()
                .with_context(|| format!("fusion into {} failed", job.output.display()))?;
            emit(&summary)
        }
        Command::Plan { file } => {
            let plan = FusionPlan::load(&file)
                .with_context(|| format!("failed to load fusion plan {}", file.display()))?;
            let summaries = plan
                .execute()
                .with_context(|| format!("fusion plan {} failed", file.display()))?;
            emit(&summaries)
        }
    }
}
