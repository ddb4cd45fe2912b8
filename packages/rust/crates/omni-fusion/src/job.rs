//! One fusion job: validate → load → fuse → save.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::config::FusionConfig;
use crate::error::Result;
use crate::run_file::{read_run, write_run};
use crate::strategy::{FusionMethod, FusionParams, MethodName, fuse};
use crate::types::Run;

/// What a finished job wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FusionSummary {
    /// Output run file
    pub output: PathBuf,
    /// Method used
    pub method: MethodName,
    /// Queries in the fused run
    pub queries: usize,
    /// (query, document) lines written
    pub documents: usize,
    /// Tag written in the last column
    pub runtag: String,
}

/// Load run files in order, logging per-file timing.
///
/// # Errors
///
/// The first I/O or parse error aborts the load.
pub fn load_runs(paths: &[PathBuf], resort: bool) -> Result<Vec<Run>> {
    let started = Instant::now();
    let mut runs = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        let load_start = Instant::now();
        let run = read_run(path, resort)?;
        tracing::info!(
            "[TIMING] Loading run file {}/{} ({}): {:.3} seconds ({} queries, {} docs)",
            i + 1,
            paths.len(),
            path.display(),
            load_start.elapsed().as_secs_f64(),
            run.len(),
            run.doc_count()
        );
        runs.push(run);
    }
    tracing::info!(
        "[TIMING] Total run file loading: {:.3} seconds",
        started.elapsed().as_secs_f64()
    );
    Ok(runs)
}

/// Fuse already-loaded runs and write the result to `output`.
///
/// # Errors
///
/// Fusion precondition errors, or I/O errors writing `output`.
pub fn fuse_and_save(
    runs: &[Run],
    method: &FusionMethod,
    params: &FusionParams,
    output: &Path,
    runtag: &str,
) -> Result<FusionSummary> {
    let started = Instant::now();
    let fused = fuse(runs, method, params)?;
    tracing::info!(
        "[TIMING] Fusion execution: {:.3} seconds",
        started.elapsed().as_secs_f64()
    );

    write_run(output, &fused, runtag)?;
    tracing::info!(
        output = %output.display(),
        queries = fused.len(),
        documents = fused.doc_count(),
        "wrote fused run"
    );

    Ok(FusionSummary {
        output: output.to_path_buf(),
        method: method.name(),
        queries: fused.len(),
        documents: fused.doc_count(),
        runtag: runtag.to_string(),
    })
}

/// A single fusion of run files into one output file.
#[derive(Debug, Clone)]
pub struct FusionJob {
    /// Input run files, in fusion order (order matters for interpolation,
    /// weighted and dynamic fusion)
    pub runs: Vec<PathBuf>,
    /// Output run file
    pub output: PathBuf,
    /// Method and parameters
    pub config: FusionConfig,
}

impl FusionJob {
    /// Run the job end to end.
    ///
    /// Configuration is checked before any file is opened; the output file
    /// only appears if every step succeeded.
    ///
    /// # Errors
    ///
    /// Configuration, parse and I/O errors, in that order of detection.
    pub fn run(&self) -> Result<FusionSummary> {
        let cfg = &self.config;
        tracing::info!("============ Initializing fusion ============");
        tracing::info!(
            runs = ?self.runs,
            runtag = %cfg.runtag,
            method = %cfg.method,
            rrf_k = cfg.rrf_k,
            alpha = cfg.alpha,
            k = cfg.k,
            depth = cfg.depth,
            resort = cfg.resort,
            min_max_normalization = cfg.min_max_normalization,
            "fusion configuration"
        );

        let (method, params) = cfg.build_method(self.runs.len())?;
        let runs = load_runs(&self.runs, cfg.resort)?;

        tracing::info!("============ Launching fusion ============");
        fuse_and_save(&runs, &method, &params, &self.output, &cfg.runtag)
    }
}
