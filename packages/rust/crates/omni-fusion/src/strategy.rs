//! Fusion strategies: which rescoring each run gets before the merge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};
use crate::fusion::{RescoreMethod, merge, rescore, rescore_per_query};
use crate::lambda::LambdaTable;
use crate::types::Run;

/// Method names accepted on the command line and in plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodName {
    /// Unweighted mean of scores
    Average,
    /// Reciprocal rank fusion
    Rrf,
    /// Convex combination of two runs
    Interpolation,
    /// Per-run weights
    Weighted,
    /// Interpolation with per-query λ
    Dynamic,
    /// Min-max normalize, then average
    Normalize,
}

impl MethodName {
    /// All methods, in documentation order.
    pub const ALL: [MethodName; 6] = [
        MethodName::Average,
        MethodName::Rrf,
        MethodName::Interpolation,
        MethodName::Weighted,
        MethodName::Dynamic,
        MethodName::Normalize,
    ];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MethodName::Average => "average",
            MethodName::Rrf => "rrf",
            MethodName::Interpolation => "interpolation",
            MethodName::Weighted => "weighted",
            MethodName::Dynamic => "dynamic",
            MethodName::Normalize => "normalize",
        }
    }

    fn supported() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodName {
    type Err = FusionError;

    fn from_str(raw: &str) -> Result<Self> {
        let wanted = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                FusionError::config(format!(
                    "Unknown fusion method: {raw}. Supported methods are: {}.",
                    Self::supported()
                ))
            })
    }
}

/// A fusion method together with the parameters only it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FusionMethod {
    /// Scale every run by `1/N`, then sum.
    Average,
    /// Replace scores by `1 / (rank + k)`, then sum.
    Rrf {
        /// Smoothing constant, at least 1
        k: u32,
    },
    /// Run 0 scaled by `alpha`, run 1 by `1 - alpha`.
    Interpolation {
        /// Weight of the first run
        alpha: f64,
    },
    /// Run `i` scaled by `weights[i]`.
    Weighted {
        /// One weight per run
        weights: Vec<f64>,
    },
    /// Interpolation with λ looked up per query.
    Dynamic {
        /// Per-query λ for run 0, with default α
        table: LambdaTable,
    },
    /// Min-max normalize every run, then average.
    Normalize,
}

impl FusionMethod {
    /// The method's name.
    #[must_use]
    pub fn name(&self) -> MethodName {
        match self {
            FusionMethod::Average => MethodName::Average,
            FusionMethod::Rrf { .. } => MethodName::Rrf,
            FusionMethod::Interpolation { .. } => MethodName::Interpolation,
            FusionMethod::Weighted { .. } => MethodName::Weighted,
            FusionMethod::Dynamic { .. } => MethodName::Dynamic,
            FusionMethod::Normalize => MethodName::Normalize,
        }
    }

    /// Check the method's preconditions against the number of input runs.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Config`] when there are no runs, when
    /// interpolation or dynamic fusion get other than two runs, when the
    /// weight count differs from the run count, or when `k`/`alpha` are out
    /// of range.
    pub fn validate(&self, run_count: usize) -> Result<()> {
        if run_count == 0 {
            return Err(FusionError::config("At least one run is required"));
        }
        match self {
            FusionMethod::Average | FusionMethod::Normalize => Ok(()),
            FusionMethod::Rrf { k } => {
                if *k == 0 {
                    return Err(FusionError::config("Option rrf_k must be greater than 0"));
                }
                Ok(())
            }
            FusionMethod::Interpolation { alpha } => {
                require_two_runs("Interpolation", run_count)?;
                require_unit_interval("alpha", *alpha)
            }
            FusionMethod::Weighted { weights } => {
                if weights.len() != run_count {
                    return Err(FusionError::config(format!(
                        "Number of runs must match number of weights ({run_count} runs, {} weights)",
                        weights.len()
                    )));
                }
                Ok(())
            }
            FusionMethod::Dynamic { table } => {
                require_two_runs("Dynamic fusion", run_count)?;
                require_unit_interval("alpha", table.default_weight())
            }
        }
    }
}

fn require_two_runs(what: &str, run_count: usize) -> Result<()> {
    if run_count == 2 {
        Ok(())
    } else {
        Err(FusionError::config(format!(
            "{what} requires exactly 2 runs, got {run_count}"
        )))
    }
}

pub(crate) fn require_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FusionError::config(format!(
            "Option {name} must be within [0, 1], got {value}"
        )))
    }
}

/// Method-independent merge parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionParams {
    /// Entries considered per input run per query
    pub depth: usize,
    /// Entries emitted per query
    pub k: usize,
    /// Min-max normalize every run before the method's own rescoring
    pub min_max_normalization: bool,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            depth: usize::MAX,
            k: usize::MAX,
            min_max_normalization: false,
        }
    }
}

fn scale_all(runs: &mut [Run], factor: f64) {
    for run in runs {
        rescore(RescoreMethod::Scale, 0, factor, run);
    }
}

/// Fuse `runs` with `method`.
///
/// The inputs are cloned before rescoring, so the same runs can be fused
/// again with another method.
///
/// # Errors
///
/// Returns [`FusionError::Config`] when the method's preconditions fail
/// (see [`FusionMethod::validate`]) or when `depth`/`k` is zero.
pub fn fuse(runs: &[Run], method: &FusionMethod, params: &FusionParams) -> Result<Run> {
    method.validate(runs.len())?;
    if params.depth == 0 || params.k == 0 {
        return Err(FusionError::config(
            "Options depth and k must be greater than 0",
        ));
    }

    let mut runs = runs.to_vec();

    if params.min_max_normalization {
        tracing::debug!(runs = runs.len(), "applying min-max normalization pre-pass");
        for run in &mut runs {
            rescore(RescoreMethod::Normalize, 0, 0.0, run);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let mean_factor = 1.0 / runs.len() as f64;

    match method {
        FusionMethod::Average => scale_all(&mut runs, mean_factor),
        FusionMethod::Rrf { k } => {
            for run in &mut runs {
                rescore(RescoreMethod::Rrf, *k, 0.0, run);
            }
        }
        FusionMethod::Interpolation { alpha } => {
            rescore(RescoreMethod::Scale, 0, *alpha, &mut runs[0]);
            rescore(RescoreMethod::Scale, 0, 1.0 - alpha, &mut runs[1]);
        }
        FusionMethod::Weighted { weights } => {
            for (run, weight) in runs.iter_mut().zip(weights) {
                rescore(RescoreMethod::Scale, 0, *weight, run);
            }
        }
        FusionMethod::Dynamic { table } => {
            let other = table.complement();
            let fallbacks = rescore_per_query(
                RescoreMethod::Scale,
                0,
                table.weights(),
                table.default_weight(),
                &mut runs[0],
            );
            rescore_per_query(
                RescoreMethod::Scale,
                0,
                other.weights(),
                other.default_weight(),
                &mut runs[1],
            );
            tracing::debug!(
                table_queries = table.len(),
                fallback_queries = fallbacks,
                default_lambda = table.default_weight(),
                "applied per-query lambda weights"
            );
        }
        FusionMethod::Normalize => {
            for run in &mut runs {
                rescore(RescoreMethod::Normalize, 0, 0.0, run);
            }
            scale_all(&mut runs, mean_factor);
        }
    }

    tracing::debug!(
        method = %method.name(),
        depth = params.depth,
        k = params.k,
        "merging rescored runs"
    );
    merge(&runs, params.depth, params.k)
}
