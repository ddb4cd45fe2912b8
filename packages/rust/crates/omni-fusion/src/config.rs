//! Method-agnostic fusion configuration, shared by the CLI and fusion plans.
//!
//! `validate` performs every check that needs no I/O so configuration
//! mistakes surface before any run file is read.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};
use crate::fusion::DEFAULT_RRF_K;
use crate::lambda::{LambdaTable, load_lambda_table};
use crate::strategy::{FusionMethod, FusionParams, MethodName, require_unit_interval};

/// Default output run tag.
pub const DEFAULT_RUNTAG: &str = "omni.fusion";
/// Default interpolation weight / dynamic-fusion fallback λ.
pub const DEFAULT_ALPHA: f64 = 0.5;
/// Default number of documents emitted per query.
pub const DEFAULT_K: usize = 1000;
/// Default pool depth per input run.
pub const DEFAULT_DEPTH: usize = 1000;

/// Fusion settings as written by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Method name (case-insensitive)
    pub method: String,
    /// RRF constant
    pub rrf_k: u32,
    /// Interpolation weight, also the default λ for dynamic fusion
    pub alpha: f64,
    /// Documents emitted per query
    pub k: usize,
    /// Documents considered per input run per query
    pub depth: usize,
    /// Comma-separated per-run weights (weighted fusion)
    pub weights: Option<String>,
    /// Min-max normalize every run before fusing
    pub min_max_normalization: bool,
    /// JSONL per-query λ file (dynamic fusion)
    pub lambda_file: Option<PathBuf>,
    /// Re-sort input runs by score while loading
    pub resort: bool,
    /// Tag written in the output's last column
    pub runtag: String,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            method: MethodName::Rrf.as_str().to_string(),
            rrf_k: DEFAULT_RRF_K,
            alpha: DEFAULT_ALPHA,
            k: DEFAULT_K,
            depth: DEFAULT_DEPTH,
            weights: None,
            min_max_normalization: false,
            lambda_file: None,
            resort: false,
            runtag: DEFAULT_RUNTAG.to_string(),
        }
    }
}

/// A configuration that passed every I/O-free check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    /// Parsed method name
    pub method: MethodName,
    /// Parsed weights (weighted fusion only)
    pub weights: Option<Vec<f64>>,
    /// Merge parameters
    pub params: FusionParams,
}

/// Parse a comma-separated weight list such as `"0.7, 0.3"`.
///
/// # Errors
///
/// Returns [`FusionError::Config`] for any non-numeric entry.
pub fn parse_weights(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| {
                FusionError::config(format!(
                    "Invalid weight value: {part}. Weights must be numeric."
                ))
            })
        })
        .collect()
}

impl FusionConfig {
    /// Check the configuration against the number of input runs, without I/O.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Config`] for an unknown method, non-positive
    /// `depth`/`k`/`rrf_k`, `alpha` outside `[0, 1]` where it is used, a
    /// wrong run count, or a missing or mismatched method parameter.
    pub fn validate(&self, run_count: usize) -> Result<ValidatedConfig> {
        let method: MethodName = self.method.parse()?;

        if self.depth == 0 {
            return Err(FusionError::config("Option depth must be greater than 0"));
        }
        if self.k == 0 {
            return Err(FusionError::config("Option k must be greater than 0"));
        }
        if run_count == 0 {
            return Err(FusionError::config("At least one run is required"));
        }

        let mut weights = None;
        match method {
            MethodName::Average | MethodName::Normalize => {}
            MethodName::Rrf => {
                if self.rrf_k == 0 {
                    return Err(FusionError::config("Option rrf_k must be greater than 0"));
                }
            }
            MethodName::Interpolation => {
                if run_count != 2 {
                    return Err(FusionError::config(format!(
                        "Interpolation requires exactly 2 runs, got {run_count}"
                    )));
                }
                require_unit_interval("alpha", self.alpha)?;
            }
            MethodName::Weighted => {
                let raw = self
                    .weights
                    .as_deref()
                    .filter(|w| !w.trim().is_empty())
                    .ok_or_else(|| {
                        FusionError::config("Weights must be provided for weighted fusion method")
                    })?;
                let parsed = parse_weights(raw)?;
                if parsed.len() != run_count {
                    return Err(FusionError::config(format!(
                        "Number of runs must match number of weights ({run_count} runs, {} weights)",
                        parsed.len()
                    )));
                }
                weights = Some(parsed);
            }
            MethodName::Dynamic => {
                if run_count != 2 {
                    return Err(FusionError::config(format!(
                        "Dynamic fusion requires exactly 2 runs, got {run_count}"
                    )));
                }
                if self.lambda_file.as_ref().is_none_or(|p| p.as_os_str().is_empty()) {
                    return Err(FusionError::config(
                        "Lambda file must be provided for dynamic fusion method",
                    ));
                }
                require_unit_interval("alpha", self.alpha)?;
            }
        }

        Ok(ValidatedConfig {
            method,
            weights,
            params: FusionParams {
                depth: self.depth,
                k: self.k,
                min_max_normalization: self.min_max_normalization,
            },
        })
    }

    /// Validate, then resolve the typed method. Reads the lambda file for
    /// dynamic fusion; no other method touches the filesystem.
    ///
    /// # Errors
    ///
    /// Any error of [`FusionConfig::validate`], plus lambda-file I/O and
    /// parse errors.
    pub fn build_method(&self, run_count: usize) -> Result<(FusionMethod, FusionParams)> {
        let validated = self.validate(run_count)?;
        let method = match validated.method {
            MethodName::Average => FusionMethod::Average,
            MethodName::Rrf => FusionMethod::Rrf { k: self.rrf_k },
            MethodName::Interpolation => FusionMethod::Interpolation { alpha: self.alpha },
            MethodName::Weighted => FusionMethod::Weighted {
                weights: validated.weights.unwrap_or_default(),
            },
            MethodName::Dynamic => {
                let path = self.lambda_file.as_ref().ok_or_else(|| {
                    FusionError::config("Lambda file must be provided for dynamic fusion method")
                })?;
                FusionMethod::Dynamic {
                    table: LambdaTable::new(load_lambda_table(path)?, self.alpha),
                }
            }
            MethodName::Normalize => FusionMethod::Normalize,
        };
        Ok((method, validated.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(method: &str) -> FusionConfig {
        FusionConfig {
            method: method.to_string(),
            ..FusionConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = FusionConfig::default();
        assert_eq!(cfg.method, "rrf");
        assert_eq!(cfg.rrf_k, 60);
        assert_eq!((cfg.k, cfg.depth), (1000, 1000));
        assert_eq!(cfg.runtag, "omni.fusion");
    }

    #[test]
    fn test_parse_weights() {
        assert_eq!(parse_weights("0.7, 0.3").unwrap(), vec![0.7, 0.3]);
        let err = parse_weights("0.7,abc").unwrap_err().to_string();
        assert!(err.contains("Invalid weight value: abc"));
    }

    #[test]
    fn test_validate_rejects_bad_depth_and_k() {
        let cfg = FusionConfig {
            depth: 0,
            ..config("average")
        };
        assert!(cfg.validate(2).is_err());
        let cfg = FusionConfig {
            k: 0,
            ..config("average")
        };
        assert!(cfg.validate(2).is_err());
    }

    #[test]
    fn test_validate_weighted() {
        assert!(config("weighted").validate(2).is_err());

        let cfg = FusionConfig {
            weights: Some("0.2,0.8".to_string()),
            ..config("weighted")
        };
        assert_eq!(cfg.validate(2).unwrap().weights, Some(vec![0.2, 0.8]));
        assert!(cfg.validate(3).is_err());
    }

    #[test]
    fn test_validate_dynamic_needs_lambda_file_and_two_runs() {
        assert!(config("dynamic").validate(2).is_err());
        let cfg = FusionConfig {
            lambda_file: Some(PathBuf::from("lambdas.jsonl")),
            ..config("dynamic")
        };
        assert!(cfg.validate(2).is_ok());
        assert!(cfg.validate(3).is_err());
    }

    #[test]
    fn test_validate_is_io_free() {
        // A missing lambda file only fails once the method is built.
        let cfg = FusionConfig {
            lambda_file: Some(PathBuf::from("/nonexistent/lambdas.jsonl")),
            ..config("dynamic")
        };
        assert!(cfg.validate(2).is_ok());
        assert!(matches!(cfg.build_method(2), Err(FusionError::Io { .. })));
    }

    #[test]
    fn test_unknown_method() {
        let err = config("borda").validate(2).unwrap_err().to_string();
        assert!(err.contains("Supported methods are"));
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let cfg: FusionConfig = serde_yaml::from_str("method: interpolation\nalpha: 0.3\n").unwrap();
        assert_eq!(cfg.method, "interpolation");
        assert!((cfg.alpha - 0.3).abs() < 1e-12);
        assert_eq!(cfg.rrf_k, 60);
    }
}
