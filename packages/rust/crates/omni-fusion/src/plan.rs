//! Fusion plans: several fusion methods over one shared set of runs.
//!
//! ```yaml
//! resort: false
//! runs:
//!   - file: runs/bm25.trec
//!   - file: runs/dense.trec
//! methods:
//!   - name: rrf
//!     output: fused/rrf.trec
//!   - name: interpolation
//!     alpha: 0.3
//!     output: fused/interp.trec
//! ```
//!
//! Relative paths resolve against the plan file's directory. All entries are
//! validated before any run is read, and runs are loaded once.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::FusionConfig;
use crate::error::{FusionError, Result};
use crate::job::{FusionSummary, fuse_and_save, load_runs};

/// An input run of a plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanRun {
    /// Run file path
    pub file: PathBuf,
}

/// Weights written either as a YAML list or as `"0.7,0.3"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PlanWeights {
    /// `[0.7, 0.3]`
    List(Vec<f64>),
    /// `"0.7,0.3"`
    Text(String),
}

impl PlanWeights {
    fn to_text(&self) -> String {
        match self {
            PlanWeights::List(values) => values
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(","),
            PlanWeights::Text(text) => text.clone(),
        }
    }
}

/// One fusion method entry of a plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanMethod {
    /// Method name
    pub name: String,
    /// Output run file
    pub output: PathBuf,
    /// RRF constant
    pub rrf_k: Option<u32>,
    /// Interpolation weight / default λ
    pub alpha: Option<f64>,
    /// Documents emitted per query
    pub k: Option<usize>,
    /// Pool depth per run
    pub depth: Option<usize>,
    /// Per-run weights
    pub weights: Option<PlanWeights>,
    /// Min-max normalization pre-pass
    pub min_max_normalization: Option<bool>,
    /// Per-query λ file
    pub lambda_file: Option<PathBuf>,
    /// Output run tag
    pub runtag: Option<String>,
}

impl PlanMethod {
    fn to_config(&self, base_dir: &Path, resort: bool) -> FusionConfig {
        let defaults = FusionConfig::default();
        FusionConfig {
            method: self.name.clone(),
            rrf_k: self.rrf_k.unwrap_or(defaults.rrf_k),
            alpha: self.alpha.unwrap_or(defaults.alpha),
            k: self.k.unwrap_or(defaults.k),
            depth: self.depth.unwrap_or(defaults.depth),
            weights: self.weights.as_ref().map(PlanWeights::to_text),
            min_max_normalization: self
                .min_max_normalization
                .unwrap_or(defaults.min_max_normalization),
            lambda_file: self.lambda_file.as_ref().map(|p| base_dir.join(p)),
            resort,
            runtag: self.runtag.clone().unwrap_or(defaults.runtag),
        }
    }
}

/// A parsed fusion plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FusionPlan {
    /// Re-sort every input run by score while loading
    #[serde(default)]
    pub resort: bool,
    /// Shared input runs, in fusion order
    pub runs: Vec<PlanRun>,
    /// Methods to run
    pub methods: Vec<PlanMethod>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl FusionPlan {
    /// Parse plan YAML; relative paths resolve against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Plan`] for invalid YAML.
    pub fn from_yaml_str(text: &str, label: &Path, base_dir: &Path) -> Result<Self> {
        let mut plan: FusionPlan =
            serde_yaml::from_str(text).map_err(|source| FusionError::Plan {
                path: label.to_path_buf(),
                source,
            })?;
        plan.base_dir = base_dir.to_path_buf();
        Ok(plan)
    }

    /// Read a plan file.
    ///
    /// # Errors
    ///
    /// I/O errors reading the file, or [`FusionError::Plan`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| FusionError::io(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml_str(&text, path, base_dir)
    }

    fn run_paths(&self) -> Vec<PathBuf> {
        self.runs.iter().map(|r| self.base_dir.join(&r.file)).collect()
    }

    /// Validate every entry, load the runs once, then fuse each entry.
    ///
    /// # Errors
    ///
    /// The first configuration, parse or I/O error stops the plan. Outputs of
    /// entries that already finished stay on disk.
    pub fn execute(&self) -> Result<Vec<FusionSummary>> {
        if self.runs.is_empty() {
            return Err(FusionError::config("Fusion plan lists no runs"));
        }
        if self.methods.is_empty() {
            return Err(FusionError::config("Fusion plan lists no methods"));
        }

        let run_paths = self.run_paths();
        let configs: Vec<(FusionConfig, PathBuf)> = self
            .methods
            .iter()
            .map(|m| (m.to_config(&self.base_dir, self.resort), self.base_dir.join(&m.output)))
            .collect();
        for (cfg, _) in &configs {
            cfg.validate(run_paths.len())?;
        }

        let mut built = Vec::with_capacity(configs.len());
        for (cfg, output) in &configs {
            let (method, params) = cfg.build_method(run_paths.len())?;
            built.push((method, params, output, cfg.runtag.as_str()));
        }

        tracing::info!(
            runs = run_paths.len(),
            methods = built.len(),
            "executing fusion plan"
        );
        let runs = load_runs(&run_paths, self.resort)?;

        built
            .iter()
            .map(|(method, params, output, runtag)| {
                fuse_and_save(&runs, method, params, output, runtag)
            })
            .collect()
    }
}
