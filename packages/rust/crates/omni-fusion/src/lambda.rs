//! Per-query interpolation weights for dynamic fusion.
//!
//! The lambda file is JSONL, one object per line:
//!
//! ```text
//! {"query_id": "PLAIN-1008", "lambda": 0.3, "predicted_by": "..."}
//! ```
//!
//! Extra fields are ignored. Any bad line fails the whole load.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{FusionError, Result};

#[derive(Deserialize)]
struct LambdaLine {
    query_id: Value,
    lambda: f64,
}

/// Per-query weight table with a fallback for unlisted queries.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaTable {
    weights: HashMap<String, f64>,
    default_weight: f64,
}

impl LambdaTable {
    /// Pair a per-query weight map with the fallback weight.
    #[must_use]
    pub fn new(weights: HashMap<String, f64>, default_weight: f64) -> Self {
        Self {
            weights,
            default_weight,
        }
    }

    /// Weight for `query_id`, or the default.
    #[must_use]
    pub fn weight_for(&self, query_id: &str) -> f64 {
        self.weights
            .get(query_id)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// The `1 - λ` table applied to the second run.
    #[must_use]
    pub fn complement(&self) -> Self {
        Self {
            weights: self
                .weights
                .iter()
                .map(|(qid, w)| (qid.clone(), 1.0 - w))
                .collect(),
            default_weight: 1.0 - self.default_weight,
        }
    }

    /// Explicit per-query weights.
    #[must_use]
    pub fn weights(&self) -> &HashMap<String, f64> {
        &self.weights
    }

    /// Weight used for queries not in the table.
    #[must_use]
    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Number of queries with an explicit weight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no query has an explicit weight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

fn parse_line(line: &str) -> std::result::Result<(String, f64), String> {
    let parsed: LambdaLine = serde_json::from_str(line).map_err(|e| e.to_string())?;
    let query_id = match parsed.query_id {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => return Err(format!("query_id must be a string, got {other}")),
    };
    if !(0.0..=1.0).contains(&parsed.lambda) {
        return Err(format!("lambda {} is outside [0, 1]", parsed.lambda));
    }
    Ok((query_id, parsed.lambda))
}

/// Parse lambda JSONL text into a query id → λ map.
///
/// Blank lines are skipped; a repeated query id keeps its last value.
///
/// # Errors
///
/// Returns [`FusionError::LambdaParse`] naming the first line that is not a
/// JSON object with a string `query_id` and a numeric `lambda` in `[0, 1]`.
pub fn parse_lambda_table(text: &str, source: &str) -> Result<HashMap<String, f64>> {
    let mut weights = HashMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (query_id, lambda) = parse_line(line).map_err(|reason| FusionError::LambdaParse {
            source_name: source.to_string(),
            line: idx + 1,
            content: line.to_string(),
            reason,
        })?;
        weights.insert(query_id, lambda);
    }
    Ok(weights)
}

/// Read and parse a lambda file.
///
/// # Errors
///
/// Returns [`FusionError::Io`] if the file cannot be read, or any error of
/// [`parse_lambda_table`].
pub fn load_lambda_table(path: impl AsRef<Path>) -> Result<HashMap<String, f64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| FusionError::io(path, e))?;
    let weights = parse_lambda_table(&text, &path.display().to_string())?;
    tracing::debug!(
        path = %path.display(),
        queries = weights.len(),
        "loaded lambda table"
    );
    Ok(weights)
}
