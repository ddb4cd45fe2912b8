//! Union-by-document merge of rescored runs.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::error::{FusionError, Result};
use crate::types::{QueryRanking, Run, ScoredDoc};

/// Tag carried by a freshly merged run until it is written out.
pub const FUSED_TAG: &str = "fused";

/// Query ids across `runs`, in first-encounter order.
fn query_ids(runs: &[Run]) -> Vec<&str> {
    let mut seen = HashSet::new();
    runs.iter()
        .flat_map(|run| run.queries().iter().map(|q| q.query_id.as_str()))
        .filter(|qid| seen.insert(*qid))
        .collect()
}

fn merge_query(runs: &[Run], query_id: &str, depth: usize, k: usize) -> QueryRanking {
    let mut fused: HashMap<&str, f64> = HashMap::new();
    for ranking in runs.iter().filter_map(|run| run.query(query_id)) {
        for doc in ranking.docs.iter().take(depth) {
            *fused.entry(doc.doc_id.as_str()).or_insert(0.0) += doc.score;
        }
    }

    let mut docs: Vec<(&str, f64)> = fused.into_iter().collect();
    // Deterministic ordering: score desc, then doc id asc.
    docs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    docs.truncate(k);

    QueryRanking {
        query_id: query_id.to_string(),
        docs: (1_u32..)
            .zip(docs)
            .map(|(rank, (doc_id, score))| ScoredDoc::new(doc_id, score, rank))
            .collect(),
    }
}

/// Merge already-rescored runs into one.
///
/// Per query, only the first `depth` entries of each run are pooled; a
/// document's fused score is the sum of its scores over the runs that
/// retrieved it (absent counts as 0). The union is sorted by descending
/// fused score, ties by ascending document id, and cut to `k` entries.
///
/// # Errors
///
/// Returns [`FusionError::Config`] if `depth` or `k` is zero.
pub fn merge(runs: &[Run], depth: usize, k: usize) -> Result<Run> {
    if depth == 0 {
        return Err(FusionError::config("Option depth must be greater than 0"));
    }
    if k == 0 {
        return Err(FusionError::config("Option k must be greater than 0"));
    }

    let rankings: Vec<QueryRanking> = query_ids(runs)
        .into_par_iter()
        .map(|qid| merge_query(runs, qid, depth, k))
        .collect();

    let mut fused: Run = rankings.into_iter().collect();
    fused.set_tag(FUSED_TAG);
    Ok(fused)
}
