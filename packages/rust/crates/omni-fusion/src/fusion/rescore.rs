//! Per-run score rewriting.
//!
//! Every rule works on one query at a time and only touches `score`:
//! membership, order and rank stay as they were. Queries are independent,
//! so the rules run over queries in parallel (rayon).

use std::collections::HashMap;

use rayon::prelude::*;

use super::kernels::{min_max, min_max_scale, rrf_term};
use crate::types::{QueryRanking, Run};

/// Score rewriting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescoreMethod {
    /// `1 / (rank + rrf_k)`
    Rrf,
    /// `score * factor`
    Scale,
    /// Per-query min-max into `[0, 1]`
    Normalize,
}

fn rescore_ranking(method: RescoreMethod, rrf_k: u32, factor: f64, ranking: &mut QueryRanking) {
    match method {
        RescoreMethod::Rrf => {
            for doc in &mut ranking.docs {
                doc.score = rrf_term(rrf_k, doc.rank);
            }
        }
        RescoreMethod::Scale => {
            for doc in &mut ranking.docs {
                doc.score *= factor;
            }
        }
        RescoreMethod::Normalize => {
            if let Some((min, max)) = min_max(ranking.docs.iter().map(|d| d.score)) {
                for doc in &mut ranking.docs {
                    doc.score = min_max_scale(doc.score, min, max);
                }
            }
        }
    }
}

/// Rescore every query of `run` with one global `factor`.
///
/// `rrf_k` is only read by [`RescoreMethod::Rrf`], `factor` only by
/// [`RescoreMethod::Scale`].
pub fn rescore(method: RescoreMethod, rrf_k: u32, factor: f64, run: &mut Run) {
    run.queries_mut()
        .par_iter_mut()
        .for_each(|ranking| rescore_ranking(method, rrf_k, factor, ranking));
}

/// Rescore every query of `run`, picking the factor per query.
///
/// Queries missing from `weights` use `default_weight`. Returns how many
/// queries fell back to the default.
pub fn rescore_per_query(
    method: RescoreMethod,
    rrf_k: u32,
    weights: &HashMap<String, f64>,
    default_weight: f64,
    run: &mut Run,
) -> usize {
    run.queries_mut()
        .par_iter_mut()
        .map(|ranking| {
            let (factor, fallback) = match weights.get(&ranking.query_id) {
                Some(&w) => (w, 0),
                None => (default_weight, 1),
            };
            rescore_ranking(method, rrf_k, factor, ranking);
            fallback
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoredDoc;

    fn sample_run() -> Run {
        let mut run = Run::new("t");
        run.query_entry("q1").docs.extend([
            ScoredDoc::new("d1", 10.0, 1),
            ScoredDoc::new("d2", 5.0, 2),
            ScoredDoc::new("d3", 0.0, 3),
        ]);
        run.query_entry("q2")
            .docs
            .extend([ScoredDoc::new("d4", 7.0, 1), ScoredDoc::new("d5", 7.0, 2)]);
        run
    }

    fn scores(run: &Run, qid: &str) -> Vec<f64> {
        run.query(qid)
            .map(|q| q.docs.iter().map(|d| d.score).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_rrf_uses_rank_not_score() {
        let mut run = sample_run();
        rescore(RescoreMethod::Rrf, 60, 0.0, &mut run);
        assert_eq!(scores(&run, "q1"), vec![1.0 / 61.0, 1.0 / 62.0, 1.0 / 63.0]);
        assert_eq!(scores(&run, "q2"), vec![1.0 / 61.0, 1.0 / 62.0]);
    }

    #[test]
    fn test_scale() {
        let mut run = sample_run();
        rescore(RescoreMethod::Scale, 0, 0.5, &mut run);
        assert_eq!(scores(&run, "q1"), vec![5.0, 2.5, 0.0]);
    }

    #[test]
    fn test_normalize_per_query_and_ties() {
        let mut run = sample_run();
        rescore(RescoreMethod::Normalize, 0, 0.0, &mut run);
        assert_eq!(scores(&run, "q1"), vec![1.0, 0.5, 0.0]);
        assert_eq!(scores(&run, "q2"), vec![1.0, 1.0]);
    }

    #[test]
    fn test_rescore_keeps_membership_and_rank() {
        let mut run = sample_run();
        rescore(RescoreMethod::Normalize, 0, 0.0, &mut run);
        let q1 = run.query("q1").unwrap();
        let ids: Vec<_> = q1.docs.iter().map(|d| (d.doc_id.as_str(), d.rank)).collect();
        assert_eq!(ids, vec![("d1", 1), ("d2", 2), ("d3", 3)]);
    }

    #[test]
    fn test_per_query_scale_with_fallback() {
        let mut run = sample_run();
        let weights = HashMap::from([("q1".to_string(), 0.1)]);
        let fallbacks = rescore_per_query(RescoreMethod::Scale, 0, &weights, 2.0, &mut run);

        assert_eq!(fallbacks, 1);
        assert_eq!(scores(&run, "q1"), vec![1.0, 0.5, 0.0]);
        assert_eq!(scores(&run, "q2"), vec![14.0, 14.0]);
    }
}
