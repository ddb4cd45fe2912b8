//! Run data model: scored documents, per-query rankings, whole runs.

use std::collections::HashMap;

/// One document in a query ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    /// Document identifier
    pub doc_id: String,
    /// Authoritative score (rescored in place by fusion)
    pub score: f64,
    /// 1-based position in the originating list
    pub rank: u32,
}

impl ScoredDoc {
    /// Create a scored document.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, score: f64, rank: u32) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
            rank,
        }
    }
}

/// Ranked documents for a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRanking {
    /// Query identifier
    pub query_id: String,
    /// Documents in stored order
    pub docs: Vec<ScoredDoc>,
}

impl QueryRanking {
    /// Stable sort by descending score, then renumber ranks from 1.
    pub fn resort(&mut self) {
        self.docs.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.renumber();
    }

    /// Assign ranks 1..=n in the current order.
    pub fn renumber(&mut self) {
        for (rank, doc) in (1_u32..).zip(self.docs.iter_mut()) {
            doc.rank = rank;
        }
    }
}

/// A full run: one ranking per query, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    tag: String,
    queries: Vec<QueryRanking>,
    index: HashMap<String, usize>,
}

impl Run {
    /// Create an empty run with a provenance tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            queries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Provenance tag (run tag column of the source file).
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Replace the provenance tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Rankings in stored order.
    #[must_use]
    pub fn queries(&self) -> &[QueryRanking] {
        &self.queries
    }

    /// Mutable rankings; query ids must not be changed through this.
    pub fn queries_mut(&mut self) -> &mut [QueryRanking] {
        &mut self.queries
    }

    /// Ranking for `query_id`, if the run has one.
    #[must_use]
    pub fn query(&self, query_id: &str) -> Option<&QueryRanking> {
        self.index.get(query_id).map(|&i| &self.queries[i])
    }

    /// Ranking for `query_id`, created empty at the end if missing.
    pub fn query_entry(&mut self, query_id: &str) -> &mut QueryRanking {
        let idx = match self.index.get(query_id) {
            Some(&idx) => idx,
            None => {
                let idx = self.queries.len();
                self.queries.push(QueryRanking {
                    query_id: query_id.to_string(),
                    docs: Vec::new(),
                });
                self.index.insert(query_id.to_string(), idx);
                idx
            }
        };
        &mut self.queries[idx]
    }

    /// Append a complete ranking. An existing ranking for the same query is replaced in place.
    pub fn push_ranking(&mut self, ranking: QueryRanking) {
        if let Some(&idx) = self.index.get(&ranking.query_id) {
            self.queries[idx] = ranking;
        } else {
            self.index
                .insert(ranking.query_id.clone(), self.queries.len());
            self.queries.push(ranking);
        }
    }

    /// Number of queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the run has no queries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Total number of (query, document) entries.
    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.queries.iter().map(|q| q.docs.len()).sum()
    }
}

impl FromIterator<QueryRanking> for Run {
    fn from_iter<T: IntoIterator<Item = QueryRanking>>(iter: T) -> Self {
        let mut run = Run::default();
        for ranking in iter {
            run.push_ranking(ranking);
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_entry_keeps_encounter_order() {
        let mut run = Run::new("bm25");
        run.query_entry("q2").docs.push(ScoredDoc::new("d1", 1.0, 1));
        run.query_entry("q1").docs.push(ScoredDoc::new("d2", 2.0, 1));
        run.query_entry("q2").docs.push(ScoredDoc::new("d3", 0.5, 2));

        let ids: Vec<_> = run.queries().iter().map(|q| q.query_id.as_str()).collect();
        assert_eq!(ids, vec!["q2", "q1"]);
        assert_eq!(run.doc_count(), 3);
        assert_eq!(run.query("q2").map(|q| q.docs.len()), Some(2));
    }

    #[test]
    fn test_resort_is_stable_on_ties() {
        let mut ranking = QueryRanking {
            query_id: "q1".to_string(),
            docs: vec![
                ScoredDoc::new("a", 1.0, 1),
                ScoredDoc::new("b", 3.0, 2),
                ScoredDoc::new("c", 1.0, 3),
            ],
        };
        ranking.resort();

        let order: Vec<_> = ranking
            .docs
            .iter()
            .map(|d| (d.doc_id.as_str(), d.rank))
            .collect();
        assert_eq!(order, vec![("b", 1), ("a", 2), ("c", 3)]);
    }
}
