//! TREC run file I/O.
//!
//! Layout, one entry per line:
//!
//! ```text
//! query_id  Q0  doc_id  rank  score  run_tag
//! ```
//!
//! Parsing groups lines by query id in first-encounter order and keeps the
//! file order within a query unless a re-sort is requested. Any malformed
//! line aborts the whole load. Writing renumbers ranks, replaces the run tag
//! and goes through a temp file so a failed write never leaves a partial run.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{FusionError, Result};
use crate::types::{Run, ScoredDoc};

/// Literal written in the second column of every output line.
pub const ITER_LITERAL: &str = "Q0";

const FIELD_COUNT: usize = 6;

#[derive(Default)]
struct SeenEntries {
    docs: HashSet<String>,
    ranks: HashSet<u32>,
}

/// Parse run file text.
///
/// `source` labels the text in error messages (usually the file path).
/// With `resort`, each query is stably re-sorted by descending score and
/// ranks are recomputed; otherwise declared ranks are trusted but must be
/// unique per query.
///
/// # Errors
///
/// Returns [`FusionError::Parse`] for a line with the wrong field count, a
/// non-positive or non-numeric rank, a non-finite or non-numeric score, or a
/// duplicate document (or duplicate rank without `resort`) within a query.
pub fn parse_run(text: &str, source: &str, resort: bool) -> Result<Run> {
    let mut run = Run::default();
    let mut tag: Option<String> = None;
    let mut seen: HashMap<String, SeenEntries> = HashMap::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fail = |reason: String| FusionError::Parse {
            source_name: source.to_string(),
            line: idx + 1,
            content: line.to_string(),
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return Err(fail(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        }
        let (query_id, doc_id) = (fields[0], fields[2]);

        let rank = fields[3]
            .parse::<u32>()
            .ok()
            .filter(|&r| r >= 1)
            .ok_or_else(|| fail(format!("rank {:?} is not a positive integer", fields[3])))?;
        let score = fields[4]
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite())
            .ok_or_else(|| fail(format!("score {:?} is not a finite number", fields[4])))?;

        let entries = seen.entry(query_id.to_string()).or_default();
        if !entries.docs.insert(doc_id.to_string()) {
            return Err(fail(format!(
                "duplicate document {doc_id:?} for query {query_id:?}"
            )));
        }
        if !resort && !entries.ranks.insert(rank) {
            return Err(fail(format!(
                "duplicate rank {rank} for query {query_id:?}"
            )));
        }

        if tag.is_none() {
            tag = Some(fields[5].to_string());
        }
        run.query_entry(query_id)
            .docs
            .push(ScoredDoc::new(doc_id, score, rank));
    }

    if resort {
        for ranking in run.queries_mut() {
            ranking.resort();
        }
    }
    run.set_tag(tag.unwrap_or_default());
    Ok(run)
}

/// Read and parse a run file from disk.
///
/// # Errors
///
/// Returns [`FusionError::Io`] if the file cannot be read, or any error of
/// [`parse_run`].
pub fn read_run(path: impl AsRef<Path>, resort: bool) -> Result<Run> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| FusionError::io(path, e))?;
    parse_run(&text, &path.display().to_string(), resort)
}

/// Render a run in TREC format with `tag` in the last column.
///
/// Queries and documents are written in stored order; ranks are renumbered
/// from 1 per query.
#[must_use]
pub fn render_run(run: &Run, tag: &str) -> String {
    let mut out = String::with_capacity(run.doc_count() * 48);
    for ranking in run.queries() {
        for (rank, doc) in (1_usize..).zip(&ranking.docs) {
            // Writing into a String cannot fail.
            let _ = writeln!(
                out,
                "{} {ITER_LITERAL} {} {rank} {:.6} {tag}",
                ranking.query_id, doc.doc_id, doc.score
            );
        }
    }
    out
}

/// Write a run to `path` atomically.
///
/// The content goes to a temp file next to `path`, which is then renamed
/// over it. On error no file is left at `path`.
///
/// # Errors
///
/// Returns [`FusionError::Io`] if the directory is not writable or the
/// rename fails.
pub fn write_run(path: impl AsRef<Path>, run: &Run, tag: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FusionError::io(dir, e))?;
    tmp.write_all(render_run(run, tag).as_bytes())
        .map_err(|e| FusionError::io(path, e))?;
    tmp.flush().map_err(|e| FusionError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| FusionError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "q1 Q0 d1 1 10.0 bm25\n\
                          q1 Q0 d2 2 5.0 bm25\n\
                          q2 Q0 d9 1 3.5 bm25\n";

    #[test]
    fn test_parse_groups_by_query() {
        let run = parse_run(SAMPLE, "sample", false).unwrap();
        assert_eq!(run.tag(), "bm25");
        assert_eq!(run.len(), 2);
        let q1 = run.query("q1").unwrap();
        assert_eq!(q1.docs[1], ScoredDoc::new("d2", 5.0, 2));
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let text = "\nq1 Q0 d1 1 1.0 t\n   \n";
        let run = parse_run(text, "blank", false).unwrap();
        assert_eq!(run.doc_count(), 1);
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        let err = parse_run("q1 Q0 d1 1 1.0\n", "short", false).unwrap_err();
        match err {
            FusionError::Parse { line, content, .. } => {
                assert_eq!(line, 1);
                assert_eq!(content, "q1 Q0 d1 1 1.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        assert!(parse_run("q1 Q0 d1 x 1.0 t\n", "rank", false).is_err());
        assert!(parse_run("q1 Q0 d1 0 1.0 t\n", "rank0", false).is_err());
        assert!(parse_run("q1 Q0 d1 1 abc t\n", "score", false).is_err());
        assert!(parse_run("q1 Q0 d1 1 inf t\n", "inf", false).is_err());
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let dup_doc = "q1 Q0 d1 1 2.0 t\nq1 Q0 d1 2 1.0 t\n";
        assert!(parse_run(dup_doc, "dup", true).is_err());

        let dup_rank = "q1 Q0 d1 1 2.0 t\nq1 Q0 d2 1 1.0 t\n";
        assert!(parse_run(dup_rank, "dup", false).is_err());
        // Declared ranks are recomputed when re-sorting.
        assert!(parse_run(dup_rank, "dup", true).is_ok());
    }

    #[test]
    fn test_resort_recomputes_ranks() {
        let text = "q1 Q0 low 1 1.0 t\nq1 Q0 high 2 9.0 t\n";
        let run = parse_run(text, "unsorted", true).unwrap();
        let docs = &run.query("q1").unwrap().docs;
        assert_eq!(docs[0], ScoredDoc::new("high", 9.0, 1));
        assert_eq!(docs[1], ScoredDoc::new("low", 1.0, 2));
    }

    #[test]
    fn test_render_replaces_tag_and_renumbers() {
        let run = parse_run("q1 Q0 d1 4 2.5 old\nq1 Q0 d2 7 1.25 old\n", "r", false).unwrap();
        assert_eq!(
            render_run(&run, "fused"),
            "q1 Q0 d1 1 2.500000 fused\nq1 Q0 d2 2 1.250000 fused\n"
        );
    }
}
