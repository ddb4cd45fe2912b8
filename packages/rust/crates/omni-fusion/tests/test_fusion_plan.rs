//! Tests for YAML fusion plans.

use std::error::Error;
use std::fs;
use std::path::Path;

use omni_fusion::{FusionError, FusionPlan, MethodName};

type TestResult = Result<(), Box<dyn Error>>;

fn write_inputs(dir: &Path) -> TestResult {
    fs::create_dir_all(dir.join("runs"))?;
    fs::create_dir_all(dir.join("fused"))?;
    fs::write(
        dir.join("runs/bm25.trec"),
        "q1 Q0 d1 1 10.0 bm25\nq1 Q0 d2 2 5.0 bm25\n",
    )?;
    fs::write(
        dir.join("runs/dense.trec"),
        "q1 Q0 d2 1 8.0 dense\nq1 Q0 d3 2 4.0 dense\n",
    )?;
    Ok(())
}

#[test]
fn test_plan_writes_every_method_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_inputs(dir.path())?;
    fs::write(
        dir.path().join("lambdas.jsonl"),
        "{\"query_id\": \"q1\", \"lambda\": 0.9}\n",
    )?;
    let plan_path = dir.path().join("plan.yaml");
    fs::write(
        &plan_path,
        r"runs:
  - file: runs/bm25.trec
  - file: runs/dense.trec
methods:
  - name: average
    output: fused/average.trec
  - name: INTERPOLATION
    alpha: 0.3
    output: fused/interp.trec
    runtag: interp-0.3
  - name: dynamic
    lambda_file: lambdas.jsonl
    output: fused/dynamic.trec
",
    )?;

    let summaries = FusionPlan::load(&plan_path)?.execute()?;
    let methods: Vec<_> = summaries.iter().map(|s| s.method).collect();
    assert_eq!(
        methods,
        vec![
            MethodName::Average,
            MethodName::Interpolation,
            MethodName::Dynamic
        ]
    );
    assert!(summaries.iter().all(|s| s.queries == 1 && s.documents == 3));

    assert_eq!(
        fs::read_to_string(dir.path().join("fused/average.trec"))?,
        "q1 Q0 d2 1 6.500000 omni.fusion\n\
         q1 Q0 d1 2 5.000000 omni.fusion\n\
         q1 Q0 d3 3 2.000000 omni.fusion\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("fused/interp.trec"))?,
        "q1 Q0 d2 1 7.100000 interp-0.3\n\
         q1 Q0 d1 2 3.000000 interp-0.3\n\
         q1 Q0 d3 3 2.800000 interp-0.3\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("fused/dynamic.trec"))?,
        "q1 Q0 d1 1 9.000000 omni.fusion\n\
         q1 Q0 d2 2 5.300000 omni.fusion\n\
         q1 Q0 d3 3 0.400000 omni.fusion\n"
    );
    Ok(())
}

#[test]
fn test_plan_validates_all_entries_before_writing() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_inputs(dir.path())?;
    let plan_path = dir.path().join("plan.yaml");
    fs::write(
        &plan_path,
        r"runs:
  - file: runs/bm25.trec
  - file: runs/dense.trec
methods:
  - name: rrf
    output: fused/rrf.trec
  - name: weighted
    weights: [0.5, 0.25, 0.25]
    output: fused/weighted.trec
",
    )?;

    let err = FusionPlan::load(&plan_path)?.execute().unwrap_err();
    assert!(matches!(err, FusionError::Config(_)), "{err}");
    assert!(!dir.path().join("fused/rrf.trec").exists());
    assert!(!dir.path().join("fused/weighted.trec").exists());
    Ok(())
}

#[test]
fn test_plan_accepts_weights_as_text() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_inputs(dir.path())?;
    let plan_path = dir.path().join("plan.yaml");
    fs::write(
        &plan_path,
        r#"runs:
  - file: runs/bm25.trec
  - file: runs/dense.trec
methods:
  - name: weighted
    weights: "1.0, 0.25"
    output: fused/weighted.trec
"#,
    )?;

    FusionPlan::load(&plan_path)?.execute()?;
    assert_eq!(
        fs::read_to_string(dir.path().join("fused/weighted.trec"))?,
        "q1 Q0 d1 1 10.000000 omni.fusion\n\
         q1 Q0 d2 2 7.000000 omni.fusion\n\
         q1 Q0 d3 3 1.000000 omni.fusion\n"
    );
    Ok(())
}

#[test]
fn test_plan_missing_run_file_is_io_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("fused"))?;
    let plan_path = dir.path().join("plan.yaml");
    fs::write(
        &plan_path,
        "runs:\n  - file: runs/missing.trec\nmethods:\n  - name: rrf\n    output: fused/rrf.trec\n",
    )?;

    let err = FusionPlan::load(&plan_path)?.execute().unwrap_err();
    assert!(matches!(err, FusionError::Io { .. }), "{err}");
    assert!(!dir.path().join("fused/rrf.trec").exists());
    Ok(())
}

#[test]
fn test_missing_plan_file_is_io_error() {
    let err = FusionPlan::load("/nonexistent/plan.yaml").unwrap_err();
    assert!(matches!(err, FusionError::Io { .. }));
}
