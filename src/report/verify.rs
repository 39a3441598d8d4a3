//! Record verifier: schema checks on benchmark JSONL and a two-run
//! determinism comparison keyed by (seed, novelty, depth)

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use log::info;
use regex::Regex;
use serde_json::Value;

use super::bench::{run_benchmark, write_jsonl, write_summary, BENCH_RECORDS, BENCH_RNG_SEED};
use crate::error::{LatticeError, LatticeResult};
use crate::ground::GroundChannel;
use crate::policy::PolicyEvaluator;

pub const RESULTS_FILE: &str = "bench_results.jsonl";
pub const SUMMARY_FILE: &str = "bench_summary.md";

const RECORD_KEYS: [&str; 7] = [
    "seed",
    "category",
    "config",
    "structure",
    "loopiness",
    "ground",
    "policy",
];
const CONFIG_KEYS: [&str; 4] = ["novelty", "depth", "branching", "rng_seed"];
const LOOP_KEYS: [&str; 4] = ["echo_of", "shadow_of", "symbols", "total"];
const POLICY_KEYS: [&str; 6] = ["version", "mode", "public_safe", "redactions", "notes", "decision"];
const DECISION_KEYS: [&str; 4] = ["action", "severity", "reason_codes", "inputs"];

static HEX8: OnceLock<Regex> = OnceLock::new();

fn hex8() -> &'static Regex {
    HEX8.get_or_init(|| Regex::new(r"^[0-9a-f]{8}$").expect("hex regex must compile"))
}

fn schema(line: usize, msg: impl std::fmt::Display) -> LatticeError {
    LatticeError::Schema(format!("line {line}: {msg}"))
}

fn require_keys(value: &Value, keys: &[&str], line: usize, what: &str) -> LatticeResult<()> {
    for key in keys {
        if value.get(key).is_none() {
            return Err(schema(line, format!("{what} missing key: {key}")));
        }
    }
    Ok(())
}

/// Validate one benchmark record. `line` is 1-based and only used in errors.
pub fn verify_record(record: &Value, line: usize) -> LatticeResult<()> {
    require_keys(record, &RECORD_KEYS, line, "record")?;
    match record.get("human_closure_rating") {
        Some(Value::Null) => {}
        _ => return Err(schema(line, "human_closure_rating must be null")),
    }

    let config = &record["config"];
    require_keys(config, &CONFIG_KEYS, line, "config")?;
    match config["depth"].as_i64() {
        Some(4) | Some(6) => {}
        _ => return Err(schema(line, format!("depth expected 4 or 6, got {}", config["depth"]))),
    }
    if config["rng_seed"].as_u64() != Some(BENCH_RNG_SEED) {
        return Err(schema(
            line,
            format!("rng_seed expected {BENCH_RNG_SEED}, got {}", config["rng_seed"]),
        ));
    }

    let ratio = record["structure"]["dedup_ratio"].as_f64();
    if !matches!(ratio, Some(r) if (0.0..=1.0).contains(&r)) {
        return Err(schema(
            line,
            format!("dedup_ratio out of range: {}", record["structure"]["dedup_ratio"]),
        ));
    }

    let hits = &record["loopiness"]["loop_pattern_hits"];
    require_keys(hits, &LOOP_KEYS, line, "loop_pattern_hits")?;

    let ground = &record["ground"];
    if ground.get("ground_path").is_none() {
        return Err(schema(line, "ground_path missing"));
    }
    match &ground["ground_hash"] {
        Value::Null => {}
        Value::String(h) if hex8().is_match(h) => {}
        other => return Err(schema(line, format!("ground_hash must be 8 hex chars, got: {other}"))),
    }
    match &ground["ground_channel"] {
        Value::Null => {}
        Value::String(c) if GroundChannel::from_name(c).is_some() => {}
        other => return Err(schema(line, format!("ground_channel invalid: {other}"))),
    }

    let policy = &record["policy"];
    require_keys(policy, &POLICY_KEYS, line, "policy")?;
    if policy["public_safe"] != Value::Bool(true) {
        return Err(schema(line, "policy public_safe must be true"));
    }
    require_keys(&policy["decision"], &DECISION_KEYS, line, "policy decision")?;
    Ok(())
}

/// Load and validate a benchmark JSONL file.
pub fn verify_jsonl(path: impl AsRef<Path>) -> LatticeResult<Vec<Value>> {
    let text = fs::read_to_string(path.as_ref())?;
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() != BENCH_RECORDS {
        return Err(LatticeError::Schema(format!(
            "expected {BENCH_RECORDS} JSONL lines, found {}",
            lines.len()
        )));
    }
    let mut records = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| schema(idx + 1, format!("not valid JSON: {e}")))?;
        verify_record(&value, idx + 1)?;
        records.push(value);
    }
    Ok(records)
}

/// (ground_hash, ground_path) per (seed, novelty, depth).
pub fn determinism_index(records: &[Value]) -> BTreeMap<String, (Value, Value)> {
    records
        .iter()
        .map(|r| {
            let key = format!(
                "{} | novelty={} | depth={}",
                r["seed"], r["config"]["novelty"], r["config"]["depth"]
            );
            let ground = &r["ground"];
            (key, (ground["ground_hash"].clone(), ground["ground_path"].clone()))
        })
        .collect()
}

pub fn check_determinism(first: &[Value], second: &[Value]) -> LatticeResult<()> {
    let a = determinism_index(first);
    let b = determinism_index(second);
    for (key, expected) in &a {
        match b.get(key) {
            Some(actual) if actual == expected => {}
            Some(actual) => {
                return Err(LatticeError::DeterminismViolation {
                    key: key.clone(),
                    detail: format!("{expected:?} != {actual:?}"),
                })
            }
            None => {
                return Err(LatticeError::DeterminismViolation {
                    key: key.clone(),
                    detail: "missing from second run".to_string(),
                })
            }
        }
    }
    if let Some(extra) = b.keys().find(|k| !a.contains_key(*k)) {
        return Err(LatticeError::DeterminismViolation {
            key: extra.clone(),
            detail: "missing from first run".to_string(),
        });
    }
    Ok(())
}

/// Run the benchmark twice into `dir`, validating and comparing both runs.
pub fn verify_benchmark(evaluator: &PolicyEvaluator, dir: impl AsRef<Path>) -> LatticeResult<()> {
    let results = dir.as_ref().join(RESULTS_FILE);
    let summary = dir.as_ref().join(SUMMARY_FILE);

    let mut runs = Vec::with_capacity(2);
    for pass in 1..=2 {
        for path in [&results, &summary] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        let records = run_benchmark(evaluator)?;
        write_jsonl(&results, &records)?;
        write_summary(&summary, &records)?;
        runs.push(verify_jsonl(&results)?);
        info!("verify pass {pass}: {} records valid", BENCH_RECORDS);
    }
    check_determinism(&runs[0], &runs[1])
}
