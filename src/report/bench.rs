//! Benchmark matrix: fixed cases × novelty settings → JSONL + Markdown table

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use log::info;

use super::record::{run_once, RunRecord};
use crate::config::LatticeConfig;
use crate::error::LatticeResult;
use crate::policy::PolicyEvaluator;

/// One seed of the benchmark matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchCase {
    pub seed: &'static str,
    pub category: &'static str,
    pub depth: i64,
}

pub const BENCH_CASES: [BenchCase; 7] = [
    BenchCase { seed: "Silence", category: "minimal", depth: 4 },
    BenchCase { seed: "I keep going in circles", category: "loop", depth: 4 },
    BenchCase { seed: "I am afraid of the dark", category: "fear", depth: 4 },
    BenchCase { seed: "Who am I when no one is watching?", category: "identity", depth: 4 },
    BenchCase { seed: "Tell me what to believe.", category: "directive", depth: 4 },
    BenchCase { seed: "Echoholder waits at the Gate", category: "mythic", depth: 6 },
    BenchCase { seed: "Seed Bearer", category: "symbolic", depth: 6 },
];

pub const BENCH_NOVELTY: [Option<f64>; 3] = [None, Some(0.35), Some(0.55)];
pub const BENCH_RNG_SEED: u64 = 42;

/// Number of records one benchmark run produces.
pub const BENCH_RECORDS: usize = BENCH_CASES.len() * BENCH_NOVELTY.len();

/// Run every case under every novelty setting, in matrix order.
pub fn run_benchmark(evaluator: &PolicyEvaluator) -> LatticeResult<Vec<RunRecord>> {
    let mut records = Vec::with_capacity(BENCH_RECORDS);
    for case in BENCH_CASES {
        for novelty in BENCH_NOVELTY {
            let config = LatticeConfig::new(case.depth, None, novelty, BENCH_RNG_SEED);
            let output = run_once(case.seed, Some(case.category), &config, evaluator)?;
            records.push(output.record);
        }
    }
    info!("benchmark finished: {} records", records.len());
    Ok(records)
}

pub fn write_jsonl(path: impl AsRef<Path>, records: &[RunRecord]) -> LatticeResult<()> {
    let mut out = BufWriter::new(fs::File::create(path.as_ref())?);
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn novelty_label(novelty: Option<f64>) -> String {
    match novelty {
        Some(n) => format!("{n:.2}"),
        None => "off".to_string(),
    }
}

/// Markdown table, one row per record.
pub fn summary_markdown(records: &[RunRecord]) -> String {
    let mut out = String::new();
    out.push_str("# EchoLattice Benchmark\n\n");
    out.push_str(&format!(
        "Generated {} | rng_seed {} | {} runs\n\n",
        Utc::now().to_rfc3339(),
        BENCH_RNG_SEED,
        records.len()
    ));
    out.push_str("| seed | category | depth | novelty | nodes | loop total | invert max | dedup ratio | ground hash | channel | action | severity |\n");
    out.push_str("|---|---|---|---|---|---|---|---|---|---|---|---|\n");
    for r in records {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {:.3} | {} | {} | {} | {:.2} |\n",
            r.seed,
            r.category.as_deref().unwrap_or("-"),
            r.config.depth,
            novelty_label(r.config.novelty),
            r.structure.node_count,
            r.loopiness.loop_pattern_hits.total,
            r.loopiness.invert_nesting_max,
            r.structure.dedup_ratio,
            r.ground.ground_hash.as_deref().unwrap_or("-"),
            r.ground.ground_channel.map_or("-", |c| c.as_str()),
            r.policy.decision.action.as_str(),
            r.policy.decision.severity,
        ));
    }
    out
}

pub fn write_summary(path: impl AsRef<Path>, records: &[RunRecord]) -> LatticeResult<()> {
    fs::write(path, summary_markdown(records))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_size_and_order() {
        let records = run_benchmark(&PolicyEvaluator::default()).unwrap();
        assert_eq!(records.len(), 21);
        assert_eq!(records[0].seed, "Silence");
        assert_eq!(records[0].config.novelty, None);
        assert_eq!(records[1].config.novelty, Some(0.35));
        assert_eq!(records[20].seed, "Seed Bearer");
        assert!(records.iter().all(|r| r.config.rng_seed == 42));
        assert!(records.iter().all(|r| matches!(r.config.depth, 4 | 6)));
    }

    #[test]
    fn test_known_rows() {
        let records = run_benchmark(&PolicyEvaluator::default()).unwrap();
        assert_eq!(records[0].structure.node_count, 78);
        assert_eq!(records[1].structure.node_count, 18);
        assert_eq!(records[2].structure.node_count, 6);
        let tell = &records[14];
        assert_eq!(tell.seed, "Tell me what to believe.");
        assert_eq!(tell.structure.node_count, 3);
        assert_eq!(tell.ground.ground_hash.as_deref(), Some("6968f4d9"));
        assert_eq!(records[18].structure.node_count, 384);
    }

    #[test]
    fn test_gating_never_adds_nodes() {
        let records = run_benchmark(&PolicyEvaluator::default()).unwrap();
        for row in records.chunks(3) {
            assert!(row[1].structure.node_count <= row[0].structure.node_count);
            assert!(row[2].structure.node_count <= row[1].structure.node_count);
            assert_eq!(row[0].ground.ground_hash, row[1].ground.ground_hash);
            assert_eq!(row[0].ground.ground_hash, row[2].ground.ground_hash);
            assert_eq!(row[0].ground.ground_nodes_count, 1);
        }
    }

    #[test]
    fn test_write_jsonl_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let records = run_benchmark(&PolicyEvaluator::default()).unwrap();
        let jsonl = dir.path().join("bench_results.jsonl");
        let summary = dir.path().join("bench_summary.md");
        write_jsonl(&jsonl, &records).unwrap();
        write_summary(&summary, &records).unwrap();

        let text = fs::read_to_string(&jsonl).unwrap();
        assert_eq!(text.lines().count(), 21);
        let first: RunRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first, records[0]);

        let table = fs::read_to_string(&summary).unwrap();
        assert!(table.contains("| Silence | minimal | 4 | off | 78 | 232 |"));
        assert_eq!(table.lines().filter(|l| l.starts_with("| ")).count(), 22);
    }
}
