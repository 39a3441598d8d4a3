//! Outer layers: run records, renderers, the benchmark matrix and the
//! record verifier. Nothing here feeds back into lattice construction.

mod bench;
mod record;
mod render;
mod verify;

pub use bench::{
    run_benchmark, summary_markdown, write_jsonl, write_summary, BenchCase, BENCH_CASES,
    BENCH_NOVELTY, BENCH_RECORDS, BENCH_RNG_SEED,
};
pub use record::{run_once, RunConfig, RunOutput, RunRecord};
pub use render::{to_json, to_markdown_tree, to_summary_md};
pub use verify::{
    check_determinism, determinism_index, verify_benchmark, verify_jsonl, verify_record,
    RESULTS_FILE, SUMMARY_FILE,
};
