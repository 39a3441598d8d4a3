//! EchoLattice CLI: build, benchmark, verify and evaluate
//!
//! Commands:
//!   echolattice run        expand one seed and write JSON/Markdown artifacts
//!   echolattice benchmark  run the fixed benchmark matrix
//!   echolattice verify     run the benchmark twice and check schema + determinism
//!   echolattice policy     evaluate a stability report or run record

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use echolattice::report::{
    run_benchmark, to_json, to_markdown_tree, to_summary_md, verify_benchmark, write_jsonl,
    write_summary, RESULTS_FILE, SUMMARY_FILE,
};
use echolattice::{
    run_once, LatticeConfig, LatticeError, LatticeResult, PolicyEvaluator, PolicyThresholds,
};

const OUT_JSON: &str = "echo_map.json";
const OUT_TREE: &str = "echo_map.md";
const OUT_SUMMARY: &str = "echo_summary.md";
const OUT_RECORD: &str = "echo_record.json";

fn print_usage() {
    println!(
        r#"
EchoLattice v0.3: bounded deterministic symbolic lattices

Usage: echolattice <command> [options]

Commands:
  run       <seed> [--depth N] [--branching N] [--novelty X]
            [--rng-seed N] [--category C] [--out-dir DIR]     Expand one seed
  benchmark [out-dir]                                         Run the 21-record matrix
  verify    [out-dir]                                         Benchmark twice, check schema + determinism
  policy    <report.json>                                     Evaluate a report or run record
  help                                                        Show this message

Every command accepts --thresholds <file.json> to override policy thresholds.

Examples:
  echolattice run "Seed Bearer" --depth 2
  echolattice run "Silence" --depth 4 --novelty 0.35 --category minimal
  echolattice benchmark
  echolattice verify /tmp/echo-bench
  echolattice policy bench_report.json
"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "benchmark" => cmd_benchmark(&args[2..]),
        "verify" => cmd_verify(&args[2..]),
        "policy" => cmd_policy(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("  Error: {}", e);
        process::exit(1);
    }
}

/// Options shared by every command, plus `run`'s build bounds
struct Options {
    positional: Vec<String>,
    config: LatticeConfig,
    category: Option<String>,
    out_dir: PathBuf,
    evaluator: PolicyEvaluator,
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> LatticeResult<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| LatticeError::Config(format!("{flag} needs a value")))
}

fn parse<T: std::str::FromStr>(raw: &str, flag: &str) -> LatticeResult<T> {
    raw.parse()
        .map_err(|_| LatticeError::Config(format!("invalid value for {flag}: {raw}")))
}

fn parse_options(args: &[String]) -> LatticeResult<Options> {
    let mut opts = Options {
        positional: Vec::new(),
        config: LatticeConfig::default(),
        category: None,
        out_dir: PathBuf::from("."),
        evaluator: PolicyEvaluator::default(),
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--depth" => opts.config.depth_cap = parse(flag_value(args, i, flag)?, flag)?,
            "--branching" => {
                opts.config.branching_cap = match flag_value(args, i, flag)? {
                    "none" => None,
                    raw => Some(parse(raw, flag)?),
                }
            }
            "--novelty" => {
                opts.config.novelty_threshold = match flag_value(args, i, flag)? {
                    "off" => None,
                    raw => Some(parse(raw, flag)?),
                }
            }
            "--rng-seed" => opts.config.rng_seed = parse(flag_value(args, i, flag)?, flag)?,
            "--category" => opts.category = Some(flag_value(args, i, flag)?.to_string()),
            "--out-dir" => opts.out_dir = PathBuf::from(flag_value(args, i, flag)?),
            "--thresholds" => {
                let json = fs::read_to_string(flag_value(args, i, flag)?)?;
                opts.evaluator = PolicyEvaluator::new(PolicyThresholds::from_json(&json)?)?;
            }
            _ => {
                opts.positional.push(args[i].clone());
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    Ok(opts)
}

fn write_artifact(dir: &Path, name: &str, contents: &str) -> LatticeResult<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(name), contents)?;
    Ok(())
}

fn cmd_run(args: &[String]) -> LatticeResult<()> {
    let opts = parse_options(args)?;
    let seed = opts.positional.join(" ");
    if seed.trim().is_empty() {
        eprintln!("Usage: echolattice run <seed> [--depth N] [--branching N] [--novelty X] [--rng-seed N] [--category C] [--out-dir DIR]");
        return Err(LatticeError::Config("no seed provided".to_string()));
    }

    let output = run_once(
        seed.trim(),
        opts.category.as_deref(),
        &opts.config,
        &opts.evaluator,
    )?;
    let record = &output.record;

    write_artifact(&opts.out_dir, OUT_JSON, &to_json(&output.lattice)?)?;
    write_artifact(&opts.out_dir, OUT_TREE, &to_markdown_tree(&output.lattice))?;
    write_artifact(
        &opts.out_dir,
        OUT_SUMMARY,
        &to_summary_md(&output.lattice, &record.ground),
    )?;
    write_artifact(&opts.out_dir, OUT_RECORD, &serde_json::to_string_pretty(record)?)?;

    let structure = &record.structure;
    let loopiness = &record.loopiness;
    let decision = &record.policy.decision;
    println!(
        "\n  Nodes: {} | Edges: {} | Max depth: {}",
        structure.node_count, structure.edge_count, structure.max_depth
    );
    println!(
        "  Loop markers: {} | Invert nesting: {} | Dedup ratio: {:.3}",
        loopiness.loop_pattern_hits.total, loopiness.invert_nesting_max, structure.dedup_ratio
    );
    match (&record.ground.ground_hash, record.ground.ground_channel) {
        (Some(hash), Some(channel)) => println!("  Ground: {} via {}", hash, channel),
        _ => println!("  Ground: not reached"),
    }
    println!(
        "  Policy: {} (severity {:.2})",
        decision.action.as_str(),
        decision.severity
    );
    println!(
        "  Saved: {}, {}, {}, {} in {}",
        OUT_JSON,
        OUT_TREE,
        OUT_SUMMARY,
        OUT_RECORD,
        opts.out_dir.display()
    );
    Ok(())
}

fn cmd_benchmark(args: &[String]) -> LatticeResult<()> {
    let opts = parse_options(args)?;
    let dir = opts.positional.first().map(PathBuf::from).unwrap_or(opts.out_dir);
    fs::create_dir_all(&dir)?;

    let records = run_benchmark(&opts.evaluator)?;
    write_jsonl(dir.join(RESULTS_FILE), &records)?;
    write_summary(dir.join(SUMMARY_FILE), &records)?;
    println!("\n  {} records written to {}", records.len(), dir.join(RESULTS_FILE).display());
    println!("  Summary table: {}", dir.join(SUMMARY_FILE).display());
    Ok(())
}

fn cmd_verify(args: &[String]) -> LatticeResult<()> {
    let opts = parse_options(args)?;
    let dir = opts.positional.first().map(PathBuf::from).unwrap_or(opts.out_dir);
    fs::create_dir_all(&dir)?;

    verify_benchmark(&opts.evaluator, &dir)?;
    println!("\n  Benchmark verified: schema valid, ground hashes and paths stable across runs");
    Ok(())
}

fn cmd_policy(args: &[String]) -> LatticeResult<()> {
    let opts = parse_options(args)?;
    let Some(path) = opts.positional.first() else {
        eprintln!("Usage: echolattice policy <report.json> [--thresholds file.json]");
        return Err(LatticeError::Config("no report file provided".to_string()));
    };

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let decision = opts.evaluator.evaluate_report(&report);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
