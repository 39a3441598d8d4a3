//! Governance Policy Evaluator: aggregates in, advisory decision out
//!
//! The evaluator never sees node text. Its inputs map is keyed by an
//! enumerated set of aggregate names and holds numbers, flags or null.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::thresholds::PolicyThresholds;
use crate::error::LatticeResult;
use crate::metrics::Aggregates;

/// Advisory action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Continue,
    Prune,
    GroundNow,
    Defer,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Continue => "CONTINUE",
            Action::Prune => "PRUNE",
            Action::GroundNow => "GROUND_NOW",
            Action::Defer => "DEFER",
        }
    }
}

/// Reason codes; declared alphabetically so sets sort by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    DedupHigh,
    GroundUnreached,
    InvalidReport,
    InvertNesting,
    LoopinessHigh,
}

/// Aggregate fields the evaluator is allowed to report back
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyInput {
    LoopPatternTotal,
    InvertNestingMax,
    DedupRatio,
    AvgNoveltyToGround,
    GroundReached,
}

impl PolicyInput {
    pub const ALL: [PolicyInput; 5] = [
        PolicyInput::LoopPatternTotal,
        PolicyInput::InvertNestingMax,
        PolicyInput::DedupRatio,
        PolicyInput::AvgNoveltyToGround,
        PolicyInput::GroundReached,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyInput::LoopPatternTotal => "loop_pattern_total",
            PolicyInput::InvertNestingMax => "invert_nesting_max",
            PolicyInput::DedupRatio => "dedup_ratio",
            PolicyInput::AvgNoveltyToGround => "avg_novelty_to_ground",
            PolicyInput::GroundReached => "ground_reached",
        }
    }
}

/// Input values are never strings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Count(u64),
    Number(f64),
    Flag(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub action: Action,
    /// In [0, 1]
    pub severity: f64,
    pub reason_codes: BTreeSet<ReasonCode>,
    pub inputs: BTreeMap<PolicyInput, InputValue>,
}

impl PolicyDecision {
    fn defer_invalid() -> Self {
        Self {
            action: Action::Defer,
            severity: 0.0,
            reason_codes: BTreeSet::from([ReasonCode::InvalidReport]),
            inputs: BTreeMap::new(),
        }
    }
}

/// The five aggregate signals a decision depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicySignals {
    pub loop_total: u64,
    pub invert_nesting_max: u64,
    pub dedup_ratio: f64,
    pub avg_novelty_to_ground: Option<f64>,
    pub ground_reached: bool,
}

impl From<&Aggregates> for PolicySignals {
    fn from(agg: &Aggregates) -> Self {
        Self {
            loop_total: agg.loopiness.loop_pattern_hits.total as u64,
            invert_nesting_max: agg.loopiness.invert_nesting_max as u64,
            dedup_ratio: agg.structure.dedup_ratio,
            avg_novelty_to_ground: agg.ground.avg_novelty_to_ground,
            ground_reached: agg.ground.ground_reached,
        }
    }
}

impl PolicySignals {
    /// Read signals from a flat stability report or a run record.
    ///
    /// Flat reports carry the keys at the top level; run records nest them
    /// under `loopiness`, `structure` and `ground`. Older reports store the
    /// ratio under `dedup_saved`.
    pub fn from_report(report: &Value) -> Option<Self> {
        let lookup = |key: &str| report_field(report, key);

        let loop_total = lookup("loop_pattern_hits")?.get("total")?.as_u64()?;
        let invert_nesting_max = lookup("invert_nesting_max")?.as_u64()?;
        let dedup_ratio = match lookup("dedup_ratio") {
            Some(v) => v.as_f64()?,
            None => lookup("dedup_saved")?.as_f64()?,
        };
        let ground_reached = lookup("ground_reached")?.as_bool()?;
        let avg_novelty_to_ground = lookup("avg_novelty_to_ground").and_then(Value::as_f64);

        Some(Self {
            loop_total,
            invert_nesting_max,
            dedup_ratio,
            avg_novelty_to_ground,
            ground_reached,
        })
    }

    fn inputs(&self) -> BTreeMap<PolicyInput, InputValue> {
        BTreeMap::from([
            (PolicyInput::LoopPatternTotal, InputValue::Count(self.loop_total)),
            (PolicyInput::InvertNestingMax, InputValue::Count(self.invert_nesting_max)),
            (PolicyInput::DedupRatio, InputValue::Number(self.dedup_ratio)),
            (
                PolicyInput::AvgNoveltyToGround,
                self.avg_novelty_to_ground
                    .map_or(InputValue::Null, InputValue::Number),
            ),
            (PolicyInput::GroundReached, InputValue::Flag(self.ground_reached)),
        ])
    }
}

/// Maps aggregates to an advisory decision
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    thresholds: PolicyThresholds,
}

impl PolicyEvaluator {
    pub fn new(thresholds: PolicyThresholds) -> LatticeResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &PolicyThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, aggregates: &Aggregates) -> PolicyDecision {
        self.decide(&PolicySignals::from(aggregates))
    }

    /// Evaluate an untyped report; missing or mistyped fields yield DEFER.
    pub fn evaluate_report(&self, report: &Value) -> PolicyDecision {
        match PolicySignals::from_report(report) {
            Some(signals) => self.decide(&signals),
            None => {
                warn!("policy report is missing required fields, deferring");
                PolicyDecision::defer_invalid()
            }
        }
    }

    pub fn decide(&self, signals: &PolicySignals) -> PolicyDecision {
        let t = &self.thresholds;
        let loop_ground = signals.loop_total >= t.loop_total_ground;
        let invert_ground = signals.invert_nesting_max >= t.invert_nest_ground;
        let dedup_ground = signals.dedup_ratio >= t.dedup_ground;
        let loop_prune = signals.loop_total >= t.loop_total_prune;
        let invert_prune = signals.invert_nesting_max >= t.invert_nest_prune;
        let dedup_prune = signals.dedup_ratio >= t.dedup_prune;

        let mut reasons = BTreeSet::new();
        mark(&mut reasons, loop_ground, ReasonCode::LoopinessHigh);
        mark(&mut reasons, invert_ground, ReasonCode::InvertNesting);
        mark(&mut reasons, dedup_ground, ReasonCode::DedupHigh);

        let action = if !signals.ground_reached && (loop_ground || invert_ground || dedup_ground) {
            reasons.insert(ReasonCode::GroundUnreached);
            Action::GroundNow
        } else if loop_prune || invert_prune || dedup_prune {
            mark(&mut reasons, loop_prune, ReasonCode::LoopinessHigh);
            mark(&mut reasons, invert_prune, ReasonCode::InvertNesting);
            mark(&mut reasons, dedup_prune, ReasonCode::DedupHigh);
            Action::Prune
        } else {
            Action::Continue
        };

        PolicyDecision {
            action,
            severity: self.severity(signals),
            reason_codes: reasons,
            inputs: signals.inputs(),
        }
    }

    /// Largest of the three ground-normalised signals, clamped to [0, 1].
    pub fn severity(&self, signals: &PolicySignals) -> f64 {
        let t = &self.thresholds;
        let loop_norm = ratio(signals.loop_total as f64, t.loop_total_ground as f64);
        let invert_norm = ratio(signals.invert_nesting_max as f64, t.invert_nest_ground as f64);
        let dedup_norm = ratio(signals.dedup_ratio, t.dedup_ground);
        loop_norm.max(invert_norm).max(dedup_norm).clamp(0.0, 1.0)
    }
}

fn report_field<'a>(report: &'a Value, key: &str) -> Option<&'a Value> {
    report.get(key).or_else(|| {
        ["loopiness", "structure", "ground"]
            .iter()
            .find_map(|section| report.get(*section).and_then(|s| s.get(key)))
    })
}

fn mark(reasons: &mut BTreeSet<ReasonCode>, fired: bool, code: ReasonCode) {
    if fired {
        reasons.insert(code);
    }
}

fn ratio(value: f64, limit: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    (value / limit).min(1.0)
}
