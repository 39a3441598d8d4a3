//! Transform Set: the five canonical text transforms
//!
//! Every transform is a pure `&str -> String` function. Mirror, Invert and
//! Symbolize return their input unchanged when it already carries their own
//! marker; the builder then drops that candidate as a path duplicate.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

/// Word tokens shared by Abstract, Ground and the novelty scorer.
pub(crate) const WORD_PATTERN: &str = r"[A-Za-z][A-Za-z\-]+";

/// Kind of transform that produced a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    /// The root node; not produced by any transform
    Seed,
    Mirror,
    Invert,
    Symbolize,
    Abstract,
    Ground,
}

impl TransformKind {
    /// Canonical application order at every expanded node.
    pub const CANONICAL: [TransformKind; 5] = [
        TransformKind::Mirror,
        TransformKind::Invert,
        TransformKind::Symbolize,
        TransformKind::Abstract,
        TransformKind::Ground,
    ];

    /// Position in the canonical order, 1-based; 0 for the seed.
    pub fn ordinal(self) -> usize {
        match self {
            TransformKind::Seed => 0,
            TransformKind::Mirror => 1,
            TransformKind::Invert => 2,
            TransformKind::Symbolize => 3,
            TransformKind::Abstract => 4,
            TransformKind::Ground => 5,
        }
    }

    /// Terminal kinds are never expanded further.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransformKind::Ground | TransformKind::Abstract)
    }

    pub fn name(self) -> &'static str {
        match self {
            TransformKind::Seed => "Seed",
            TransformKind::Mirror => "Mirror",
            TransformKind::Invert => "Invert",
            TransformKind::Symbolize => "Symbolize",
            TransformKind::Abstract => "Abstract",
            TransformKind::Ground => "Ground",
        }
    }

    /// Apply this transform to a parent text. The seed kind is the identity.
    pub fn apply(self, text: &str) -> String {
        match self {
            TransformKind::Seed => text.to_string(),
            TransformKind::Mirror => mirror(text),
            TransformKind::Invert => invert(text),
            TransformKind::Symbolize => symbolize(text),
            TransformKind::Abstract => abstract_principle(text),
            TransformKind::Ground => ground_action(text).0,
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which Ground rule produced an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundCue {
    Loop,
    Fear,
    Reflection,
    Cut,
    Root,
    /// No rule matched; the action names the first themes of the text
    Theme,
    /// No usable words at all
    Open,
}

impl GroundCue {
    pub fn as_str(self) -> &'static str {
        match self {
            GroundCue::Loop => "loop",
            GroundCue::Fear => "fear",
            GroundCue::Reflection => "reflection",
            GroundCue::Cut => "cut",
            GroundCue::Root => "root",
            GroundCue::Theme => "theme",
            GroundCue::Open => "open",
        }
    }
}

const INVERT_SWAPS: [(&str, &str); 5] = [
    (r"(?i)\bI am\b", "I am not"),
    (r"(?i)\bpower\b", "humility"),
    (r"(?i)\blight\b", "shadow"),
    (r"(?i)\bstrong\b", "soft"),
    (r"(?i)\bforward\b", "still"),
];

const SYMBOL_TABLE: [(&str, &str); 5] = [
    ("Echoholder", "The Mirror-Guardian"),
    ("Zahaviel", "The Watcher at the Gate"),
    ("Fang", "The Blade of Discernment"),
    ("fang", "The Blade of Discernment"),
    ("Seed Bearer", "The Carrier of Beginnings"),
];

const GROUND_RULES: [(&[&str], &str, GroundCue); 5] = [
    (
        &["loop", "cycle", "repeat"],
        "Step away for 5 minutes, then return and do one small change.",
        GroundCue::Loop,
    ),
    (
        &["fear", "afraid", "anxiety"],
        "Take 6 slow breaths, then call or text a trusted friend.",
        GroundCue::Fear,
    ),
    (
        &["mirror", "echo", "reflection"],
        "Write 3 honest sentences, then read them once out loud.",
        GroundCue::Reflection,
    ),
    (
        &["blade", "fang", "cut"],
        "List 3 things to cut away; drop the easiest one today.",
        GroundCue::Cut,
    ),
    (
        &["ground", "earth", "root"],
        "Stand up, feel your feet, and name 3 things you can see.",
        GroundCue::Root,
    ),
];

/// Compiled patterns, built once per process.
struct TransformPatterns {
    word: Regex,
    swaps: Vec<(Regex, &'static str)>,
    symbols: Vec<(Regex, &'static str)>,
}

static PATTERNS: OnceLock<TransformPatterns> = OnceLock::new();

impl TransformPatterns {
    fn new() -> Self {
        Self {
            word: Regex::new(WORD_PATTERN).expect("word regex must compile"),
            swaps: INVERT_SWAPS
                .iter()
                .map(|(pat, rep)| (Regex::new(pat).expect("swap regex must compile"), *rep))
                .collect(),
            symbols: SYMBOL_TABLE
                .iter()
                .map(|(name, rep)| {
                    let pat = format!(r"\b{}\b", regex::escape(name));
                    (Regex::new(&pat).expect("symbol regex must compile"), *rep)
                })
                .collect(),
        }
    }
}

fn patterns() -> &'static TransformPatterns {
    PATTERNS.get_or_init(TransformPatterns::new)
}

/// Word tokens of `text` in order of appearance.
pub(crate) fn words(text: &str) -> Vec<&str> {
    patterns().word.find_iter(text).map(|m| m.as_str()).collect()
}

pub fn mirror(text: &str) -> String {
    if text.starts_with("Echo of [") || text.matches("Echo of [").count() > 1 {
        return text.to_string();
    }
    format!("Echo of [{text}] returns as self-reflection.")
}

pub fn invert(text: &str) -> String {
    let mut inverted = text.to_string();
    for (pattern, replacement) in &patterns().swaps {
        inverted = pattern
            .replace_all(&inverted, NoExpand(replacement))
            .into_owned();
    }
    if inverted == text {
        return format!("Shadow of ({text}) reveals its opposite.");
    }
    inverted
}

pub fn symbolize(text: &str) -> String {
    if text.starts_with("Symbols:") {
        return text.to_string();
    }
    let mut out = text.to_string();
    for (pattern, replacement) in &patterns().symbols {
        out = pattern.replace_all(&out, NoExpand(replacement)).into_owned();
    }
    format!("Symbols: {out}")
}

pub fn abstract_principle(text: &str) -> String {
    let tokens = words(text);
    let mut keywords: Vec<&str> = tokens
        .iter()
        .filter(|t| t.starts_with(|c: char| c.is_ascii_uppercase()))
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if keywords.is_empty() {
        keywords = tokens
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(5)
            .collect();
    }
    keywords.truncate(8);
    format!("Principle: {}", keywords.join(", "))
}

/// Ground action for `text` together with the rule that produced it.
pub fn ground_action(text: &str) -> (String, GroundCue) {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = words(&lowered)
        .into_iter()
        .filter(|w| w.len() > 2)
        .collect();

    for (keys, action, cue) in GROUND_RULES {
        if keys.iter().any(|k| tokens.contains(k)) {
            return (format!("Action: {action}"), cue);
        }
    }

    let mut themes: Vec<&str> = Vec::with_capacity(2);
    for &word in &tokens {
        if !themes.contains(&word) {
            themes.push(word);
        }
        if themes.len() == 2 {
            break;
        }
    }

    if themes.is_empty() {
        (
            "Action: Pick one small next step; write it down and do it for 5 minutes.".to_string(),
            GroundCue::Open,
        )
    } else {
        (
            format!(
                "Action: Pick one small step for {}; write it down and do it for 5 minutes.",
                themes.join(" / ")
            ),
            GroundCue::Theme,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_wraps_once() {
        let once = mirror("Silence");
        assert_eq!(once, "Echo of [Silence] returns as self-reflection.");
        assert_eq!(mirror(&once), once);
    }

    #[test]
    fn test_invert_swaps_case_insensitive() {
        assert_eq!(invert("i am strong"), "I am not soft");
        assert_eq!(invert("Move FORWARD into the Light"), "Move still into the shadow");
    }

    #[test]
    fn test_invert_respects_word_boundaries() {
        assert_eq!(invert("powerful"), "Shadow of (powerful) reveals its opposite.");
    }

    #[test]
    fn test_invert_fallback_nests() {
        let shadow = invert("Silence");
        assert_eq!(shadow, "Shadow of (Silence) reveals its opposite.");
        assert_eq!(
            invert(&shadow),
            "Shadow of (Shadow of (Silence) reveals its opposite.) reveals its opposite."
        );
    }

    #[test]
    fn test_symbolize_table_and_idempotence() {
        assert_eq!(
            symbolize("Echoholder / Zahaviel / Fang"),
            "Symbols: The Mirror-Guardian / The Watcher at the Gate / The Blade of Discernment"
        );
        assert_eq!(symbolize("Seed Bearer"), "Symbols: The Carrier of Beginnings");
        assert_eq!(symbolize("Symbols: Echoholder"), "Symbols: Echoholder");
        assert!(!symbolize("Symbols: X").contains("Symbols: Symbols:"));
    }

    #[test]
    fn test_abstract_prefers_capitalised_tokens() {
        assert_eq!(
            abstract_principle("Echo of [Silence] returns as self-reflection."),
            "Principle: Echo, Silence"
        );
        assert_eq!(
            abstract_principle("tell me what to believe"),
            "Principle: believe, me, tell, to, what"
        );
        assert_eq!(abstract_principle("?!"), "Principle: ");
    }

    #[test]
    fn test_ground_rules_vary_with_input() {
        let (stuck, cue_loop) = ground_action("stuck in a loop");
        let (fear, cue_fear) = ground_action("a moment of fear");
        assert_ne!(stuck, fear);
        assert_eq!(cue_loop, GroundCue::Loop);
        assert_eq!(cue_fear, GroundCue::Fear);
        assert!(stuck.starts_with("Action: Step away"));
    }

    #[test]
    fn test_ground_theme_and_open() {
        let (action, cue) = ground_action("Silence");
        assert_eq!(
            action,
            "Action: Pick one small step for silence; write it down and do it for 5 minutes."
        );
        assert_eq!(cue, GroundCue::Theme);

        let (action, cue) = ground_action("a b");
        assert_eq!(
            action,
            "Action: Pick one small next step; write it down and do it for 5 minutes."
        );
        assert_eq!(cue, GroundCue::Open);
    }

    #[test]
    fn test_ground_echo_maps_to_reflection() {
        let (_, cue) = ground_action("Echo of [Silence] returns as self-reflection.");
        assert_eq!(cue, GroundCue::Reflection);
    }

    #[test]
    fn test_kind_ordinals_and_terminals() {
        let ordinals: Vec<usize> = TransformKind::CANONICAL.iter().map(|k| k.ordinal()).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5]);
        assert!(TransformKind::Ground.is_terminal());
        assert!(TransformKind::Abstract.is_terminal());
        assert!(!TransformKind::Invert.is_terminal());
        assert!(!TransformKind::Seed.is_terminal());
        assert_eq!(TransformKind::Seed.apply("x"), "x");
    }
}
