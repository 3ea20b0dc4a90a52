//! Per-emotion affirmation lines.
//!
//! The table is embedded at compile time from `assets/affirmations.toml`
//! and parsed once on first use. Labels without their own set fall back
//! to the neutral lines.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const AFFIRMATIONS_TOML: &str = include_str!("../assets/affirmations.toml");

/// Label whose lines serve as the fallback set.
const FALLBACK_LABEL: &str = "neutral";

static TABLE: OnceLock<BTreeMap<String, Vec<String>>> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct AffirmationFile {
    affirmations: BTreeMap<String, Vec<String>>,
}

fn table() -> &'static BTreeMap<String, Vec<String>> {
    TABLE.get_or_init(|| match toml::from_str::<AffirmationFile>(AFFIRMATIONS_TOML) {
        Ok(file) => file.affirmations,
        Err(err) => {
            tracing::error!(error = %err, "embedded affirmation table failed to parse");
            BTreeMap::new()
        }
    })
}

/// Emotion labels with a dedicated affirmation set.
pub fn labels() -> Vec<&'static str> {
    table().keys().map(String::as_str).collect()
}

/// Pick a random affirmation for the given emotion label.
///
/// Matching is case-insensitive; unknown or empty labels use the
/// neutral set. Returns `None` only if the table itself is empty.
pub fn pick(label: &str, rng: &mut impl Rng) -> Option<&'static str> {
    let table = table();
    let key = label.trim().to_lowercase();
    let lines = table
        .get(&key)
        .filter(|lines| !lines.is_empty())
        .or_else(|| table.get(FALLBACK_LABEL))?;
    lines.choose(rng).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_builtin_label_has_lines() {
        for label in ["neutral", "happy", "sad", "angry", "disgust", "surprise"] {
            let lines = table().get(label).unwrap_or_else(|| panic!("missing {label}"));
            assert!(!lines.is_empty(), "{label} set is empty");
        }
    }

    #[test]
    fn test_pick_returns_line_from_label_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let line = pick("happy", &mut rng).unwrap();
        assert!(table()["happy"].iter().any(|l| l == line));
    }

    #[test]
    fn test_pick_is_case_insensitive() {
        let mut rng = StdRng::seed_from_u64(7);
        let line = pick("  HAPPY ", &mut rng).unwrap();
        assert!(table()["happy"].iter().any(|l| l == line));
    }

    #[test]
    fn test_unknown_label_falls_back_to_neutral() {
        let mut rng = StdRng::seed_from_u64(7);
        let line = pick("fear", &mut rng).unwrap();
        assert!(table()["neutral"].iter().any(|l| l == line));
        let line = pick("", &mut rng).unwrap();
        assert!(table()["neutral"].iter().any(|l| l == line));
    }
}
